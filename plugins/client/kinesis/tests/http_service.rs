use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use client_kinesis::{Credentials, KinesisClient, KinesisClientConfig};
use serde_json::{Value, json};
use stream_api::{EntryResult, ErrorKind, PutRecordEntry, StreamClient};

#[derive(Clone, Default)]
struct FakeStream {
    requests: Arc<Mutex<Vec<Seen>>>,
    reject: bool,
}

#[derive(Debug, Clone)]
struct Seen {
    target: String,
    content_type: String,
    authorization: Option<String>,
    amz_date: Option<String>,
    body: Value,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

async fn handle(State(fake): State<FakeStream>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    let target = header(&headers, "x-amz-target").unwrap_or_default();
    let body: Value = serde_json::from_str(&body).unwrap();
    fake.requests.lock().unwrap().push(Seen {
        target: target.clone(),
        content_type: header(&headers, "content-type").unwrap_or_default(),
        authorization: header(&headers, "authorization"),
        amz_date: header(&headers, "x-amz-date"),
        body: body.clone(),
    });

    if fake.reject {
        let err = json!({"__type": "ResourceNotFoundException", "message": "Stream events not found"});
        return (StatusCode::BAD_REQUEST, err.to_string());
    }

    let resp = match target.as_str() {
        "Kinesis_20131202.PutRecord" => json!({"ShardId": "shardId-000000000000", "SequenceNumber": "42"}),
        "Kinesis_20131202.PutRecords" => {
            let count = body["Records"].as_array().map(|r| r.len()).unwrap_or(0);
            let records: Vec<Value> = (0..count)
                .map(|i| json!({"ShardId": "shardId-000000000000", "SequenceNumber": i.to_string()}))
                .collect();
            json!({"FailedRecordCount": 0, "Records": records})
        }
        _ => return (StatusCode::BAD_REQUEST, "{}".into()),
    };
    (StatusCode::OK, resp.to_string())
}

async fn spawn_fake(fake: FakeStream) -> KinesisClient {
    spawn_fake_with(fake, Some(Credentials::new("AKID", "secret"))).await
}

async fn spawn_fake_with(fake: FakeStream, credentials: Option<Credentials>) -> KinesisClient {
    let app = Router::new().route("/", post(handle)).with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = KinesisClientConfig {
        endpoint: Some(format!("http://{addr}")),
        credentials,
        ..KinesisClientConfig::new("eu-central-1")
    };
    KinesisClient::new(&config).unwrap()
}

#[tokio::test]
async fn put_record_sends_base64_payload() {
    let fake = FakeStream::default();
    let client = spawn_fake(fake.clone()).await;

    let ack = client.put_record("events", "partition", b"hello").await.unwrap();
    assert_eq!(ack.sequence_number, "42");

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.target, "Kinesis_20131202.PutRecord");
    assert_eq!(seen.content_type, "application/x-amz-json-1.1");
    assert_eq!(
        seen.body,
        json!({"StreamName": "events", "PartitionKey": "partition", "Data": "aGVsbG8="})
    );
}

#[tokio::test]
async fn requests_are_signed_with_sigv4() {
    let fake = FakeStream::default();
    let client = spawn_fake(fake.clone()).await;

    client.put_record("events", "partition", b"hello").await.unwrap();
    let records = vec![PutRecordEntry::new("partition", b"x".to_vec())];
    client.put_records("events", &records).await.unwrap();

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    for seen in requests.iter() {
        let auth = seen.authorization.as_deref().expect("authorization header");
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKID/"), "{auth}");
        assert!(auth.contains("/eu-central-1/kinesis/aws4_request, "), "{auth}");
        assert!(auth.contains("SignedHeaders=content-type;host;x-amz-date;x-amz-target, "), "{auth}");
        let date = seen.amz_date.as_deref().expect("x-amz-date header");
        assert_eq!(date.len(), "20240102T030405Z".len());
        assert!(auth.contains(&format!("Credential=AKID/{}/", &date[..8])));
    }
}

#[tokio::test]
async fn unsigned_client_sends_no_authorization() {
    let fake = FakeStream::default();
    let client = spawn_fake_with(fake.clone(), None).await;

    client.put_record("events", "partition", b"hello").await.unwrap();

    let requests = fake.requests.lock().unwrap();
    assert_eq!(requests[0].authorization, None);
    assert_eq!(requests[0].content_type, "application/x-amz-json-1.1");
}

#[tokio::test]
async fn put_records_sends_all_entries_in_order() {
    let fake = FakeStream::default();
    let client = spawn_fake(fake.clone()).await;

    let records: Vec<PutRecordEntry> = (0..3)
        .map(|i| PutRecordEntry::new("partition", format!("r{i}").into_bytes()))
        .collect();
    let ack = client.put_records("events", &records).await.unwrap();
    assert_eq!(ack.failed_record_count, 0);
    assert_eq!(ack.records.len(), 3);
    assert!(ack.records.iter().all(|r| matches!(r, EntryResult::Accepted(_))));

    let requests = fake.requests.lock().unwrap();
    let seen = &requests[0];
    assert_eq!(seen.target, "Kinesis_20131202.PutRecords");
    assert_eq!(seen.content_type, "application/x-amz-json-1.1");
    let data: Vec<&str> = seen.body["Records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Data"].as_str().unwrap())
        .collect();
    assert_eq!(data, vec!["cjA=", "cjE=", "cjI="]);
}

#[tokio::test]
async fn service_errors_are_io_errors() {
    let fake = FakeStream { reject: true, ..Default::default() };
    let client = spawn_fake(fake).await;

    let records = vec![PutRecordEntry::new("partition", b"x".to_vec())];
    let err = client.put_records("events", &records).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(err.message(), "PutRecords: ResourceNotFoundException: Stream events not found");
}

#[tokio::test]
async fn unreachable_endpoint_is_io_error() {
    let config = KinesisClientConfig {
        endpoint: Some("http://127.0.0.1:1".into()),
        ..KinesisClientConfig::new("eu-central-1")
    };
    let client = KinesisClient::new(&config).unwrap();
    let err = client.put_record("events", "partition", b"x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
