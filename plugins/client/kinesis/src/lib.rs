use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use base64::Engine;
use serde::{Deserialize, Serialize};
use stream_api::{
    BatchAck, EntryResult, PluginError, PutRecordEntry, RecordAck, StreamClient,
};

mod sigv4;

pub use sigv4::Credentials;
use sigv4::{SignableRequest, Signer};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "Kinesis_20131202";
const SERVICE: &str = "kinesis";

// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinesisClientConfig {
    pub region: String,
    /// Overrides the regional endpoint (local emulator).
    pub endpoint: Option<String>,
    pub timeout: Duration,
    /// Requests are signed with SigV4 when set. Only an overridden endpoint
    /// may be used without credentials.
    pub credentials: Option<Credentials>,
}

impl KinesisClientConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            timeout: Duration::from_secs(30),
            credentials: None,
        }
    }

    /// `https://kinesis.{region}.amazonaws.com` unless overridden.
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://kinesis.{}.amazonaws.com", self.region),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Wire format (Kinesis JSON 1.1)
// ════════════════════════════════════════════════════════════════

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordRequest<'a> {
    stream_name: &'a str,
    partition_key: &'a str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordsRequest<'a> {
    stream_name: &'a str,
    records: Vec<PutRecordsRequestEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordsRequestEntry<'a> {
    data: String,
    partition_key: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordResponse {
    shard_id: String,
    sequence_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordsResponse {
    #[serde(default)]
    failed_record_count: usize,
    #[serde(default)]
    records: Vec<PutRecordsResultEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutRecordsResultEntry {
    shard_id: Option<String>,
    sequence_number: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(default, alias = "Message")]
    message: String,
}

fn encode_data(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

impl From<PutRecordsResultEntry> for EntryResult {
    fn from(entry: PutRecordsResultEntry) -> Self {
        match entry.error_code {
            Some(error_code) => EntryResult::Rejected {
                error_code,
                error_message: entry.error_message.unwrap_or_default(),
            },
            None => EntryResult::Accepted(RecordAck {
                shard_id: entry.shard_id.unwrap_or_default(),
                sequence_number: entry.sequence_number.unwrap_or_default(),
            }),
        }
    }
}

/// Non-2xx body → `"ExceptionName: message"`.
/// `__type` may be fully qualified (`com.amazonaws...#ResourceNotFoundException`).
fn service_error(status: reqwest::StatusCode, body: &str) -> PluginError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) if !err.kind.is_empty() => {
            let kind = err.kind.rsplit('#').next().unwrap_or(&err.kind);
            PluginError::io(format!("{kind}: {}", err.message))
        }
        _ => PluginError::io(format!("HTTP {status}: {body}")),
    }
}

// ════════════════════════════════════════════════════════════════
//  Client
// ════════════════════════════════════════════════════════════════

/// HTTP client for a Kinesis-compatible stream service.
///
/// One instance is built per publisher and shared by every publish call;
/// `reqwest::Client` pools connections internally.
pub struct KinesisClient {
    http: reqwest::Client,
    endpoint: String,
    /// `host[:port]` and path of `endpoint`, as covered by the signature.
    host: String,
    path: String,
    region: String,
    credentials: Option<Credentials>,
}

impl KinesisClient {
    pub fn new(config: &KinesisClientConfig) -> Result<Self, PluginError> {
        if config.region.is_empty() {
            return Err(PluginError::config("kinesis client: no region configured"));
        }
        if config.timeout.is_zero() {
            return Err(PluginError::config("kinesis client: timeout must be greater than zero"));
        }
        if config.credentials.is_none() && config.endpoint.is_none() {
            return Err(PluginError::config(
                "kinesis client: no credentials for the AWS endpoint \
                 (set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY)",
            ));
        }

        let endpoint = config.resolved_endpoint();
        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| PluginError::config(format!("kinesis client: endpoint '{endpoint}': {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(PluginError::config(format!("kinesis client: endpoint '{endpoint}' has no host")));
            }
        };

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PluginError::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            host,
            path: url.path().to_string(),
            region: config.region.clone(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_signed(&self) -> bool {
        self.credentials.is_some()
    }

    async fn exec(&self, action: &str, body: Vec<u8>) -> Result<String, PluginError> {
        let target = format!("{TARGET_PREFIX}.{action}");
        let mut req = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", &target);

        if let Some(credentials) = &self.credentials {
            let signer = Signer { credentials, region: &self.region, service: SERVICE };
            let signed = signer.sign(
                &SignableRequest {
                    method: "POST",
                    host: &self.host,
                    path: &self.path,
                    headers: &[("content-type", CONTENT_TYPE), ("x-amz-target", target.as_str())],
                    body: &body,
                },
                chrono::Utc::now(),
            )?;
            for (name, value) in signed {
                req = req.header(name, value);
            }
        }

        let resp = req
            .body(body)
            .send()
            .await
            .map_err(|e| PluginError::io(format!("{action} request: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| PluginError::io(format!("{action} read: {e}")))?;

        if status.is_success() {
            Ok(text)
        } else {
            tracing::debug!(action, %status, body = %text, "service rejected request");
            Err(service_error(status, &text).with_context(action))
        }
    }
}

impl StreamClient for KinesisClient {
    fn put_record<'a>(
        &'a self,
        stream_name: &'a str,
        partition_key: &'a str,
        data: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<RecordAck, PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let body = serde_json::to_vec(&PutRecordRequest {
                stream_name,
                partition_key,
                data: encode_data(data),
            })?;
            let text = self.exec("PutRecord", body).await?;
            let resp: PutRecordResponse = serde_json::from_str(&text)
                .map_err(|e| PluginError::new(format!("PutRecord response: {e}")))?;
            Ok(RecordAck {
                shard_id: resp.shard_id,
                sequence_number: resp.sequence_number,
            })
        })
    }

    fn put_records<'a>(
        &'a self,
        stream_name: &'a str,
        records: &'a [PutRecordEntry],
    ) -> Pin<Box<dyn Future<Output = Result<BatchAck, PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let body = serde_json::to_vec(&PutRecordsRequest {
                stream_name,
                records: records
                    .iter()
                    .map(|r| PutRecordsRequestEntry {
                        data: encode_data(&r.data),
                        partition_key: &r.partition_key,
                    })
                    .collect(),
            })?;
            let text = self.exec("PutRecords", body).await?;
            let resp: PutRecordsResponse = serde_json::from_str(&text)
                .map_err(|e| PluginError::new(format!("PutRecords response: {e}")))?;
            Ok(BatchAck {
                failed_record_count: resp.failed_record_count,
                records: resp.records.into_iter().map(EntryResult::from).collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stream_api::ErrorKind;

    #[test]
    fn endpoint_defaults_to_region() {
        let cfg = KinesisClientConfig::new("eu-central-1");
        assert_eq!(cfg.resolved_endpoint(), "https://kinesis.eu-central-1.amazonaws.com");

        let cfg = KinesisClientConfig {
            endpoint: Some("http://localhost:4567/".into()),
            ..KinesisClientConfig::new("eu-central-1")
        };
        assert_eq!(cfg.resolved_endpoint(), "http://localhost:4567");
    }

    fn signed_config() -> KinesisClientConfig {
        KinesisClientConfig {
            credentials: Some(Credentials::new("AKID", "secret")),
            ..KinesisClientConfig::new("eu-central-1")
        }
    }

    #[test]
    fn empty_region_is_rejected() {
        let cfg = KinesisClientConfig { region: String::new(), ..signed_config() };
        assert!(KinesisClient::new(&cfg).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = KinesisClientConfig { timeout: Duration::ZERO, ..signed_config() };
        let err = KinesisClient::new(&cfg).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("timeout"));
    }

    #[test]
    fn aws_endpoint_requires_credentials() {
        let err = KinesisClient::new(&KinesisClientConfig::new("eu-central-1")).err().unwrap();
        assert!(err.message().contains("no credentials"));

        let client = KinesisClient::new(&signed_config()).unwrap();
        assert!(client.is_signed());
        assert_eq!(client.host, "kinesis.eu-central-1.amazonaws.com");
        assert_eq!(client.path, "/");
    }

    #[test]
    fn emulator_endpoint_may_be_unsigned() {
        let cfg = KinesisClientConfig {
            endpoint: Some("http://localhost:4567".into()),
            ..KinesisClientConfig::new("eu-central-1")
        };
        let client = KinesisClient::new(&cfg).unwrap();
        assert!(!client.is_signed());
        assert_eq!(client.host, "localhost:4567");
    }

    #[test]
    fn put_records_body_shape() {
        let body = serde_json::to_value(PutRecordsRequest {
            stream_name: "events",
            records: vec![PutRecordsRequestEntry { data: encode_data(b"{}"), partition_key: "pk" }],
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"StreamName": "events", "Records": [{"Data": "e30=", "PartitionKey": "pk"}]})
        );
    }

    #[test]
    fn service_error_strips_namespace() {
        let body = r#"{"__type":"com.amazonaws.kinesis#ProvisionedThroughputExceededException","message":"Rate exceeded"}"#;
        let err = service_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.message(), "ProvisionedThroughputExceededException: Rate exceeded");
    }

    #[test]
    fn service_error_without_json_body() {
        let err = service_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.message(), "HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn rejected_entries_map_to_errors() {
        let resp: PutRecordsResponse = serde_json::from_value(json!({
            "FailedRecordCount": 1,
            "Records": [
                {"ShardId": "shardId-000", "SequenceNumber": "1"},
                {"ErrorCode": "InternalFailure", "ErrorMessage": "try again"}
            ]
        }))
        .unwrap();
        let results: Vec<EntryResult> = resp.records.into_iter().map(EntryResult::from).collect();
        assert_eq!(
            results[0],
            EntryResult::Accepted(RecordAck { shard_id: "shardId-000".into(), sequence_number: "1".into() })
        );
        assert!(matches!(&results[1], EntryResult::Rejected { error_code, .. } if error_code == "InternalFailure"));
    }
}
