use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

mod error;
mod event;

pub use error::{ErrorKind, PluginError};
pub use event::Event;

// ════════════════════════════════════════════════════════════════
//  Records
// ════════════════════════════════════════════════════════════════

/// One serialized event ready for the stream: payload plus the routing
/// key that picks the shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutRecordEntry {
    pub partition_key: String,
    pub data: Vec<u8>,
}

impl PutRecordEntry {
    pub fn new(partition_key: impl Into<String>, data: Vec<u8>) -> Self {
        Self { partition_key: partition_key.into(), data }
    }
}

/// Acknowledgement for a single accepted record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAck {
    pub shard_id: String,
    pub sequence_number: String,
}

/// Per-entry result inside a bulk acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryResult {
    Accepted(RecordAck),
    Rejected { error_code: String, error_message: String },
}

/// Acknowledgement for a bulk call. The service may accept the call while
/// rejecting some entries; `failed_record_count` says how many.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchAck {
    pub failed_record_count: usize,
    pub records: Vec<EntryResult>,
}

impl BatchAck {
    /// Ack with every entry accepted and no shard details.
    pub fn accepted(count: usize) -> Self {
        Self {
            failed_record_count: 0,
            records: vec![EntryResult::Accepted(RecordAck::default()); count],
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Plugin Traits
// ════════════════════════════════════════════════════════════════

/// Codec: turns one structured event into the bytes written to the stream.
///
/// Implementations: JSON codec, format-string codec.
/// Must be pure: the same event always encodes to the same bytes and
/// one instance is shared by concurrent publish calls.
pub trait Codec: Send + Sync {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, PluginError>;
}

/// Remote append-only stream service.
///
/// The service enforces a ceiling on the number of entries per
/// `put_records` call. Staying under it is the caller's job, never the
/// client's.
pub trait StreamClient: Send + Sync {
    /// Append one record.
    fn put_record<'a>(
        &'a self,
        stream_name: &'a str,
        partition_key: &'a str,
        data: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<RecordAck, PluginError>> + Send + 'a>>;

    /// Append a batch of records in one request.
    fn put_records<'a>(
        &'a self,
        stream_name: &'a str,
        records: &'a [PutRecordEntry],
    ) -> Pin<Box<dyn Future<Output = Result<BatchAck, PluginError>> + Send + 'a>>;
}
