use std::borrow::Borrow;
use std::sync::Arc;

use stream_api::{BatchAck, Codec, Event, PutRecordEntry, StreamClient};

use crate::config::PublishConfig;
use crate::signal::Signal;
use crate::{ConfigError, PublishError};

/// Most records the service accepts in one bulk call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Encodes events and writes them to the stream in bounded batches.
///
/// Cloning is cheap: clones share the client, codec and config, none of
/// which change after construction. Concurrent publish calls from
/// independent tasks are fine.
#[derive(Clone)]
pub struct BatchPublisher {
    client: Arc<dyn StreamClient>,
    codec: Arc<dyn Codec>,
    config: Arc<PublishConfig>,
}

impl BatchPublisher {
    /// Validates `config` once; publish calls never re-check it.
    pub fn new(
        config: PublishConfig,
        client: Arc<dyn StreamClient>,
        codec: Arc<dyn Codec>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { client, codec, config: Arc::new(config) })
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    // ═══════════════════════════════════════════════════════════════
    //  Single event
    // ═══════════════════════════════════════════════════════════════

    /// Publish one event with a single-record call.
    ///
    /// An event that fails to encode resolves the signal as `Completed`:
    /// it can never be delivered, so the host pipeline must not hold or
    /// retry it. The encoding error is still returned.
    pub async fn publish_one(&self, event: &Event, signal: Signal) -> Result<(), PublishError> {
        let data = match self.codec.encode(event) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(stream = %self.config.stream_name, error = %e, "dropping event that failed to encode");
                signal.completed();
                return Err(PublishError::Encoding(e));
            }
        };

        match self
            .client
            .put_record(&self.config.stream_name, &self.config.partition_key, &data)
            .await
        {
            Ok(ack) => {
                tracing::trace!(stream = %self.config.stream_name, shard = %ack.shard_id, "record written");
                signal.completed();
                Ok(())
            }
            Err(e) => {
                tracing::error!(stream = %self.config.stream_name, error = %e, "unable to write data to stream");
                let err = PublishError::Transport(e);
                signal.failed(err.clone());
                Err(err)
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════
    //  Bulk
    // ═══════════════════════════════════════════════════════════════

    /// Publish events in order, `MAX_BATCH_SIZE` records per bulk call.
    ///
    /// Batches are flushed as soon as they fill up, so memory stays bounded
    /// by one batch however long `events` is. The first encoding or
    /// transport error stops the call: batches already written stay
    /// written, the rest of `events` is not consumed.
    pub async fn publish_many<I>(&self, events: I, signal: Signal) -> Result<(), PublishError>
    where
        I: IntoIterator,
        I::Item: Borrow<Event>,
    {
        let mut pending: Vec<PutRecordEntry> = Vec::with_capacity(MAX_BATCH_SIZE);

        for event in events {
            let data = match self.codec.encode(event.borrow()) {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(stream = %self.config.stream_name, error = %e, "unable to encode event");
                    let err = PublishError::Encoding(e);
                    signal.failed(err.clone());
                    return Err(err);
                }
            };
            pending.push(PutRecordEntry::new(self.config.partition_key.as_str(), data));

            if pending.len() >= MAX_BATCH_SIZE {
                if let Err(err) = self.flush(&pending).await {
                    signal.failed(err.clone());
                    return Err(err);
                }
                pending.clear();
            }
        }

        if !pending.is_empty() {
            if let Err(err) = self.flush(&pending).await {
                signal.failed(err.clone());
                return Err(err);
            }
        }

        signal.completed();
        Ok(())
    }

    /// Host entry point for a batch of events; same as `publish_many`.
    pub async fn publish_events<I>(&self, events: I, signal: Signal) -> Result<(), PublishError>
    where
        I: IntoIterator,
        I::Item: Borrow<Event>,
    {
        self.publish_many(events, signal).await
    }

    /// Nothing to release: the client holds no per-publisher resources.
    pub fn close(&self) -> Result<(), PublishError> {
        tracing::debug!(stream = %self.config.stream_name, "publisher closed");
        Ok(())
    }

    async fn flush(&self, records: &[PutRecordEntry]) -> Result<BatchAck, PublishError> {
        let stream = &self.config.stream_name;
        match self.client.put_records(stream, records).await {
            Ok(ack) => {
                if ack.failed_record_count > 0 {
                    tracing::warn!(
                        stream = %stream,
                        failed = ack.failed_record_count,
                        total = records.len(),
                        "service rejected some records in batch"
                    );
                } else {
                    tracing::debug!(stream = %stream, records = records.len(), "batch written");
                }
                Ok(ack)
            }
            Err(e) => {
                tracing::error!(stream = %stream, records = records.len(), error = %e, "unable to write data to stream");
                Err(PublishError::Transport(e))
            }
        }
    }
}

impl std::fmt::Debug for BatchPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPublisher").field("config", &self.config).finish_non_exhaustive()
    }
}
