use std::sync::Arc;
use std::time::Duration;

use client_kinesis::{Credentials, KinesisClient, KinesisClientConfig};
use codec_format::FormatCodec;
use codec_json::JsonCodec;
use stream_api::{Codec, StreamClient};

use crate::config::{CodecConfig, PublishConfig};
use crate::publisher::BatchPublisher;
use crate::ConfigError;

/// Build the encoder selected by `[codec.*]`.
pub fn build_codec(config: &CodecConfig) -> Result<Arc<dyn Codec>, ConfigError> {
    let codec: Arc<dyn Codec> = match config {
        CodecConfig::Json(cfg) => Arc::new(JsonCodec::new(*cfg)),
        CodecConfig::Format(cfg) => Arc::new(FormatCodec::new(cfg).map_err(ConfigError::Codec)?),
    };
    Ok(codec)
}

/// Build the long-lived stream client bound to the configured region.
/// Credentials come from `[credentials]`, then from the environment.
pub fn build_client(config: &PublishConfig) -> Result<Arc<dyn StreamClient>, ConfigError> {
    let client_config = KinesisClientConfig {
        region: config.region.clone(),
        endpoint: config.endpoint.clone(),
        timeout: Duration::from_millis(config.timeout_ms),
        credentials: config.credentials.clone().or_else(Credentials::from_env),
    };
    let client = KinesisClient::new(&client_config).map_err(ConfigError::Client)?;
    tracing::info!(
        region = %config.region,
        endpoint = %client.endpoint(),
        signed = client.is_signed(),
        "stream client ready"
    );
    Ok(Arc::new(client))
}

/// Validate `config`, then build its codec and client.
pub fn from_config(config: PublishConfig) -> Result<BatchPublisher, ConfigError> {
    config.validate()?;
    let codec = build_codec(&config.codec)?;
    let client = build_client(&config)?;
    tracing::info!(
        stream = %config.stream_name,
        partition_key = %config.partition_key,
        codec = config.codec.name(),
        "publisher created"
    );
    BatchPublisher::new(config, client, codec)
}
