use serde::Deserialize;

use client_kinesis::Credentials;
use codec_format::FormatCodecConfig;
use codec_json::JsonCodecConfig;

use crate::ConfigError;

// ═══════════════════════════════════════════════════════════════
//  Codec Config
// ═══════════════════════════════════════════════════════════════

/// Encoder selection. In TOML either `[codec.json]` or `[codec.format]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecConfig {
    Json(JsonCodecConfig),
    Format(FormatCodecConfig),
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig::Json(JsonCodecConfig::default())
    }
}

impl CodecConfig {
    pub fn name(&self) -> &'static str {
        match self {
            CodecConfig::Json(_) => "json",
            CodecConfig::Format(_) => "format",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Publish Config
// ═══════════════════════════════════════════════════════════════

/// Where and how events are published.
///
/// Missing required fields deserialize as empty strings so that
/// `validate` can name the first one that is absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishConfig {
    /// Routing key attached to every record.
    #[serde(default)]
    pub partition_key: String,
    #[serde(default)]
    pub stream_name: String,
    #[serde(default)]
    pub region: String,
    /// Overrides the regional service endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Timeout of a single remote call. Must be non-zero.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// `[credentials]`; falls back to the `AWS_*` environment variables.
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub codec: CodecConfig,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl PublishConfig {
    pub fn new(
        partition_key: impl Into<String>,
        stream_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            stream_name: stream_name.into(),
            region: region.into(),
            endpoint: None,
            timeout_ms: default_timeout_ms(),
            credentials: None,
            codec: CodecConfig::default(),
        }
    }

    /// Checks required fields in order: partition key, stream name, region.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partition_key.is_empty() {
            return Err(ConfigError::Missing("partition key"));
        }
        if self.stream_name.is_empty() {
            return Err(ConfigError::Missing("stream name"));
        }
        if self.region.is_empty() {
            return Err(ConfigError::Missing("region"));
        }
        Ok(())
    }
}
