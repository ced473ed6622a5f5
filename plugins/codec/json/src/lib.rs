use stream_api::{Codec, Event, PluginError};

/// Settings for the JSON codec (`[codec.json]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub struct JsonCodecConfig {
    /// Indent the output. Off by default: one event, one line.
    #[serde(default)]
    pub pretty: bool,
}

/// Serializes each event as a JSON document.
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new(config: JsonCodecConfig) -> Self {
        Self { pretty: config.pretty }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, PluginError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(event)?
        } else {
            serde_json::to_vec(event)?
        };
        Ok(bytes)
    }
}
