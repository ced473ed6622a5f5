use stream_api::PluginError;

/// Raised while building a publisher, never during publish.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {0} configured")]
    Missing(&'static str),

    #[error("codec: {0}")]
    Codec(PluginError),

    #[error("stream client: {0}")]
    Client(PluginError),
}

/// Why a publish call failed. Returned to the caller and carried by the
/// `Failed` signal, so it is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("encoding: {0}")]
    Encoding(PluginError),

    #[error("transport: {0}")]
    Transport(PluginError),
}
