#[derive(Debug, thiserror::Error)]
pub enum PublisherCliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Setup(#[from] publisher::ConfigError),

    #[error("{0}")]
    Publish(#[from] publisher::PublishError),

    #[error("input line {line}: {source}")]
    Event { line: usize, source: stream_api::PluginError },

    #[error("input: {0}")]
    Input(#[from] std::io::Error),

    #[error("publish canceled")]
    Canceled,
}
