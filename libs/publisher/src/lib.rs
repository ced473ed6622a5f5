pub mod config;
pub mod error;
mod factory;
mod publisher;
mod signal;

pub use config::{CodecConfig, PublishConfig};
pub use error::{ConfigError, PublishError};
pub use factory::{build_client, build_codec, from_config};
pub use publisher::{BatchPublisher, MAX_BATCH_SIZE};
pub use signal::{Completion, Outcome, Signal};
