use clap::{Args, Parser, Subcommand};

use publisher::PublishConfig;

use crate::error::PublisherCliError;

#[derive(Parser)]
#[command(name = "stream-publisher", about = "Publish NDJSON events to a record stream")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read events and publish them
    Publish(PublishArgs),
    /// Load and validate the config, then print it
    Check(ConfigArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "publisher.toml", env = "PUBLISHER_CONFIG")]
    pub config: String,
}

#[derive(Args, Clone, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// NDJSON input file, `-` for stdin
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Events handed to one bulk publish call
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk: u64,

    /// Publish every event with its own single-record call
    #[arg(long)]
    pub single: bool,
}

// ---- TOML Config ----

pub fn load(path: &str) -> Result<PublishConfig, PublisherCliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PublisherCliError::Config { context: "read", detail: format!("'{path}': {e}") })?;
    toml::from_str(&content)
        .map_err(|e| PublisherCliError::Config { context: "parse", detail: format!("'{path}': {e}") })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_defaults() {
        let cli = Cli::try_parse_from(["stream-publisher", "publish", "--config", "p.toml"]).unwrap();
        let Commands::Publish(args) = cli.command else { panic!("expected publish") };
        assert_eq!(args.config.config, "p.toml");
        assert_eq!(args.input, "-");
        assert_eq!(args.chunk, 500);
        assert!(!args.single);
    }

    #[test]
    fn zero_chunk_is_rejected() {
        assert!(Cli::try_parse_from(["stream-publisher", "publish", "--chunk", "0"]).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load("/nonexistent/publisher.toml").unwrap_err();
        assert!(err.to_string().starts_with("config (read): '/nonexistent/publisher.toml'"));
    }
}
