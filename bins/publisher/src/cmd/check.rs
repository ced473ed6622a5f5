use crate::config::{self, ConfigArgs};
use crate::error::PublisherCliError;

pub fn run(args: ConfigArgs) -> Result<(), PublisherCliError> {
    let cfg = config::load(&args.config)?;
    cfg.validate()?;
    publisher::build_codec(&cfg.codec)?;
    publisher::build_client(&cfg)?;

    println!("config:        {}", args.config);
    println!("stream:        {}", cfg.stream_name);
    println!("partition key: {}", cfg.partition_key);
    println!("region:        {}", cfg.region);
    println!("endpoint:      {}", cfg.endpoint.as_deref().unwrap_or("(regional default)"));
    println!("timeout:       {} ms", cfg.timeout_ms);
    println!("credentials:   {}", if cfg.credentials.is_some() { "config" } else { "environment" });
    println!("codec:         {}", cfg.codec.name());
    Ok(())
}
