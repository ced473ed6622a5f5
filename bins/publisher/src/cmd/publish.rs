use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use publisher::{BatchPublisher, Outcome, Signal};
use stream_api::Event;

use crate::config::{self, PublishArgs};
use crate::error::PublisherCliError;

#[derive(Debug, Default, PartialEq, Eq)]
struct Totals {
    published: usize,
    dropped: usize,
}

pub async fn run(args: PublishArgs) -> Result<(), PublisherCliError> {
    let cfg = config::load(&args.config.config)?;
    tracing::info!(config = %args.config.config, "loaded config");
    let publisher = publisher::from_config(cfg)?;

    let reader: Box<dyn AsyncRead + Unpin + Send> = if args.input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(&args.input).await?)
    };

    let totals = publish_lines(&publisher, reader, args.chunk as usize, args.single).await?;

    publisher.close()?;
    tracing::info!(published = totals.published, dropped = totals.dropped, "done");
    Ok(())
}

/// Reads NDJSON from `reader` and publishes it, one event per call in
/// `single` mode, otherwise `chunk_size` events per bulk call. Stops at the
/// first failed publish.
async fn publish_lines<R>(
    publisher: &BatchPublisher,
    reader: R,
    chunk_size: usize,
    single: bool,
) -> Result<Totals, PublisherCliError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut chunk: Vec<Event> = Vec::with_capacity(chunk_size);
    let mut totals = Totals::default();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event = Event::from_slice(line.as_bytes())
            .map_err(|source| PublisherCliError::Event { line: line_no, source })?;

        if single {
            publish_single(publisher, &event, &mut totals).await?;
            continue;
        }

        chunk.push(event);
        if chunk.len() >= chunk_size {
            publish_chunk(publisher, &chunk).await?;
            totals.published += chunk.len();
            chunk.clear();
        }
    }

    if !chunk.is_empty() {
        publish_chunk(publisher, &chunk).await?;
        totals.published += chunk.len();
    }

    Ok(totals)
}

async fn publish_chunk(publisher: &BatchPublisher, chunk: &[Event]) -> Result<(), PublisherCliError> {
    let (signal, completion) = Signal::channel();
    let result = publisher.publish_many(chunk, signal).await;

    match completion.wait().await {
        Outcome::Completed => Ok(()),
        Outcome::Failed(e) => Err(e.into()),
        Outcome::Canceled => Err(result.err().map_or(PublisherCliError::Canceled, Into::into)),
    }
}

/// Follows the signal rather than the return value: an event that cannot
/// be encoded still resolves as `Completed` and is skipped.
async fn publish_single(
    publisher: &BatchPublisher,
    event: &Event,
    totals: &mut Totals,
) -> Result<(), PublisherCliError> {
    let (signal, completion) = Signal::channel();
    let result = publisher.publish_one(event, signal).await;

    match completion.wait().await {
        Outcome::Completed => {
            match result {
                Ok(()) => totals.published += 1,
                Err(_) => totals.dropped += 1,
            }
            Ok(())
        }
        Outcome::Failed(e) => Err(e.into()),
        Outcome::Canceled => Err(PublisherCliError::Canceled),
    }
}
