//! slircbot - Straylight IRC Bot
//!
//! Stand-in connection layer: wire lines are read from stdin, dispatched to
//! the built-in modules, and outbound lines are written to stdout.

use futures_util::StreamExt;
use slircbot::config::{Config, validation};
use slircbot::outbound::LineWriter;
use slircbot::{Dispatcher, Matrix, Message, metrics, modules, telemetry};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

/// Longest accepted input line: 8191 bytes of tags plus a 512 byte message.
const MAX_LINE_LENGTH: usize = 8191 + 512;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    telemetry::init_tracing(&config.logging)?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {config_path}",
            errors.len()
        ));
    }

    info!(nick = %config.identity.nick, "Starting slircbot");
    metrics::init();

    let (writer, mut lines) = LineWriter::new();
    let matrix = Matrix::new(&config, Arc::new(writer));

    // Outbound lines to stdout.
    let output = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = lines.recv().await {
            let written = async {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\r\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                error!(error = %e, "Failed to write outbound line");
                break;
            }
        }
    });

    let validators = modules::validators(&config)?;
    let dispatcher = Dispatcher::new(Arc::clone(&matrix), &config.dispatch);
    for module in modules::builtin_modules(&validators)? {
        dispatcher.register(module)?;
    }
    info!(modules = ?dispatcher.modules(), "Modules registered");

    let codec = LinesCodec::new_with_max_length(MAX_LINE_LENGTH);
    let mut input = FramedRead::new(tokio::io::stdin(), codec);
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                interrupted = true;
                break;
            }
            line = input.next() => match line {
                Some(Ok(line)) => match Message::parse(&line) {
                    Ok(message) => {
                        dispatcher.broadcast(message);
                    }
                    Err(e) => debug!(error = %e, "Skipping unparsable line"),
                },
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(max = MAX_LINE_LENGTH, "Dropping oversized line");
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
                None => {
                    info!("Input closed");
                    break;
                }
            },
        }
    }

    // End of input lets the modules finish the backlog; an interrupt does not.
    let exits = if interrupted {
        dispatcher.shutdown().await
    } else {
        dispatcher.drain().await
    };
    debug!(?exits, "Dispatcher stopped");
    drop(dispatcher);
    drop(matrix);
    if tokio::time::timeout(Duration::from_secs(2), output).await.is_err() {
        warn!("Outbound writer did not drain in time");
    }

    debug!(metrics = %metrics::gather_metrics(), "Final metrics");
    Ok(())
}
