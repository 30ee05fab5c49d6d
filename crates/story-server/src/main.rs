mod framing;

use anyhow::{Context, Result};
use clap::Parser;
use shared::config::parse_categories;
use shared::{Config, Response, StoryApi};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, Level};

use crate::framing::{decode_line, encode_response};

#[derive(Parser)]
#[command(name = "story-server")]
#[command(about = "Serve stories, comments, likes and narration as JSON lines over stdin/stdout")]
struct Args {
    /// Comma-separated categories to pull external stories from
    #[arg(short, long)]
    categories: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut config = Config::from_env()?;
    if let Some(raw) = args.categories {
        let categories = parse_categories(&raw);
        if categories.is_empty() {
            anyhow::bail!("--categories needs at least one category");
        }
        config.source.categories = categories;
    }

    let api = StoryApi::from_config(&config)?;
    info!(
        "Story service ready (categories: {})",
        config.source.categories.join(", ")
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let (id, request) = decode_line(&line);
        let api = api.clone();
        let tx = tx.clone();

        // Each request runs on its own task so a slow fetch never blocks the rest
        tokio::spawn(async move {
            let response = match request {
                Ok(request) => api.handle(request).await,
                Err(message) => Response::error(400, message),
            };
            let _ = tx.send(encode_response(id, &response));
        });
    }

    // In-flight requests still hold senders; the writer drains them first
    drop(tx);
    writer
        .await
        .context("Response writer panicked")?
        .context("Failed to write response")?;

    info!("stdin closed, shutting down");
    Ok(())
}
