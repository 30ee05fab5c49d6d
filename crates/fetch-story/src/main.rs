use anyhow::{Context, Result};
use clap::Parser;
use shared::config::parse_categories;
use shared::{get_default_narrations_dir, save_narration, Config, ServiceError, StoryApi};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "fetch-story")]
#[command(about = "Pick one external story, print it, and optionally narrate it to an mp3")]
struct Args {
    /// Comma-separated categories to pick from (defaults to the configured set)
    #[arg(short, long)]
    categories: Option<String>,

    /// Narrate the story and save it next to a JSON copy
    #[arg(short, long)]
    narrate: bool,

    /// Directory for saved narrations (defaults to the local data directory)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = Config::from_env()?;
    if let Some(raw) = args.categories {
        let categories = parse_categories(&raw);
        if categories.is_empty() {
            anyhow::bail!("--categories needs at least one category");
        }
        config.source.categories = categories;
    }

    println!(
        "📚 Fetching stories from {}...",
        config.source.categories.join(", ")
    );
    let api = StoryApi::from_config(&config)?;

    let story = match api.aggregator().external_story().await {
        Ok(story) => story,
        Err(ServiceError::NoExternalStory) => {
            println!("Could not find a good story this time. Try again!");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to fetch a story"),
    };

    println!("\n✓ {} ({})", story.title, story.origin.label());
    println!("  👍 {} likes\n", api.engagement().likes(&story.id));
    println!("{}", story.text);

    if !args.narrate {
        return Ok(());
    }

    println!("\n🎵 Generating narration...");
    let audio = match api.narrator().narrate(&story.text).await {
        Ok(audio) => audio,
        Err(e) => {
            // The story is already on screen; narration is a bonus
            println!("⚠ {}. Showing the story without narration.", e);
            return Ok(());
        }
    };

    let dir = match args.out {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            dir
        }
        None => get_default_narrations_dir()?,
    };
    let path = save_narration(&dir, &story, &audio)?;

    println!("\n✅ Narration saved to: {}", path.display());

    Ok(())
}
