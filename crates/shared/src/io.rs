use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Story;
use crate::narrator::AudioAsset;

/// Get the default directory for saved narrations
pub fn get_default_narrations_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("story-roulette")
        .join("narrations");

    fs::create_dir_all(&data_dir).context("Failed to create narrations directory")?;

    Ok(data_dir)
}

/// File stem for a story: its id plus a slug of the title
pub fn story_file_stem(story: &Story) -> String {
    let slug: String = story
        .title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .take(8)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        story.id.clone()
    } else {
        format!("{}-{}", story.id, slug)
    }
}

/// Save a story and its narration side by side in `dir`.
///
/// Returns the path of the audio file.
pub fn save_narration(dir: &Path, story: &Story, audio: &AudioAsset) -> Result<PathBuf> {
    let stem = story_file_stem(story);

    let json = serde_json::to_string_pretty(story).context("Failed to serialize story")?;
    fs::write(dir.join(format!("{}.json", stem)), json).context("Failed to write story file")?;

    let audio_path = dir.join(format!("{}.mp3", stem));
    fs::write(&audio_path, &audio.bytes)
        .with_context(|| format!("Failed to write audio file: {}", audio_path.display()))?;

    Ok(audio_path)
}
