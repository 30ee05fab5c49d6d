use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_CATEGORIES: [&str; 3] = ["AmItheAsshole", "tifu", "TrueOffMyChest"];

/// Settings for the external story source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub categories: Vec<String>,
    pub top_limit: u32,
    pub time_window: String,
    pub min_length: usize,
    pub max_text_length: usize,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            top_limit: 30,
            time_window: "week".to_string(),
            min_length: 100,
            max_text_length: 4000,
            user_agent: "story-roulette/0.1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Settings for text-to-speech narration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub language: String,
    pub max_text_length: usize,
    pub timeout_secs: u64,
    /// Where chunked audio is staged before it is read back
    pub scratch_dir: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".to_string(),
            language: "en".to_string(),
            max_text_length: 4000,
            timeout_secs: 30,
            scratch_dir: env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub source: SourceConfig,
    pub speech: SpeechConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let mut source = SourceConfig::default();
        let mut speech = SpeechConfig::default();

        if let Ok(base_url) = env::var("STORY_SOURCE_BASE_URL") {
            source.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(raw) = env::var("STORY_CATEGORIES") {
            let categories = parse_categories(&raw);
            if !categories.is_empty() {
                source.categories = categories;
            }
        }
        if let Ok(window) = env::var("STORY_TIME_WINDOW") {
            source.time_window = window;
        }
        if let Ok(agent) = env::var("STORY_USER_AGENT") {
            source.user_agent = agent;
        }
        source.top_limit = env_parse("STORY_TOP_LIMIT", source.top_limit)?;
        source.min_length = env_parse("STORY_MIN_LENGTH", source.min_length)?;
        source.max_text_length = env_parse("STORY_MAX_TEXT_LENGTH", source.max_text_length)?;
        source.timeout_secs = env_parse("STORY_HTTP_TIMEOUT_SECS", source.timeout_secs)?;

        if let Ok(base_url) = env::var("TTS_BASE_URL") {
            speech.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(language) = env::var("TTS_LANGUAGE") {
            speech.language = language;
        }
        if let Ok(dir) = env::var("TTS_SCRATCH_DIR") {
            speech.scratch_dir = PathBuf::from(dir);
        }
        speech.max_text_length = source.max_text_length;
        speech.timeout_secs = source.timeout_secs;

        Ok(Self { source, speech })
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/story-roulette/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("story-roulette").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }

        // If none found, the defaults apply
    }
}

/// Split a comma-separated category list, dropping blanks
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
