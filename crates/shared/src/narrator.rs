use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use std::io::Write;
use tracing::{debug, error, info};

use crate::config::SpeechConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::normalize::truncate_chars;

/// Longest piece of text the speech endpoint accepts in one request
const MAX_CHUNK_CHARS: usize = 100;

/// Self-contained audio produced from narration text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioAsset {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "audio/mp3".to_string(),
            bytes,
        }
    }

    /// Embeddable `data:` URI
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Text in, audio out
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str) -> ServiceResult<AudioAsset>;
}

/// Narrates through the Google Translate speech endpoint
pub struct GoogleSpeech {
    client: Client,
    config: SpeechConfig,
}

impl GoogleSpeech {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; StoryRoulette/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn chunk_url(&self, chunk: &str, idx: usize, total: usize) -> String {
        format!(
            "{}/translate_tts?ie=UTF-8&q={}&tl={}&total={}&idx={}&textlen={}&client=tw-ob",
            self.config.base_url,
            urlencoding::encode(chunk),
            urlencoding::encode(&self.config.language),
            total,
            idx,
            chunk.chars().count()
        )
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.chunk_url(chunk, idx, total))
            .send()
            .await
            .context("Failed to reach speech endpoint")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Speech endpoint returned error: {}", status);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read speech audio")?;
        if bytes.is_empty() {
            anyhow::bail!("Speech endpoint returned no audio for chunk {}", idx);
        }

        Ok(bytes.to_vec())
    }

    /// Stream every chunk into a scratch file, read it back, and remove it.
    ///
    /// The scratch file is deleted on drop, so failures clean up too.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let chunks = split_for_speech(text, MAX_CHUNK_CHARS);
        let total = chunks.len();

        let mut scratch = tempfile::Builder::new()
            .prefix("narration-")
            .suffix(".mp3")
            .tempfile_in(&self.config.scratch_dir)
            .context("Failed to create scratch audio file")?;

        for (idx, chunk) in chunks.iter().enumerate() {
            let audio = self.fetch_chunk(chunk, idx, total).await?;
            scratch
                .write_all(&audio)
                .context("Failed to write scratch audio file")?;
        }
        scratch.flush().context("Failed to flush scratch audio file")?;

        let audio = std::fs::read(scratch.path()).context("Failed to read scratch audio file")?;
        scratch
            .close()
            .context("Failed to remove scratch audio file")?;

        debug!("Synthesized {} chunks into {} bytes", total, audio.len());
        Ok(audio)
    }
}

#[async_trait]
impl Narrator for GoogleSpeech {
    async fn narrate(&self, text: &str) -> ServiceResult<AudioAsset> {
        let text = prepare_narration(text, self.config.max_text_length)?;

        info!("Generating audio for {} characters...", text.chars().count());
        match self.synthesize(text).await {
            Ok(bytes) => {
                info!("Audio generated ({} bytes)", bytes.len());
                Ok(AudioAsset::mp3(bytes))
            }
            Err(e) => {
                error!("TTS error: {:#}", e);
                Err(ServiceError::ConversionFailure(e.to_string()))
            }
        }
    }
}

/// Trim and cap narration text; blank text is rejected
pub fn prepare_narration(text: &str, max_chars: usize) -> ServiceResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::required("text"));
    }
    Ok(truncate_chars(text, max_chars).trim_end())
}

/// Split text into pieces of at most `max_chars`, breaking between words.
///
/// Words longer than `max_chars` are cut on character boundaries.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        while word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let (head, tail) = word.split_at(
                word.char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len()),
            );
            chunks.push(head.to_string());
            word = tail;
            word_len -= max_chars;
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
