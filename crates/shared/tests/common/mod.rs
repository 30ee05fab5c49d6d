//! Scripted collaborators so the request layer can run without a network.

use async_trait::async_trait;
use shared::{AudioAsset, ExternalSource, Narrator, Origin, ServiceError, ServiceResult, Story};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub enum Script {
    Stories(Vec<Story>),
    Outage,
    Hang,
}

pub struct ScriptedSource {
    script: Script,
    pub calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalSource for ScriptedSource {
    async fn fetch_external(&self) -> ServiceResult<Vec<Story>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Stories(stories) => Ok(stories.clone()),
            Script::Outage => Err(ServiceError::SourceUnavailable("connection refused".to_string())),
            Script::Hang => std::future::pending().await,
        }
    }
}

/// Echoes the text back as "audio", or fails on demand
pub struct FakeNarrator {
    pub fail: bool,
}

#[async_trait]
impl Narrator for FakeNarrator {
    async fn narrate(&self, text: &str) -> ServiceResult<AudioAsset> {
        let text = shared::narrator::prepare_narration(text, 4000)?;
        if self.fail {
            return Err(ServiceError::ConversionFailure("engine offline".to_string()));
        }
        Ok(AudioAsset::mp3(text.as_bytes().to_vec()))
    }
}

pub fn external(id: &str, popularity: u64) -> Story {
    Story {
        id: id.to_string(),
        title: format!("External {}", id),
        text: "Long enough to narrate, trust me.".to_string(),
        origin: Origin::External {
            category: "tifu".to_string(),
        },
        popularity: Some(popularity),
        submitted_at: None,
    }
}
