//! Transport-independent request layer.
//!
//! `StoryApi` owns the pool, the engagement store and the aggregator, and
//! answers every viewer operation with a status code and a JSON body.
//! Transports only decode a [`Request`] and write back the [`Response`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::config::Config;
use crate::engagement::EngagementStore;
use crate::error::ServiceError;
use crate::models::LikeDirection;
use crate::narrator::{GoogleSpeech, Narrator};
use crate::pool::StoryPool;
use crate::reddit::{ExternalSource, RedditClient};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Ping,
    ExternalStory,
    RandomStory,
    SubmitStory {
        title: Option<String>,
        content: Option<String>,
        #[serde(alias = "subreddit")]
        origin_label: Option<String>,
    },
    ListStories,
    GetComments {
        story_id: String,
    },
    AddComment {
        story_id: String,
        comment: Option<String>,
    },
    GetLikes {
        story_id: String,
    },
    AdjustLike {
        story_id: String,
        action: String,
    },
    GenerateAudio {
        text: Option<String>,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Ping => "ping",
            Request::ExternalStory => "external_story",
            Request::RandomStory => "random_story",
            Request::SubmitStory { .. } => "submit_story",
            Request::ListStories => "list_stories",
            Request::GetComments { .. } => "get_comments",
            Request::AddComment { .. } => "add_comment",
            Request::GetLikes { .. } => "get_likes",
            Request::AdjustLike { .. } => "adjust_like",
            Request::GenerateAudio { .. } => "generate_audio",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<ServiceError> for Response {
    fn from(err: ServiceError) -> Self {
        Response::error(err.status(), err.to_string())
    }
}

/// Single entry point for all viewer operations
#[derive(Clone)]
pub struct StoryApi {
    aggregator: Arc<Aggregator>,
    pool: Arc<StoryPool>,
    engagement: Arc<EngagementStore>,
    narrator: Arc<dyn Narrator>,
}

impl StoryApi {
    /// Fresh, empty state around the given collaborators
    pub fn new(source: Arc<dyn ExternalSource>, narrator: Arc<dyn Narrator>) -> Self {
        let engagement = Arc::new(EngagementStore::new());
        let pool = Arc::new(StoryPool::new(engagement.clone()));
        let aggregator = Arc::new(Aggregator::new(source, pool.clone(), engagement.clone()));

        Self {
            aggregator,
            pool,
            engagement,
            narrator,
        }
    }

    /// Wire up the live external source and narrator
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(RedditClient::new(config.source.clone())?);
        let narrator = Arc::new(GoogleSpeech::new(config.speech.clone())?);
        Ok(Self::new(source, narrator))
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn pool(&self) -> &StoryPool {
        &self.pool
    }

    pub fn engagement(&self) -> &EngagementStore {
        &self.engagement
    }

    pub fn narrator(&self) -> &dyn Narrator {
        self.narrator.as_ref()
    }

    pub async fn handle(&self, request: Request) -> Response {
        let name = request.name();
        debug!("Handling {}", name);

        let response = match self.dispatch(request).await {
            Ok(body) => Response::ok(body),
            Err(err) => {
                if err.status() >= 500 {
                    warn!("{} failed: {}", name, err);
                }
                Response::from(err)
            }
        };

        debug!("{} -> {}", name, response.status);
        response
    }

    async fn dispatch(&self, request: Request) -> Result<Value, ServiceError> {
        match request {
            Request::Ping => Ok(json!({ "message": "story service is up" })),
            Request::ExternalStory => {
                let story = self.aggregator.external_story().await?;
                Ok(json!(story))
            }
            Request::RandomStory => {
                let story = self.aggregator.random_story().await?;
                Ok(json!(story))
            }
            Request::SubmitStory {
                title,
                content,
                origin_label,
            } => {
                let story = self.pool.submit(
                    title.as_deref().unwrap_or_default(),
                    content.as_deref().unwrap_or_default(),
                    origin_label.as_deref(),
                )?;
                Ok(json!(story))
            }
            Request::ListStories => Ok(json!({ "stories": self.pool.list() })),
            Request::GetComments { story_id } => {
                Ok(json!({ "comments": self.engagement.comments(&story_id) }))
            }
            Request::AddComment { story_id, comment } => {
                let comment = self
                    .engagement
                    .add_comment(&story_id, comment.as_deref().unwrap_or_default())?;
                Ok(json!({ "comment": comment }))
            }
            Request::GetLikes { story_id } => {
                Ok(json!({ "likes": self.engagement.likes(&story_id) }))
            }
            Request::AdjustLike { story_id, action } => {
                let likes = self
                    .engagement
                    .adjust_likes(&story_id, LikeDirection::from_token(&action));
                Ok(json!({ "likes": likes }))
            }
            Request::GenerateAudio { text } => {
                let asset = self
                    .narrator
                    .narrate(text.as_deref().unwrap_or_default())
                    .await?;
                Ok(json!({ "audio_src": asset.data_uri() }))
            }
        }
    }
}
