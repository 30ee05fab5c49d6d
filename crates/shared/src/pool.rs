use chrono::Utc;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use crate::engagement::EngagementStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Origin, Story, USER_SUBMITTED_LABEL};

#[derive(Debug, Default)]
struct PoolState {
    stories: Vec<Story>,
    last_id: i64,
}

/// User-submitted stories, oldest first.
///
/// Every submission also gets a zeroed engagement record so it can be
/// liked or commented on immediately.
#[derive(Debug)]
pub struct StoryPool {
    state: Mutex<PoolState>,
    engagement: Arc<EngagementStore>,
}

impl StoryPool {
    pub fn new(engagement: Arc<EngagementStore>) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            engagement,
        }
    }

    pub fn submit(
        &self,
        title: &str,
        content: &str,
        origin_label: Option<&str>,
    ) -> ServiceResult<Story> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() {
            return Err(ServiceError::required("title"));
        }
        if content.is_empty() {
            return Err(ServiceError::required("content"));
        }

        let label = origin_label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(USER_SUBMITTED_LABEL);

        let now = Utc::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        // Millisecond timestamps, bumped when two submissions share a tick
        let id = now.timestamp_millis().max(state.last_id + 1);
        state.last_id = id;

        let story = Story {
            id: id.to_string(),
            title: title.to_string(),
            text: content.to_string(),
            origin: Origin::UserSubmitted {
                label: label.to_string(),
            },
            popularity: None,
            submitted_at: Some(now.to_rfc3339()),
        };

        state.stories.push(story.clone());
        self.engagement.ensure(&story.id, 0);
        info!("Story {} submitted: {:?}", story.id, story.title);

        Ok(story)
    }

    pub fn list(&self) -> Vec<Story> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stories
            .clone()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stories
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
