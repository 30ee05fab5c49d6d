use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::engagement::EngagementStore;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Story;
use crate::pool::StoryPool;
use crate::reddit::ExternalSource;
use crate::selector;

/// Merges a fresh external batch with the user pool.
///
/// Nothing external is cached: every call goes back to the source.
pub struct Aggregator {
    source: Arc<dyn ExternalSource>,
    pool: Arc<StoryPool>,
    engagement: Arc<EngagementStore>,
}

impl Aggregator {
    pub fn new(
        source: Arc<dyn ExternalSource>,
        pool: Arc<StoryPool>,
        engagement: Arc<EngagementStore>,
    ) -> Self {
        Self {
            source,
            pool,
            engagement,
        }
    }

    /// External stories followed by pool stories.
    ///
    /// A source outage degrades to the pool alone; the call only fails when
    /// both sides are empty.
    pub async fn random_pool(&self) -> ServiceResult<Vec<Story>> {
        let external = match self.source.fetch_external().await {
            Ok(stories) => stories,
            Err(e) => {
                warn!("{}, using submitted stories only", e);
                Vec::new()
            }
        };

        self.seed_engagement(&external);

        let mut combined = external;
        combined.extend(self.pool.list());

        if combined.is_empty() {
            return Err(ServiceError::NoStoriesAvailable);
        }

        Ok(combined)
    }

    /// One story drawn uniformly from `random_pool`
    pub async fn random_story(&self) -> ServiceResult<Story> {
        let stories = self.random_pool().await?;
        let story = selector::pick(&stories).map_err(|_| ServiceError::NoStoriesAvailable)?;
        Ok(story.clone())
    }

    /// One story drawn from the external source alone
    pub async fn external_story(&self) -> ServiceResult<Story> {
        let stories = match self.source.fetch_external().await {
            Ok(stories) => stories,
            Err(e) => {
                warn!("{}", e);
                return Err(ServiceError::NoExternalStory);
            }
        };

        self.seed_engagement(&stories);

        let story = selector::pick(&stories).map_err(|_| ServiceError::NoExternalStory)?;
        Ok(story.clone())
    }

    /// `ensure` each external id once per call, seeded from its popularity
    fn seed_engagement(&self, stories: &[Story]) {
        let mut seen = HashSet::new();
        let mut created = 0;
        for story in stories {
            if seen.insert(story.id.as_str()) && self.engagement.ensure(&story.id, story.seed_likes()) {
                created += 1;
            }
        }
        if created > 0 {
            info!("Seeded engagement for {} new external stories", created);
        }
    }
}
