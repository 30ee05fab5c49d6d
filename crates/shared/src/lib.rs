// Public modules
pub mod aggregator;
pub mod api;
pub mod config;
pub mod engagement;
pub mod error;
pub mod io;
pub mod models;
pub mod narrator;
pub mod normalize;
pub mod pool;
pub mod reddit;
pub mod selector;

#[cfg(test)]
mod test_server;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use api::{Request, Response, StoryApi};
pub use config::{Config, SourceConfig, SpeechConfig};
pub use engagement::EngagementStore;
pub use error::{ServiceError, ServiceResult};
pub use io::{get_default_narrations_dir, save_narration};
pub use models::{EngagementRecord, LikeDirection, Origin, Story, USER_SUBMITTED_LABEL};
pub use narrator::{AudioAsset, GoogleSpeech, Narrator};
pub use pool::StoryPool;
pub use reddit::{ExternalSource, RedditClient};
