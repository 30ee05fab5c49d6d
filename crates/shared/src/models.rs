use serde::{Deserialize, Serialize};

/// Label given to user-submitted stories when the submitter doesn't pick one
pub const USER_SUBMITTED_LABEL: &str = "user-submitted";

/// Where a story came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Pulled from the external source; `category` is the source-native category name
    External { category: String },
    /// Posted by a user of the viewer
    UserSubmitted { label: String },
}

impl Origin {
    pub fn label(&self) -> &str {
        match self {
            Origin::External { category } => category,
            Origin::UserSubmitted { label } => label,
        }
    }

    pub fn is_user_submitted(&self) -> bool {
        matches!(self, Origin::UserSubmitted { .. })
    }
}

/// One narrative unit, external or user-submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub text: String,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
}

impl Story {
    /// Like count a fresh engagement record starts from
    pub fn seed_likes(&self) -> u64 {
        self.popularity.unwrap_or(0)
    }
}

/// Comments and likes attached to one story id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub comments: Vec<String>,
    pub likes: u64,
}

impl EngagementRecord {
    pub fn seeded(likes: u64) -> Self {
        Self {
            comments: Vec::new(),
            likes,
        }
    }
}

/// Direction of a like-button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeDirection {
    Increase,
    Decrease,
}

impl LikeDirection {
    /// `like` increases; every other token takes a like away.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("like") {
            LikeDirection::Increase
        } else {
            LikeDirection::Decrease
        }
    }
}
