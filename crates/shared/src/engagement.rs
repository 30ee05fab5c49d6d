use dashmap::DashMap;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{EngagementRecord, LikeDirection};

/// Comments and likes per story id.
///
/// Reads never create a record: an unknown id reads as zero likes and no
/// comments. Writes materialize the record first (zero likes) and then
/// apply the change.
#[derive(Debug, Default)]
pub struct EngagementStore {
    records: DashMap<String, EngagementRecord>,
}

impl EngagementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record with `seed_likes` unless one already exists.
    ///
    /// Returns whether a record was created.
    pub fn ensure(&self, id: &str, seed_likes: u64) -> bool {
        if self.records.contains_key(id) {
            return false;
        }
        let mut created = false;
        self.records.entry(id.to_string()).or_insert_with(|| {
            created = true;
            EngagementRecord::seeded(seed_likes)
        });
        if created {
            debug!("Created engagement record for {} ({} likes)", id, seed_likes);
        }
        created
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn comments(&self, id: &str) -> Vec<String> {
        match self.records.get(id) {
            Some(record) => record.comments.clone(),
            None => Vec::new(),
        }
    }

    /// Append a comment, creating the record if needed. Returns the stored text.
    pub fn add_comment(&self, id: &str, text: &str) -> ServiceResult<String> {
        let comment = text.trim();
        if comment.is_empty() {
            return Err(ServiceError::required("comment"));
        }

        let mut record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| EngagementRecord::seeded(0));
        record.comments.push(comment.to_string());
        Ok(comment.to_string())
    }

    pub fn likes(&self, id: &str) -> u64 {
        match self.records.get(id) {
            Some(record) => record.likes,
            None => 0,
        }
    }

    /// Nudge the like count one step, creating the record if needed.
    ///
    /// Never goes below zero. Returns the new count.
    pub fn adjust_likes(&self, id: &str, direction: LikeDirection) -> u64 {
        let mut record = self
            .records
            .entry(id.to_string())
            .or_insert_with(|| EngagementRecord::seeded(0));
        let likes = match direction {
            LikeDirection::Increase => record.likes.saturating_add(1),
            LikeDirection::Decrease => record.likes.saturating_sub(1),
        };
        record.likes = likes;
        likes
    }

    /// Copy of the full record, if one exists
    pub fn record(&self, id: &str) -> Option<EngagementRecord> {
        self.records.get(id).map(|r| r.clone())
    }
}
