use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserId;
use super::platform::PlatformId;
use super::review::ReviewId;
use crate::uuid_id;

uuid_id!(TrackerId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "posting_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Pending,
    Shared,
    Posted,
    Failed,
}

impl PostingStatus {
    /// `pending -> shared -> posted|failed`; nothing else, and never backwards.
    pub fn can_transition_to(self, next: PostingStatus) -> bool {
        matches!(
            (self, next),
            (PostingStatus::Pending, PostingStatus::Shared)
                | (PostingStatus::Shared, PostingStatus::Posted)
                | (PostingStatus::Shared, PostingStatus::Failed)
        )
    }

    pub fn transition(self, next: PostingStatus) -> Result<PostingStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid posting transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: PostingStatus,
    pub to: PostingStatus,
}

/// Self-reported counters attached when the user reports the outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: Option<i32>,
    pub comments: Option<i32>,
    pub shares: Option<i32>,
}

/// Base posting tracker table model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostingTracker {
    pub id: TrackerId,
    pub user_id: Option<UserId>,
    pub review_id: ReviewId,
    pub platform_id: PlatformId,
    pub status: PostingStatus,
    pub caption: String,
    pub likes: Option<i32>,
    pub comments: Option<i32>,
    pub shares: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub shared_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTracker {
    pub user_id: Option<UserId>,
    pub review_id: ReviewId,
    pub platform_id: PlatformId,
    pub caption: String,
}
