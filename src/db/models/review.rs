use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserId;
use super::branch::BranchId;
use super::keyword::KeywordId;
use crate::constants::{RATING_MAX, RATING_MIN};
use crate::uuid_id;

uuid_id!(ReviewId);

/// Star rating, always within `1..=5` when built through `TryFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(i16);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rating must be between 1 and 5 (got {0})")]
pub struct InvalidRating(pub i16);

impl Rating {
    pub fn value(self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for Rating {
    type Error = InvalidRating;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        if (RATING_MIN..=RATING_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidRating(value))
        }
    }
}

impl From<Rating> for i16 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Draft,
    Pending,
    Published,
    Failed,
}

/// Base review table model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub branch_id: BranchId,
    pub user_id: Option<UserId>,
    pub rating: Rating,
    pub keyword_ids: Vec<KeywordId>,
    pub keywords: Vec<String>,
    pub media_urls: Vec<String>,
    pub draft_content: Option<String>,
    pub final_content: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn has_draft(&self) -> bool {
        self.draft_content
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub branch_id: BranchId,
    pub user_id: Option<UserId>,
    pub rating: Rating,
    pub keyword_ids: Vec<KeywordId>,
    pub keywords: Vec<String>,
    pub media_urls: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::try_from(0).is_err());
        assert!(Rating::try_from(6).is_err());
        assert_eq!(Rating::try_from(5).unwrap().value(), 5);
    }

    #[test]
    fn test_rating_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("3").is_ok());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_review_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReviewStatus::Published).unwrap(),
            "\"published\""
        );
    }
}
