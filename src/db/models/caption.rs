use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use super::platform::PlatformId;
use super::review::ReviewId;
use crate::uuid_id;

uuid_id!(CaptionId);

/// A caption produced by the personalized caption service, kept to personalize later ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GeneratedCaption {
    pub id: CaptionId,
    pub user_id: Option<UserId>,
    pub review_id: Option<ReviewId>,
    pub platform_id: PlatformId,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCaption {
    pub user_id: Option<UserId>,
    pub review_id: Option<ReviewId>,
    pub platform_id: PlatformId,
    pub caption: String,
}
