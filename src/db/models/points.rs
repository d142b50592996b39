use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use crate::uuid_id;

uuid_id!(PointEntryId);

/// One append-only ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointEntry {
    pub id: PointEntryId,
    pub user_id: UserId,
    pub points: i32,
    pub source: String,
    pub description: String,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPointEntry {
    pub user_id: UserId,
    pub points: i32,
    pub source: String,
    pub description: String,
    pub idempotency_key: Option<String>,
}
