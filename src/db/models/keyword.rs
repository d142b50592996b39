use serde::{Deserialize, Serialize};

use super::review::Rating;
use crate::uuid_id;

uuid_id!(KeywordId);

/// Suggested tag word; each rating owns a separate pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReviewKeyword {
    pub id: KeywordId,
    pub rating: Rating,
    pub keyword: String,
    pub sort_order: i32,
    pub is_active: bool,
}
