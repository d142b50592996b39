use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::keyword::{KeywordId, ReviewKeyword};
use crate::db::models::review::Rating;
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct KeywordRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for KeywordRepository {
    type Ident = KeywordId;
    type Output = ReviewKeyword;

    const BASE_FIELDS: &'static str = sql_fragment::KEYWORD_FIELDS;
    const TABLE_NAME: &'static str = "review_keyword";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl KeywordRepository {
    /// Active keywords of one rating's pool, in display order.
    #[instrument(skip(self))]
    pub async fn for_rating(&self, rating: Rating) -> SqlxResult<Vec<ReviewKeyword>> {
        sqlx::query_as::<_, ReviewKeyword>(&format!(
            r#"
            SELECT {} FROM review_keyword
            WHERE rating = $1 AND is_active
            ORDER BY sort_order ASC, keyword ASC
            "#,
            Self::BASE_FIELDS
        ))
        .bind(rating)
        .fetch_all(&self.pool)
        .await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn get_many(&self, ids: &[KeywordId]) -> SqlxResult<Vec<ReviewKeyword>> {
        sqlx::query_as::<_, ReviewKeyword>(&format!(
            "SELECT {} FROM review_keyword WHERE id = ANY($1)",
            Self::BASE_FIELDS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
    }
}
