use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::UserId;
use crate::db::models::caption::{CaptionId, GeneratedCaption, NewCaption};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct CaptionRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for CaptionRepository {
    type Ident = CaptionId;
    type Output = GeneratedCaption;

    const BASE_FIELDS: &'static str = sql_fragment::CAPTION_FIELDS;
    const TABLE_NAME: &'static str = "generated_caption";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CaptionRepository {
    #[instrument(skip(self, item), fields(platform = %item.platform_id))]
    pub async fn insert(&self, item: &NewCaption) -> SqlxResult<GeneratedCaption> {
        sqlx::query_as::<_, GeneratedCaption>(&format!(
            r#"
            INSERT INTO generated_caption (
                id,
                user_id,
                review_id,
                platform_id,
                caption,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(CaptionId::new_v4())
        .bind(item.user_id)
        .bind(item.review_id)
        .bind(&item.platform_id)
        .bind(&item.caption)
        .fetch_one(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> SqlxResult<Vec<GeneratedCaption>> {
        sqlx::query_as::<_, GeneratedCaption>(&format!(
            r#"
            SELECT {} FROM generated_caption
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            Self::BASE_FIELDS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
