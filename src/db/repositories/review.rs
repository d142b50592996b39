use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::UserId;
use crate::db::models::review::{NewReview, Review, ReviewId, ReviewStatus};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct ReviewRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for ReviewRepository {
    type Ident = ReviewId;
    type Output = Review;

    const BASE_FIELDS: &'static str = sql_fragment::REVIEW_FIELDS;
    const TABLE_NAME: &'static str = "review";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ReviewRepository {
    #[instrument(skip(self, item), fields(branch = %item.branch_id, rating = %item.rating))]
    pub async fn insert(&self, item: &NewReview) -> SqlxResult<Review> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO review (
                id,
                branch_id,
                user_id,
                rating,
                keyword_ids,
                keywords,
                media_urls,
                draft_content,
                final_content,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, '', $8, NOW(), NOW())
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(ReviewId::new_v4())
        .bind(item.branch_id)
        .bind(item.user_id)
        .bind(item.rating)
        .bind(&item.keyword_ids)
        .bind(&item.keywords)
        .bind(&item.media_urls)
        .bind(ReviewStatus::Draft)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "failure during review insertion"))
    }

    /// Stores a generated draft; the draft also becomes the editable final text.
    #[instrument(skip(self, draft))]
    pub async fn store_draft(&self, id: &ReviewId, draft: &str) -> SqlxResult<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE review
            SET draft_content = $2,
                final_content = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(id)
        .bind(draft)
        .fetch_optional(&self.pool)
        .await
    }

    #[instrument(skip(self, content))]
    pub async fn update_final_content(
        &self,
        id: &ReviewId,
        content: &str,
    ) -> SqlxResult<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE review
            SET final_content = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: &ReviewId,
        status: ReviewStatus,
    ) -> SqlxResult<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE review
            SET status = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    /// Newest first; `limit = None` returns the user's whole history.
    #[instrument(skip(self))]
    pub async fn for_user(&self, user_id: &UserId, limit: Option<i64>) -> SqlxResult<Vec<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            SELECT {} FROM review
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
