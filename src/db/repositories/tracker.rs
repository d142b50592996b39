use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::UserId;
use crate::db::models::review::ReviewId;
use crate::db::models::tracker::{Engagement, PostingStatus, PostingTracker, TrackerId};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct TrackerRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for TrackerRepository {
    type Ident = TrackerId;
    type Output = PostingTracker;

    const BASE_FIELDS: &'static str = sql_fragment::TRACKER_FIELDS;
    const TABLE_NAME: &'static str = "posting_tracker";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TrackerRepository {
    /// Compare-and-set status update: only applies while the row is still in `from`, so two
    /// racing reports cannot both move it. Returns `None` when the row was not in `from`.
    ///
    /// `shared_at` is stamped on entering `shared`, `completed_at` on entering a terminal state.
    #[instrument(skip(self, engagement))]
    pub async fn transition(
        &self,
        id: &TrackerId,
        from: PostingStatus,
        to: PostingStatus,
        engagement: Option<Engagement>,
    ) -> SqlxResult<Option<PostingTracker>> {
        let engagement = engagement.unwrap_or_default();

        sqlx::query_as::<_, PostingTracker>(&format!(
            r#"
            UPDATE posting_tracker
            SET status = $3,
                shared_at = CASE WHEN $3 = 'shared'::posting_status THEN NOW() ELSE shared_at END,
                completed_at = CASE
                    WHEN $3 IN ('posted'::posting_status, 'failed'::posting_status) THEN NOW()
                    ELSE completed_at
                END,
                likes = COALESCE($4, likes),
                comments = COALESCE($5, comments),
                shares = COALESCE($6, shares)
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(engagement.likes)
        .bind(engagement.comments)
        .bind(engagement.shares)
        .fetch_optional(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn for_review(&self, review_id: &ReviewId) -> SqlxResult<Vec<PostingTracker>> {
        sqlx::query_as::<_, PostingTracker>(&format!(
            "SELECT {} FROM posting_tracker WHERE review_id = $1 ORDER BY created_at ASC",
            Self::BASE_FIELDS
        ))
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
    }

    #[instrument(skip(self))]
    pub async fn for_user(&self, user_id: &UserId) -> SqlxResult<Vec<PostingTracker>> {
        sqlx::query_as::<_, PostingTracker>(&format!(
            "SELECT {} FROM posting_tracker WHERE user_id = $1 ORDER BY created_at DESC",
            Self::BASE_FIELDS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
