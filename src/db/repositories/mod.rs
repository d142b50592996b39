use core::fmt;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Result as SqlxResult, Transaction};
use tracing::instrument;

use crate::db::prelude::{
    NewTracker, PostingStatus, PostingTracker, Review, ReviewId, ReviewStatus, TrackerId,
};

pub mod branch;
pub mod caption;
pub mod keyword;
pub mod platform;
pub mod points;
pub mod review;
pub mod tracker;

pub struct Tx {
    inner: Option<Transaction<'static, Postgres>>,
}

impl Tx {
    /// Runs `f` inside a transaction, committing only when it returns `Ok`. On error the
    /// transaction is dropped, which rolls it back.
    #[instrument(skip(pool, f))]
    pub async fn with_tx<F, Fut, T>(pool: &PgPool, f: F) -> SqlxResult<T>
    where
        F: FnOnce(Tx) -> Fut,
        Fut: Future<Output = (Tx, SqlxResult<T>)>,
    {
        let tx = Self::begin(pool).await?;
        let (mut tx, result) = f(tx).await;

        match result {
            Ok(val) => {
                tx.commit().await?;
                Ok(val)
            }
            Err(e) => {
                tracing::trace!(error = ?e, "transacted query failure");
                Err(e)
            }
        }
    }

    #[instrument(skip(pool))]
    pub async fn begin(pool: &PgPool) -> SqlxResult<Self> {
        let inner = pool.begin().await?;
        Ok(Self { inner: Some(inner) })
    }

    #[instrument(skip(self))]
    pub async fn commit(&mut self) -> SqlxResult<()> {
        if let Some(tx) = self.inner.take() {
            tx.commit().await
        } else {
            Err(sqlx::Error::Protocol(
                "Transaction already completed".into(),
            ))
        }
    }

    fn inner_mut(&mut self) -> SqlxResult<&mut Transaction<'static, Postgres>> {
        self.inner
            .as_mut()
            .ok_or_else(|| sqlx::Error::Protocol("Transaction already completed".into()))
    }

    #[instrument(skip(self, item), fields(review = %item.review_id, platform = %item.platform_id))]
    pub async fn insert_tracker(&mut self, item: &NewTracker) -> SqlxResult<PostingTracker> {
        sqlx::query_as::<_, PostingTracker>(&format!(
            r#"
            INSERT INTO posting_tracker (
                id,
                user_id,
                review_id,
                platform_id,
                status,
                caption,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING {}
            "#,
            sql_fragment::TRACKER_FIELDS
        ))
        .bind(TrackerId::new_v4())
        .bind(item.user_id)
        .bind(item.review_id)
        .bind(&item.platform_id)
        .bind(PostingStatus::Pending)
        .bind(&item.caption)
        .fetch_one(&mut **self.inner_mut()?)
        .await
    }

    /// Moves a review into `status`, replacing `final_content` when one is given. A review that
    /// is already `published` stays published.
    #[instrument(skip(self, final_content))]
    pub async fn update_review_status(
        &mut self,
        id: &ReviewId,
        status: ReviewStatus,
        final_content: Option<&str>,
    ) -> SqlxResult<Option<Review>> {
        sqlx::query_as::<_, Review>(&format!(
            r#"
            UPDATE review
            SET status = CASE WHEN status = 'published' THEN status ELSE $2 END,
                final_content = COALESCE($3, final_content),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            sql_fragment::REVIEW_FIELDS
        ))
        .bind(id)
        .bind(status)
        .bind(final_content)
        .fetch_optional(&mut **self.inner_mut()?)
        .await
    }
}

pub mod sql_fragment {
    pub const BRANCH_FIELDS: &str = r#"
        id,
        agency_id,
        name,
        address,
        industry,
        latitude,
        longitude,
        created_at
    "#;

    pub const KEYWORD_FIELDS: &str = r#"
        id,
        rating,
        keyword,
        sort_order,
        is_active
    "#;

    pub const REVIEW_FIELDS: &str = r#"
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
    "#;

    pub const TRACKER_FIELDS: &str = r#"
        id,
        user_id,
        review_id,
        platform_id,
        status,
        caption,
        likes,
        comments,
        shares,
        created_at,
        shared_at,
        completed_at
    "#;

    pub const POINTS_FIELDS: &str = r#"
        id,
        user_id,
        points,
        source,
        description,
        idempotency_key,
        created_at
    "#;

    pub const CAPTION_FIELDS: &str = r#"
        id,
        user_id,
        review_id,
        platform_id,
        caption,
        created_at
    "#;
}

/// Base lookups shared by every table keyed on a single `id` column.
#[async_trait]
pub trait Repository: Send + Sync {
    type Ident: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + Sync + fmt::Debug;
    type Output: for<'r> sqlx::FromRow<'r, PgRow> + Sized + Unpin + Send + fmt::Debug;

    const BASE_FIELDS: &'static str;
    const TABLE_NAME: &'static str;

    fn new(pool: PgPool) -> Self
    where
        Self: Sized;

    fn pool(&self) -> &PgPool;

    async fn exists(&self, id: &Self::Ident) -> SqlxResult<bool> {
        sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            Self::TABLE_NAME
        ))
        .bind(id)
        .fetch_one(self.pool())
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, table = Self::TABLE_NAME, "failed to check row existence")
        })
    }

    #[instrument(skip(self, id), fields(table = Self::TABLE_NAME))]
    async fn get_by_id(&self, id: &Self::Ident) -> SqlxResult<Option<Self::Output>> {
        sqlx::query_as::<_, Self::Output>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::BASE_FIELDS,
            Self::TABLE_NAME
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
    }
}
