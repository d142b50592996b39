use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::UserId;
use crate::db::models::points::{NewPointEntry, PointEntry, PointEntryId};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct PointsRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for PointsRepository {
    type Ident = PointEntryId;
    type Output = PointEntry;

    const BASE_FIELDS: &'static str = sql_fragment::POINTS_FIELDS;
    const TABLE_NAME: &'static str = "user_points";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl PointsRepository {
    /// Appends a ledger row. Rows without an idempotency key are always inserted; a key that was
    /// already used yields `Ok(None)` and leaves the ledger untouched.
    #[instrument(skip(self, item), fields(user = %item.user_id, source = item.source, points = item.points))]
    pub async fn insert(&self, item: &NewPointEntry) -> SqlxResult<Option<PointEntry>> {
        sqlx::query_as::<_, PointEntry>(&format!(
            r#"
            INSERT INTO user_points (
                id,
                user_id,
                points,
                source,
                description,
                idempotency_key,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (idempotency_key)
            DO NOTHING
            RETURNING {}
            "#,
            Self::BASE_FIELDS
        ))
        .bind(PointEntryId::new_v4())
        .bind(item.user_id)
        .bind(item.points)
        .bind(&item.source)
        .bind(&item.description)
        .bind(&item.idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "failure during points insertion"))
    }

    #[instrument(skip(self))]
    pub async fn for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> SqlxResult<Vec<PointEntry>> {
        sqlx::query_as::<_, PointEntry>(&format!(
            r#"
            SELECT {} FROM user_points
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
