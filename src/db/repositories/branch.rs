use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use super::sql_fragment;
use crate::db::models::branch::{Branch, BranchAgencyRow, BranchId, BranchWithAgency};
use crate::db::repositories::Repository;

#[derive(Debug)]
pub struct BranchRepository {
    pool: PgPool,
}

#[async_trait::async_trait]
impl Repository for BranchRepository {
    type Ident = BranchId;
    type Output = Branch;

    const BASE_FIELDS: &'static str = sql_fragment::BRANCH_FIELDS;
    const TABLE_NAME: &'static str = "branch";

    fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl BranchRepository {
    #[instrument(skip(self))]
    pub async fn get_with_agency(&self, id: &BranchId) -> SqlxResult<Option<BranchWithAgency>> {
        let row = sqlx::query_as::<_, BranchAgencyRow>(
            r#"
            SELECT
                b.id,
                b.agency_id,
                b.name,
                b.address,
                b.industry,
                b.latitude,
                b.longitude,
                b.created_at,
                a.name AS agency_name
            FROM branch b
            JOIN agency a ON a.id = b.agency_id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BranchWithAgency::from))
    }
}
