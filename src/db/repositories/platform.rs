use sqlx::{PgPool, Result as SqlxResult};
use tracing::instrument;

use crate::db::models::platform::PlatformRow;

#[derive(Debug)]
pub struct PlatformRepository {
    pool: PgPool,
}

impl PlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn all(&self) -> SqlxResult<Vec<PlatformRow>> {
        sqlx::query_as::<_, PlatformRow>(
            "SELECT id, name, default_points, template FROM platform ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
