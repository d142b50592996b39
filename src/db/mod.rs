use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::instrument;

use crate::util::env::{self, Var};
use crate::var;

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub mod prelude {
    pub use crate::db::models::UserId;
    pub use crate::db::models::branch::{Agency, AgencyId, Branch, BranchId, BranchWithAgency};
    pub use crate::db::models::caption::{GeneratedCaption, NewCaption};
    pub use crate::db::models::keyword::{KeywordId, ReviewKeyword};
    pub use crate::db::models::platform::{PlatformId, PlatformRow};
    pub use crate::db::models::points::{NewPointEntry, PointEntry};
    pub use crate::db::models::review::{NewReview, Rating, Review, ReviewId, ReviewStatus};
    pub use crate::db::models::tracker::{
        Engagement, NewTracker, PostingStatus, PostingTracker, TrackerId,
    };
    pub use crate::db::store::{PgStore, Store};
    pub use crate::db::{PgError, PgResult};
}

const MAX_CONNECTIONS: u32 = 10;

/// Opens the single pool shared by every repository for the lifetime of the server.
#[instrument]
pub async fn connect() -> PgResult<PgPool> {
    let db_url = var!(Var::DatabaseUrl).await?;
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(db_url)
        .await?;

    tracing::info!(max_connections = MAX_CONNECTIONS, "connected to postgres");
    Ok(pool)
}

#[instrument(skip(pool))]
pub async fn migrate(pool: &PgPool) -> PgResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}

pub type PgResult<T> = core::result::Result<T, PgError>;

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum PgError {
    #[error(transparent)]
    SqlxError(#[from] sqlx::Error),

    #[error(transparent)]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    EnvError(#[from] env::EnvErr),
}
