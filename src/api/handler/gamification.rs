use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use tracing::instrument;

use crate::api::server::{AppState, JsonResult};
use crate::db::prelude::UserId;
use crate::workflow::gamification::GamificationSummary;

#[instrument(skip(state))]
pub async fn user_gamification(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> JsonResult<GamificationSummary> {
    let store = state.store.as_ref();
    let (points, reviews, trackers) = tokio::try_join!(
        store.points_for_user(&user_id, None),
        store.reviews_for_user(&user_id, None),
        store.trackers_for_user(&user_id),
    )?;

    Ok(Json(GamificationSummary::compute(
        &points,
        &reviews,
        &trackers,
        Utc::now().date_naive(),
    )))
}
