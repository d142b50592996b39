use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::models::Pagination;
use crate::db::prelude::*;
use crate::workflow::points::{self, ActionKind, Award, PointAction};

#[derive(Debug, Deserialize)]
pub struct AwardBody {
    pub user_id: UserId,
    pub action: ActionKind,
    pub platform_id: Option<PlatformId>,
    pub days: Option<u32>,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AwardResponse {
    pub entry: Option<PointEntry>,
    pub duplicate: bool,
}

#[instrument(skip(state, body), fields(user = %body.user_id, action = ?body.action))]
pub async fn award_points(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AwardBody>,
) -> JsonResult<AwardResponse> {
    let action = PointAction::from_parts(body.action, body.platform_id, body.days)?;
    if let PointAction::CaptionCopy { platform } = &action
        && state.platforms.get(platform).is_none()
    {
        return Err(RouteError::UnknownPlatform(platform.clone()));
    }

    let award = Award {
        user_id: body.user_id,
        action,
        description: body.description.filter(|d| !d.trim().is_empty()),
        idempotency_key: body.idempotency_key.filter(|k| !k.trim().is_empty()),
    };

    let entry = points::award(state.store.as_ref(), &state.platforms, award).await?;
    Ok(Json(AwardResponse {
        duplicate: entry.is_none(),
        entry,
    }))
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub items: Vec<PointEntry>,
    pub total_items: usize,
    pub total_points: i64,
}

#[instrument(skip(state))]
pub async fn user_points(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Query(page): Query<Pagination>,
) -> JsonResult<PointsResponse> {
    let mut items = state.store.points_for_user(&user_id, None).await?;
    let total_points = items.iter().map(|p| i64::from(p.points)).sum();
    let total_items = items.len();
    items.truncate(page.limit.max(0) as usize);

    Ok(Json(PointsResponse {
        items,
        total_items,
        total_points,
    }))
}
