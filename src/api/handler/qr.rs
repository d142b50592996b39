use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use http::StatusCode;
use serde::Deserialize;
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::prelude::{BranchId, BranchWithAgency};

#[derive(Debug, Deserialize)]
pub struct QrQuery {
    pub branch: Option<String>,
}

/// Resolves a scanned code to its branch. Failures of any kind answer with the same message.
#[instrument(skip(state))]
pub async fn resolve_qr(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QrQuery>,
) -> JsonResult<BranchWithAgency> {
    let branch_id = query
        .branch
        .as_deref()
        .and_then(|raw| BranchId::from_str(raw).ok())
        .ok_or(RouteError::InvalidQr(StatusCode::BAD_REQUEST))?;

    match state.store.branch_with_agency(&branch_id).await {
        Ok(Some(branch)) => Ok(Json(branch)),
        Ok(None) => Err(RouteError::InvalidQr(StatusCode::NOT_FOUND)),
        Err(e) => {
            tracing::error!(error = ?e, %branch_id, "branch lookup failed");
            Err(RouteError::InvalidQr(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}
