use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::models::ListResponse;
use crate::db::models::tracker::TransitionError;
use crate::db::prelude::*;
use crate::workflow::feed::TrackerEvent;
use crate::workflow::points::{self, Award, PointAction};

/// Moves a tracker one step forward. The store update is conditional on the status read here,
/// so a concurrent change surfaces as a transition error instead of a lost update.
async fn advance(
    state: &AppState,
    id: TrackerId,
    to: PostingStatus,
    engagement: Option<Engagement>,
) -> Result<PostingTracker, RouteError> {
    let current = state
        .store
        .tracker(&id)
        .await?
        .ok_or_else(|| RouteError::not_found("tracker", id))?;

    let from = current.status;
    from.transition(to)?;

    let updated = state
        .store
        .transition_tracker(&id, from, to, engagement)
        .await?
        .ok_or(TransitionError { from, to })?;

    state.feed.publish(TrackerEvent::Updated(updated.clone()));
    Ok(updated)
}

#[instrument(skip(state))]
pub async fn mark_shared(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TrackerId>,
) -> JsonResult<PostingTracker> {
    Ok(Json(advance(&state, id, PostingStatus::Shared, None).await?))
}

#[derive(Debug, Deserialize)]
pub struct OutcomeBody {
    pub success: bool,
    pub likes: Option<i32>,
    pub comments: Option<i32>,
    pub shares: Option<i32>,
}

#[instrument(skip(state, body), fields(success = body.success))]
pub async fn report_outcome(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TrackerId>,
    Json(body): Json<OutcomeBody>,
) -> JsonResult<PostingTracker> {
    let (to, engagement) = if body.success {
        let engagement = Engagement {
            likes: body.likes,
            comments: body.comments,
            shares: body.shares,
        };
        (PostingStatus::Posted, Some(engagement))
    } else {
        (PostingStatus::Failed, None)
    };

    let tracker = advance(&state, id, to, engagement).await?;

    if tracker.status == PostingStatus::Posted {
        if let Some(user_id) = tracker.user_id {
            let action = PointAction::PlatformShare {
                platform: tracker.platform_id.clone(),
            };
            points::award_logged(
                state.store.as_ref(),
                &state.platforms,
                Award::new(user_id, action).keyed(format!("tracker:{}:posted", tracker.id)),
            )
            .await;
        }

        state
            .store
            .set_review_status(&tracker.review_id, ReviewStatus::Published)
            .await?;
    } else {
        let siblings = state.store.trackers_for_review(&tracker.review_id).await?;
        if siblings.iter().all(|t| t.status == PostingStatus::Failed) {
            state
                .store
                .set_review_status(&tracker.review_id, ReviewStatus::Failed)
                .await?;
        }
    }

    Ok(Json(tracker))
}

#[instrument(skip(state))]
pub async fn user_trackers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> JsonResult<ListResponse<PostingTracker>> {
    let trackers = state.store.trackers_for_user(&user_id).await?;
    Ok(Json(ListResponse::new(trackers)))
}
