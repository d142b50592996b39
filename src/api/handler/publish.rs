use std::collections::HashSet;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::models::ListResponse;
use crate::db::prelude::*;
use crate::workflow::feed::TrackerEvent;
use crate::workflow::platform::{DistributionAction, PlatformTemplate};
use crate::workflow::wizard::ReviewWizard;

#[instrument(skip(state))]
pub async fn list_platforms(
    State(state): State<Arc<AppState>>,
) -> JsonResult<ListResponse<PlatformTemplate>> {
    Ok(Json(ListResponse::new(state.platforms.list().to_vec())))
}

#[derive(Debug, Deserialize)]
pub struct PublishBody {
    pub review_id: ReviewId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub platform_ids: Vec<PlatformId>,
    pub final_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishedItem {
    pub tracker: PostingTracker,
    pub action: DistributionAction,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub review: Review,
    pub items: Vec<PublishedItem>,
}

#[instrument(skip(state, body), fields(review = %body.review_id, platforms = body.platform_ids.len()))]
pub async fn publish_review(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PublishBody>,
) -> JsonResult<PublishResponse> {
    let review = state
        .store
        .review(&body.review_id)
        .await?
        .ok_or_else(|| RouteError::not_found("review", body.review_id))?;

    let mut seen = HashSet::new();
    let platform_ids: Vec<PlatformId> = body
        .platform_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    ReviewWizard::from_review(&review)
        .with_platforms(platform_ids.len())
        .require_complete()?;

    let templates = platform_ids
        .iter()
        .map(|id| {
            state
                .platforms
                .get(id)
                .ok_or_else(|| RouteError::UnknownPlatform(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let branch = state
        .store
        .branch(&review.branch_id)
        .await?
        .ok_or_else(|| RouteError::not_found("branch", review.branch_id))?;

    let edited = body
        .final_content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let text = edited.unwrap_or(&review.final_content);
    let user_id = body.user_id.or(review.user_id);

    let new_trackers: Vec<NewTracker> = templates
        .iter()
        .map(|t| NewTracker {
            user_id,
            review_id: review.id,
            platform_id: t.id.clone(),
            caption: t.format_caption(text, &branch.name, &review.keywords),
        })
        .collect();

    let (review, trackers) = state
        .store
        .publish(&review.id, edited, &new_trackers)
        .await?;

    let items = trackers
        .into_iter()
        .zip(templates)
        .map(|(tracker, template)| {
            state.feed.publish(TrackerEvent::Inserted(tracker.clone()));
            PublishedItem {
                action: template.distribution_action(&tracker.caption, &branch),
                tracker,
            }
        })
        .collect();

    tracing::info!(review = %review.id, "review published");
    Ok(Json(PublishResponse { review, items }))
}
