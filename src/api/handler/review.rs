use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::db::models::ListResponse;
use crate::db::prelude::*;
use crate::workflow::draft::{self, Draft};
use crate::workflow::points::{self, Award, PointAction};
use crate::workflow::wizard::{MissingField, ReviewWizard, WizardError, WizardStep};

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub rating: i16,
}

#[instrument(skip(state))]
pub async fn list_keywords(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> JsonResult<ListResponse<ReviewKeyword>> {
    let rating = Rating::try_from(query.rating)?;
    let keywords = state.store.keywords_for_rating(rating).await?;

    Ok(Json(ListResponse::new(keywords)))
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewBody {
    pub branch_id: BranchId,
    pub user_id: Option<UserId>,
    pub rating: Option<i16>,
    #[serde(default)]
    pub keyword_ids: Vec<KeywordId>,
    #[serde(default)]
    pub media_urls: Vec<String>,
}

/// Keyword strings for `ids` in request order; every id must belong to `rating`'s pool.
async fn resolve_keywords(
    store: &dyn Store,
    rating: Rating,
    ids: &[KeywordId],
) -> Result<Vec<String>, RouteError> {
    let found: HashMap<KeywordId, ReviewKeyword> = store
        .keywords_by_ids(ids)
        .await?
        .into_iter()
        .map(|k| (k.id, k))
        .collect();

    ids.iter()
        .map(|id| match found.get(id) {
            Some(k) if k.rating == rating && k.is_active => Ok(k.keyword.clone()),
            Some(_) => Err(RouteError::BadRequest(format!(
                "keyword '{id}' does not belong to rating {rating}"
            ))),
            None => Err(RouteError::BadRequest(format!("unknown keyword '{id}'"))),
        })
        .collect()
}

#[instrument(skip(state, body), fields(branch = %body.branch_id))]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateReviewBody>,
) -> JsonResult<Review> {
    let rating = body.rating.map(Rating::try_from).transpose()?;

    let mut seen = HashSet::new();
    let mut keyword_ids = body.keyword_ids;
    keyword_ids.retain(|id| seen.insert(*id));
    let media_urls: Vec<String> = body
        .media_urls
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    let wizard = ReviewWizard {
        media: media_urls.len(),
        rating,
        keywords: keyword_ids.len(),
        ..Default::default()
    };
    wizard.require(WizardStep::Generate)?;
    let rating = rating.ok_or(WizardError::Missing(MissingField::Rating))?;

    if !state.store.branch_exists(&body.branch_id).await? {
        return Err(RouteError::not_found("branch", body.branch_id));
    }

    let keywords = resolve_keywords(state.store.as_ref(), rating, &keyword_ids).await?;
    let review = state
        .store
        .insert_review(&NewReview {
            branch_id: body.branch_id,
            user_id: body.user_id,
            rating,
            keyword_ids,
            keywords,
            media_urls,
        })
        .await?;

    if let Some(user_id) = review.user_id {
        points::award_logged(
            state.store.as_ref(),
            &state.platforms,
            Award::new(user_id, PointAction::ReviewSubmit)
                .keyed(format!("review:{}:submit", review.id)),
        )
        .await;
    }

    tracing::info!(review = %review.id, "review created");
    Ok(Json(review))
}

#[instrument(skip(state))]
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReviewId>,
) -> JsonResult<Review> {
    state
        .store
        .review(&id)
        .await?
        .map(Json)
        .ok_or_else(|| RouteError::not_found("review", id))
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentBody {
    pub final_content: String,
}

#[instrument(skip(state, body))]
pub async fn update_review_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ReviewId>,
    Json(body): Json<UpdateContentBody>,
) -> JsonResult<Review> {
    let review = state
        .store
        .review(&id)
        .await?
        .ok_or_else(|| RouteError::not_found("review", id))?;

    if !review.has_draft() {
        return Err(WizardError::Missing(MissingField::Draft).into());
    }

    let content = body.final_content.trim();
    if content.is_empty() {
        return Err(RouteError::BadRequest(String::from("final_content must not be empty")));
    }

    state
        .store
        .update_final_content(&id, content)
        .await?
        .map(Json)
        .ok_or_else(|| RouteError::not_found("review", id))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub review_id: ReviewId,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub review: Review,
    pub draft: String,
    pub fallback: bool,
}

#[instrument(skip(state, body), fields(review = %body.review_id))]
pub async fn generate_review(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> JsonResult<GenerateResponse> {
    let review = state
        .store
        .review(&body.review_id)
        .await?
        .ok_or_else(|| RouteError::not_found("review", body.review_id))?;

    ReviewWizard::from_review(&review).require(WizardStep::Generate)?;

    let branch = state
        .store
        .branch(&review.branch_id)
        .await?
        .ok_or_else(|| RouteError::not_found("branch", review.branch_id))?;

    let Draft { text, fallback } = draft::generate_draft(
        state.completer.as_ref(),
        &branch,
        review.rating,
        &review.keywords,
    )
    .await;

    let review = state
        .store
        .store_draft(&review.id, &text)
        .await?
        .ok_or_else(|| RouteError::not_found("review", body.review_id))?;

    Ok(Json(GenerateResponse {
        review,
        draft: text,
        fallback,
    }))
}
