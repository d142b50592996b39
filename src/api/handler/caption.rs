use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::constants::{
    ANALYSIS_MAX_TOKENS, HISTORY_CAPTION_LIMIT, HISTORY_POINTS_LIMIT, HISTORY_REVIEW_LIMIT,
};
use crate::db::prelude::*;
use crate::util::openai::{CompletionRequest, complete_json};
use crate::workflow::caption::prompt::{CaptionContext, caption_request};
use crate::workflow::caption::{CaptionScores, UserPattern};
use crate::workflow::platform::PlatformTemplate;

fn platform<'a>(state: &'a AppState, id: &PlatformId) -> Result<&'a PlatformTemplate, RouteError> {
    state
        .platforms
        .get(id)
        .ok_or_else(|| RouteError::UnknownPlatform(id.clone()))
}

#[derive(Debug, Deserialize)]
pub struct CaptionBody {
    pub review_id: Option<ReviewId>,
    pub content: String,
    pub branch_id: BranchId,
    pub platform_id: PlatformId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub previous_captions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptionResponse {
    pub caption: String,
    pub pattern: UserPattern,
    pub scores: CaptionScores,
}

async fn user_pattern(store: &dyn Store, user_id: Option<UserId>) -> PgResult<UserPattern> {
    let Some(user_id) = user_id else {
        return Ok(UserPattern::default());
    };

    let (captions, points, reviews) = tokio::try_join!(
        store.recent_captions(&user_id, HISTORY_CAPTION_LIMIT),
        store.points_for_user(&user_id, Some(HISTORY_POINTS_LIMIT)),
        store.reviews_for_user(&user_id, Some(HISTORY_REVIEW_LIMIT)),
    )?;

    Ok(UserPattern::from_history(&captions, &points, &reviews))
}

#[instrument(skip(state, body), fields(platform = %body.platform_id))]
pub async fn personalized_caption(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CaptionBody>,
) -> JsonResult<CaptionResponse> {
    let template = platform(&state, &body.platform_id)?;
    if body.content.trim().is_empty() {
        return Err(RouteError::BadRequest(String::from("content must not be empty")));
    }

    let branch = state
        .store
        .branch(&body.branch_id)
        .await?
        .ok_or_else(|| RouteError::not_found("branch", body.branch_id))?;

    let pattern = user_pattern(state.store.as_ref(), body.user_id).await?;
    let request = caption_request(&CaptionContext {
        platform: template,
        branch: &branch,
        content: &body.content,
        pattern: &pattern,
        previous: &body.previous_captions,
    });

    let caption = state.completer.complete(&request).await?.trim().to_string();

    let stored = state
        .store
        .insert_caption(&NewCaption {
            user_id: body.user_id,
            review_id: body.review_id,
            platform_id: template.id.clone(),
            caption: caption.clone(),
        })
        .await;
    if let Err(e) = stored {
        tracing::error!(error = ?e, "failed to store generated caption");
    }

    let scores = CaptionScores::compute(&caption, template);
    Ok(Json(CaptionResponse {
        caption,
        pattern,
        scores,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
    pub text: String,
    pub platform_id: PlatformId,
}

#[instrument(skip(state, body), fields(platform = %body.platform_id))]
pub async fn score_caption(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScoreBody>,
) -> JsonResult<CaptionScores> {
    let template = platform(&state, &body.platform_id)?;
    Ok(Json(CaptionScores::compute(&body.text, template)))
}

const ANALYSIS_SYSTEM_PROMPT: &str = "You review customer-written store reviews. Answer with a \
    JSON object only: {\"sentiment\": \"positive\"|\"neutral\"|\"negative\", \
    \"quality_score\": number from 0 to 100, \"suggestions\": [short strings]}.";

#[derive(Debug, Deserialize)]
pub struct AnalysisBody {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAnalysis {
    pub sentiment: String,
    pub quality_score: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[instrument(skip(state, body))]
pub async fn review_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalysisBody>,
) -> JsonResult<ReviewAnalysis> {
    if body.content.trim().is_empty() {
        return Err(RouteError::BadRequest(String::from("content must not be empty")));
    }

    let request = CompletionRequest::new(ANALYSIS_SYSTEM_PROMPT, body.content, ANALYSIS_MAX_TOKENS);
    let analysis = complete_json(state.completer.as_ref(), &request).await?;

    Ok(Json(analysis))
}
