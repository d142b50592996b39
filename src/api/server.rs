use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::api::middleware::{self, MiddlewareErr};
use crate::constants::INVALID_QR_MESSAGE;
use crate::db::models::review::InvalidRating;
use crate::db::models::tracker::TransitionError;
use crate::db::prelude::*;
use crate::util::openai::{Completer, CompletionErr};
use crate::workflow::feed::TrackerFeed;
use crate::workflow::platform::PlatformRegistry;
use crate::workflow::points::AwardError;
use crate::workflow::wizard::WizardError;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

/// Shared handles, built once at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub completer: Arc<dyn Completer>,
    pub platforms: Arc<PlatformRegistry>,
    pub feed: TrackerFeed,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Response::new(Body::empty()) }))
        //
        // capture
        .route("/api/qr", get(resolve_qr))
        .route("/api/keywords", get(list_keywords))
        .route("/api/reviews", post(create_review))
        .route("/api/reviews/{id}", get(get_review))
        .route("/api/reviews/{id}/content", patch(update_review_content))
        //
        // completion-backed routes
        .route("/api/generate-review", post(generate_review))
        .route("/api/ai/personalized-caption", post(personalized_caption))
        .route("/api/ai/review-analysis", post(review_analysis))
        .route("/api/captions/score", post(score_caption))
        //
        // distribution and tracking
        .route("/api/platforms", get(list_platforms))
        .route("/api/publish-review", post(publish_review))
        .route("/api/trackers/feed", get(tracker_feed))
        .route("/api/trackers/{id}/shared", post(mark_shared))
        .route("/api/trackers/{id}/outcome", post(report_outcome))
        //
        // rewards
        .route("/api/points/award", post(award_points))
        .route("/api/users/{id}/points", get(user_points))
        .route("/api/users/{id}/trackers", get(user_trackers))
        .route("/api/users/{id}/gamification", get(user_gamification))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .with_state(state)
}

/// Logs any `RouteError` a handler left in the response extensions.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument(skip(state))]
pub async fn start_server(state: Arc<AppState>, port: u16) -> Result<(), ServerErr> {
    let app = app(state).layer(middleware::cors().await?);

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}", socket_addr.port()),
        "server ready"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum ServerErr {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Middleware(#[from] MiddlewareErr),
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    QueryError(#[from] PgError),

    /// Every QR failure carries the same body; only the status differs.
    #[error("invalid QR code ({0})")]
    InvalidQr(StatusCode),

    #[error("{0} '{1}' not found")]
    NotFound(&'static str, String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    InvalidRating(#[from] InvalidRating),

    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("unknown platform '{0}'")]
    UnknownPlatform(PlatformId),

    #[error(transparent)]
    Completion(#[from] CompletionErr),

    #[error(transparent)]
    Award(#[from] AwardError),
}

impl RouteError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        RouteError::NotFound(kind, id.to_string())
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message, err) = match &self {
            RouteError::QueryError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::InvalidQr(status) => (
                *status,
                String::from(INVALID_QR_MESSAGE),
                // lookup failures were already logged by the handler
                None,
            ),

            RouteError::NotFound(..) => (StatusCode::NOT_FOUND, self.to_string(), None),

            RouteError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone(), None),

            RouteError::InvalidRating(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),

            RouteError::UnknownPlatform(_) => (StatusCode::BAD_REQUEST, self.to_string(), None),

            RouteError::Wizard(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string(), None),

            RouteError::Transition(_) => (
                StatusCode::CONFLICT,
                String::from("invalid posting transition"),
                None,
            ),

            RouteError::Completion(err) => (
                StatusCode::BAD_GATEWAY,
                format!("completion failed: {err}"),
                Some(self),
            ),

            RouteError::Award(award_err) => match award_err {
                AwardError::UnknownPlatform(_) | AwardError::MissingParam(..) => {
                    (StatusCode::BAD_REQUEST, award_err.to_string(), None)
                }
                AwardError::Store(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                    Some(self),
                ),
            },
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
