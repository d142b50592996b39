use http::request::Parts as ReqParts;
use http::{HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::util::env::{EnvErr, Var};
use crate::var;

pub type MiddlewareResult<T> = core::result::Result<T, MiddlewareErr>;

#[derive(Debug, Error)]
pub enum MiddlewareErr {
    #[error(transparent)]
    EnvErr(#[from] EnvErr),
}

/// `CORS_ALLOW_ORIGINS` is either `*` or a comma separated list of origin suffixes.
pub async fn cors() -> MiddlewareResult<CorsLayer> {
    let cors_allowed = var!(Var::CorsAllowOrigins).await?;
    Ok(cors_layer(cors_allowed))
}

pub fn cors_layer(cors_allowed: &'static str) -> CorsLayer {
    let allowed = if cors_allowed.trim() == "*" {
        AllowOrigin::any()
    } else {
        let suffixes: Vec<&'static str> = cors_allowed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        AllowOrigin::predicate(move |org: &HeaderValue, _: &ReqParts| {
            suffixes
                .iter()
                .any(|suffix| org.as_bytes().ends_with(suffix.as_bytes()))
        })
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers(Any)
        .allow_origin(allowed)
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use http::{Request, header};
    use tower::ServiceExt;

    async fn origin_allowed(config: &'static str, origin: &str) -> bool {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(config));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        res.headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    }

    #[tokio::test]
    async fn test_cors_suffix_list() {
        let config = "reviewhub.kr, localhost:5173";
        assert!(origin_allowed(config, "https://app.reviewhub.kr").await);
        assert!(origin_allowed(config, "http://localhost:5173").await);
        assert!(!origin_allowed(config, "https://evil.example").await);
        assert!(origin_allowed("*", "https://evil.example").await);
    }
}
