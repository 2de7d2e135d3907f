pub mod health;

use axum::{
    http::{request::Parts, HeaderValue, Method, Uri},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::errors::AppError;
use crate::extraction::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/extract/title", post(handlers::handle_extract_title))
        .route("/validate/title", post(handlers::handle_validate_title))
        .route("/generate/summary", post(handlers::handle_generate_summary))
        .route("/generate/tags", post(handlers::handle_generate_tags))
        .route("/extract/assets", post(handlers::handle_extract_assets))
        .route("/extract/platform", post(handlers::handle_extract_platform))
        .fallback(not_found)
        .with_state(state)
}

/// Configured origins plus any Vercel preview deployment.
pub fn is_allowed_origin(origin: &str, allowed: &[String]) -> bool {
    if allowed.iter().any(|a| a == origin) {
        return true;
    }
    origin
        .strip_prefix("https://")
        .and_then(|rest| rest.strip_suffix(".vercel.app"))
        .is_some_and(|sub| !sub.is_empty() && !sub.contains('/'))
}

/// Credentialed CORS, so origins and headers are echoed rather than wildcarded.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed = allowed_origins.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &Parts| {
                origin
                    .to_str()
                    .map(|o| is_allowed_origin(o, &allowed))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
