use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Reports whether the LLM backend is configured ("healthy") or the service
/// answers from fallbacks only ("mock").
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let status = if state.composer.is_mock_mode() {
        "mock"
    } else {
        "healthy"
    };

    Json(json!({
        "status": status,
        "provider": state.config.provider.as_str(),
        "model": state.config.model_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
