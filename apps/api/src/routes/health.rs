use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which upstream providers have a key configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "career-api",
        "providers": {
            "gemini": config.gemini_api_key.is_some(),
            "newsapi": config.news_api_key.is_some(),
            "polygon": config.polygon_api_key.is_some()
        }
    }))
}
