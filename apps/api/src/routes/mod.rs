pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::guidance::handlers as guidance;
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::trends::handlers as trends;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Trends API (NewsAPI + Polygon)
        .route("/api/v1/trends/news", get(trends::handle_news))
        .route("/api/v1/trends/stocks/:ticker", get(trends::handle_stock))
        .route("/api/v1/trends/market", get(trends::handle_market))
        // Guidance API (Gemini)
        .route("/api/v1/chat", post(guidance::handle_chat))
        .route(
            "/api/v1/resume/optimize",
            post(guidance::handle_resume_optimize),
        )
        .route("/api/v1/skills/gap", post(guidance::handle_skill_gap))
        // Jobs API (PostgreSQL)
        .route("/api/v1/jobs/match", get(jobs::handle_job_match))
        .route("/api/v1/careers", get(jobs::handle_career_paths))
        .with_state(state)
}
