//! Axum route handlers for job matching and career paths.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::matching::{rank_jobs, JobMatch};
use crate::jobs::queries::{get_user_profile, list_career_paths, list_recent_jobs};
use crate::models::career::CareerPathRow;
use crate::state::AppState;

/// Listings considered per match request.
const CANDIDATE_POOL: i64 = 200;
const DEFAULT_MATCHES: usize = 20;
const MAX_MATCHES: usize = 100;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub user_id: Uuid,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<JobMatch>,
}

/// GET /api/v1/jobs/match
///
/// Ranks recent job listings against the user's saved skills.
pub async fn handle_job_match(
    State(state): State<AppState>,
    Query(params): Query<MatchQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_MATCHES).clamp(1, MAX_MATCHES);

    let user = get_user_profile(&state.db, params.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", params.user_id)))?;

    let jobs = list_recent_jobs(&state.db, CANDIDATE_POOL).await?;

    Ok(Json(MatchResponse {
        matches: rank_jobs(&user.skills, jobs, limit),
    }))
}

/// GET /api/v1/careers
pub async fn handle_career_paths(
    State(state): State<AppState>,
) -> Result<Json<Vec<CareerPathRow>>, AppError> {
    let paths = list_career_paths(&state.db).await?;
    Ok(Json(paths))
}
