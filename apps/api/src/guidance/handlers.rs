//! Axum route handlers for the guidance API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::guidance::analysis::{
    analyze_skill_gap, review_resume, ResumeReview, ResumeReviewRequest, SkillGapReport,
    SkillGapRequest,
};
use crate::guidance::prompts::CAREER_COACH_SYSTEM;
use crate::providers::chat::{build_request_body, ChatMessage, ChatRole};
use crate::state::AppState;

const MAX_CHAT_TURNS: usize = 40;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/v1/chat
///
/// Continues a coaching conversation. Client-supplied system messages are
/// dropped; the coaching persona is always prepended server-side.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.messages.is_empty() {
        return Err(AppError::Validation("messages cannot be empty".to_string()));
    }
    if request.messages.len() > MAX_CHAT_TURNS {
        return Err(AppError::Validation(format!(
            "at most {MAX_CHAT_TURNS} messages are accepted"
        )));
    }

    let messages: Vec<ChatMessage> = std::iter::once(ChatMessage::system(CAREER_COACH_SYSTEM))
        .chain(
            request
                .messages
                .into_iter()
                .filter(|m| m.role != ChatRole::System),
        )
        .collect();

    // Malformed conversations are the caller's fault, not the provider's.
    build_request_body(&messages).map_err(|e| AppError::Validation(e.message().to_string()))?;

    let reply = state.chat.complete(&messages).await?;
    Ok(Json(ChatResponse { reply }))
}

/// POST /api/v1/resume/optimize
pub async fn handle_resume_optimize(
    State(state): State<AppState>,
    Json(request): Json<ResumeReviewRequest>,
) -> Result<Json<ResumeReview>, AppError> {
    let review = review_resume(&state.chat, &request).await?;
    Ok(Json(review))
}

/// POST /api/v1/skills/gap
pub async fn handle_skill_gap(
    State(state): State<AppState>,
    Json(request): Json<SkillGapRequest>,
) -> Result<Json<SkillGapReport>, AppError> {
    let report = analyze_skill_gap(&state.chat, &request).await?;
    Ok(Json(report))
}
