//! Resume review and skill-gap analysis on top of the chat provider.
//!
//! The model drafts the content; everything derived from it (score bounds,
//! matched vs missing skills, readiness) is computed here so it stays
//! deterministic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::guidance::prompts::{
    JOB_DESCRIPTION_BLOCK, JSON_ONLY_SYSTEM, RESUME_REVIEW_PROMPT, SKILL_GAP_PROMPT,
};
use crate::providers::chat::{ChatClient, ChatMessage};

const MAX_RESUME_CHARS: usize = 20_000;
const MAX_SKILLS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ResumeReviewRequest {
    pub resume_text: String,
    pub target_role: String,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeReview {
    pub score: u32,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SkillGapRequest {
    pub current_skills: Vec<String>,
    pub target_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredSkill {
    pub name: String,
    pub importance: Importance,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SkillGapDraft {
    #[serde(default)]
    required_skills: Vec<RequiredSkill>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillGapReport {
    pub target_role: String,
    pub matched_skills: Vec<String>,
    /// Ordered by importance, most important first.
    pub missing_skills: Vec<RequiredSkill>,
    /// Share of required skills already held, 0 – 100.
    pub readiness: u32,
    pub summary: String,
}

pub async fn review_resume(
    chat: &ChatClient,
    request: &ResumeReviewRequest,
) -> Result<ResumeReview, AppError> {
    let resume_text = request.resume_text.trim();
    if resume_text.is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if resume_text.chars().count() > MAX_RESUME_CHARS {
        return Err(AppError::Validation(format!(
            "resume_text must be at most {MAX_RESUME_CHARS} characters"
        )));
    }
    let target_role = require_role(&request.target_role)?;

    let job_description_block = request
        .job_description
        .as_deref()
        .map(str::trim)
        .filter(|jd| !jd.is_empty())
        .map(|jd| JOB_DESCRIPTION_BLOCK.replace("{job_description}", jd))
        .unwrap_or_default();

    let prompt = RESUME_REVIEW_PROMPT
        .replace("{target_role}", target_role)
        .replace("{job_description_block}", &job_description_block)
        .replace("{resume_text}", resume_text);

    let review: ResumeReview = chat
        .complete_json(&[ChatMessage::system(JSON_ONLY_SYSTEM), ChatMessage::user(prompt)])
        .await?;

    Ok(normalize_review(review))
}

pub async fn analyze_skill_gap(
    chat: &ChatClient,
    request: &SkillGapRequest,
) -> Result<SkillGapReport, AppError> {
    let target_role = require_role(&request.target_role)?;
    if request.current_skills.len() > MAX_SKILLS {
        return Err(AppError::Validation(format!(
            "at most {MAX_SKILLS} current skills are accepted"
        )));
    }
    let current_skills = clean_skills(&request.current_skills);

    let listed = if current_skills.is_empty() {
        "none listed".to_string()
    } else {
        current_skills.join(", ")
    };
    let prompt = SKILL_GAP_PROMPT
        .replace("{target_role}", target_role)
        .replace("{current_skills}", &listed);

    let draft: SkillGapDraft = chat
        .complete_json(&[ChatMessage::system(JSON_ONLY_SYSTEM), ChatMessage::user(prompt)])
        .await?;

    Ok(build_gap_report(target_role, &current_skills, draft))
}

fn require_role(raw: &str) -> Result<&str, AppError> {
    let role = raw.trim();
    if role.is_empty() {
        return Err(AppError::Validation("target_role cannot be empty".to_string()));
    }
    if role.chars().count() > 120 {
        return Err(AppError::Validation(
            "target_role must be at most 120 characters".to_string(),
        ));
    }
    Ok(role)
}

/// Trims, drops blanks and case-insensitive duplicates, keeps first spelling.
pub fn clean_skills(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn normalize_review(mut review: ResumeReview) -> ResumeReview {
    review.score = review.score.min(100);
    review.strengths = clean_skills(&review.strengths);
    review.improvements = clean_skills(&review.improvements);
    review.missing_keywords = clean_skills(&review.missing_keywords);
    review
}

fn build_gap_report(
    target_role: &str,
    current_skills: &[String],
    draft: SkillGapDraft,
) -> SkillGapReport {
    let held: HashSet<String> = current_skills.iter().map(|s| s.to_lowercase()).collect();

    let mut seen = HashSet::new();
    let required: Vec<RequiredSkill> = draft
        .required_skills
        .into_iter()
        .filter(|s| !s.name.trim().is_empty())
        .filter(|s| seen.insert(s.name.trim().to_lowercase()))
        .collect();
    let total = required.len();

    let (matched, mut missing): (Vec<RequiredSkill>, Vec<RequiredSkill>) = required
        .into_iter()
        .partition(|s| held.contains(&s.name.trim().to_lowercase()));
    missing.sort_by_key(|s| s.importance);

    let readiness = if total == 0 {
        0
    } else {
        (matched.len() * 100 / total) as u32
    };

    SkillGapReport {
        target_role: target_role.to_string(),
        matched_skills: matched.into_iter().map(|s| s.name).collect(),
        missing_skills: missing,
        readiness,
        summary: draft.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> SkillGapDraft {
        serde_json::from_value(json!({
            "required_skills": [
                {"name": "Terraform", "importance": "medium", "resources": ["Terraform Up & Running"]},
                {"name": "Kubernetes", "importance": "high"},
                {"name": "Python", "importance": "high"},
                {"name": "python", "importance": "low"},
                {"name": "Go", "importance": "low"}
            ],
            "summary": "Focus on orchestration."
        }))
        .unwrap()
    }

    #[test]
    fn test_gap_report_partitions_skills() {
        let current = clean_skills(&["python ".to_string(), "Go".to_string()]);
        let report = build_gap_report("SRE", &current, draft());

        assert_eq!(report.matched_skills, vec!["Python", "Go"]);
        let missing: Vec<&str> = report.missing_skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(missing, vec!["Kubernetes", "Terraform"]);
        assert_eq!(report.readiness, 50);
    }

    #[test]
    fn test_gap_report_with_no_required_skills() {
        let draft = SkillGapDraft {
            required_skills: vec![],
            summary: String::new(),
        };
        let report = build_gap_report("SRE", &[], draft);
        assert_eq!(report.readiness, 0);
        assert!(report.missing_skills.is_empty());
    }

    #[test]
    fn test_clean_skills_dedupes_case_insensitively() {
        let skills = vec![
            "Rust".to_string(),
            " rust".to_string(),
            "".to_string(),
            "SQL".to_string(),
        ];
        assert_eq!(clean_skills(&skills), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_review_score_is_capped() {
        let review = normalize_review(ResumeReview {
            score: 140,
            summary: "Good".into(),
            strengths: vec!["Impact".into(), "impact".into()],
            improvements: vec![],
            missing_keywords: vec![],
        });
        assert_eq!(review.score, 100);
        assert_eq!(review.strengths, vec!["Impact"]);
    }

    #[test]
    fn test_role_validation() {
        assert!(require_role("  ").is_err());
        assert!(require_role(&"x".repeat(121)).is_err());
        assert_eq!(require_role(" Data Engineer ").unwrap(), "Data Engineer");
    }
}
