//! Job matching: ranks job listings by how many of their required skills a
//! user already has.
//!
//! Algorithm:
//! 1. Skills are compared case-insensitively after trimming.
//! 2. score = matched required skills / required skills × 100 (0 when a
//!    listing names no skills).
//! 3. Sort by score descending, then newest posting first; truncate.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::job::JobListingRow;

#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job: JobListingRow,
    pub score: u32, // 0 – 100
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

pub fn rank_jobs(user_skills: &[String], jobs: Vec<JobListingRow>, limit: usize) -> Vec<JobMatch> {
    let held: HashSet<String> = user_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut matches: Vec<JobMatch> = jobs
        .into_iter()
        .map(|job| score_job(&held, job))
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.job.posted_at.cmp(&a.job.posted_at))
    });
    matches.truncate(limit);
    matches
}

fn score_job(held: &HashSet<String>, job: JobListingRow) -> JobMatch {
    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = job
        .required_skills
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .partition(|s| held.contains(&s.to_lowercase()));

    let total = matched_skills.len() + missing_skills.len();
    let score = if total == 0 {
        0
    } else {
        (matched_skills.len() * 100 / total) as u32
    };

    JobMatch {
        job,
        score,
        matched_skills,
        missing_skills,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn job(title: &str, skills: &[&str], day: u32) -> JobListingRow {
        JobListingRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: None,
            description: String::new(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            salary_min: None,
            salary_max: None,
            remote: true,
            posted_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
        }
    }

    fn skills(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_match_scores_100() {
        let jobs = vec![job("Backend", &["rust", "sql"], 1)];
        let ranked = rank_jobs(&skills(&["Rust", "SQL"]), jobs, 10);
        assert_eq!(ranked[0].score, 100);
        assert!(ranked[0].missing_skills.is_empty());
    }

    #[test]
    fn test_partial_match_lists_missing() {
        let ranked = rank_jobs(
            &skills(&["Python"]),
            vec![job("Data", &["Python", "Spark", "Airflow", "SQL"], 1)],
            10,
        );
        assert_eq!(ranked[0].score, 25);
        assert_eq!(ranked[0].matched_skills, vec!["Python"]);
        assert_eq!(ranked[0].missing_skills, vec!["Spark", "Airflow", "SQL"]);
    }

    #[test]
    fn test_ordering_by_score_then_recency() {
        let jobs = vec![
            job("Old full", &["Go"], 1),
            job("Half", &["Go", "K8s"], 5),
            job("New full", &["go"], 3),
            job("No skills listed", &[], 9),
        ];
        let ranked = rank_jobs(&skills(&["Go"]), jobs, 3);

        let titles: Vec<&str> = ranked.iter().map(|m| m.job.title.as_str()).collect();
        assert_eq!(titles, vec!["New full", "Old full", "Half"]);
    }

    #[test]
    fn test_no_user_skills_scores_zero() {
        let ranked = rank_jobs(&[], vec![job("Any", &["Rust"], 1)], 10);
        assert_eq!(ranked[0].score, 0);
    }
}
