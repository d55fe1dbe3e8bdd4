use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CareerPathRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub core_skills: Vec<String>,
    pub median_salary: Option<i32>,
    /// Free text such as "much faster than average".
    pub growth_outlook: Option<String>,
    pub created_at: DateTime<Utc>,
}
