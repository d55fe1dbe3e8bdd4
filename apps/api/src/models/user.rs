use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A signed-up user. `external_id` is the identity provider's subject id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfileRow {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub current_title: Option<String>,
    pub skills: Vec<String>,
    pub target_role: Option<String>,
    pub created_at: DateTime<Utc>,
}
