use sqlx::PgPool;
use uuid::Uuid;

use crate::models::career::CareerPathRow;
use crate::models::job::JobListingRow;
use crate::models::user::UserProfileRow;

pub async fn get_user_profile(
    pool: &PgPool,
    user_id: Uuid,
) -> sqlx::Result<Option<UserProfileRow>> {
    let user = sqlx::query_as::<_, UserProfileRow>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Most recently posted listings first.
pub async fn list_recent_jobs(pool: &PgPool, limit: i64) -> sqlx::Result<Vec<JobListingRow>> {
    let jobs = sqlx::query_as::<_, JobListingRow>(
        "SELECT * FROM job_listings ORDER BY posted_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(jobs)
}

pub async fn list_career_paths(pool: &PgPool) -> sqlx::Result<Vec<CareerPathRow>> {
    let paths = sqlx::query_as::<_, CareerPathRow>("SELECT * FROM career_paths ORDER BY title")
        .fetch_all(pool)
        .await?;
    Ok(paths)
}
