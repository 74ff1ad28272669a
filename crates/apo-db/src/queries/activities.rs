//! Database query functions for the `activity_master` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Activity;

/// Insert a new activity. Returns the inserted row.
pub async fn insert_activity(
    pool: &PgPool,
    name: &str,
    category: &str,
    unit: &str,
    ssr_no: Option<&str>,
) -> Result<Activity> {
    let activity = sqlx::query_as::<_, Activity>(
        "INSERT INTO activity_master (name, category, unit, ssr_no) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(name)
    .bind(category)
    .bind(unit)
    .bind(ssr_no)
    .fetch_one(pool)
    .await
    .context("failed to insert activity")?;

    Ok(activity)
}

/// Fetch an activity by its ID.
pub async fn get_activity(pool: &PgPool, id: Uuid) -> Result<Option<Activity>> {
    let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activity_master WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch activity")?;

    Ok(activity)
}

/// List all activities, ordered by category then name.
pub async fn list_activities(pool: &PgPool) -> Result<Vec<Activity>> {
    let activities = sqlx::query_as::<_, Activity>(
        "SELECT * FROM activity_master ORDER BY category ASC, name ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list activities")?;

    Ok(activities)
}
