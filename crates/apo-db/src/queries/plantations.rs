//! Database query functions for the `plantations` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Plantation;

/// Insert a new plantation row. Returns the inserted row with
/// server-generated defaults (id, created_at).
pub async fn insert_plantation(
    pool: &PgPool,
    name: &str,
    species: &str,
    year_of_planting: i32,
    total_area_ha: f64,
) -> Result<Plantation> {
    let plantation = sqlx::query_as::<_, Plantation>(
        "INSERT INTO plantations (name, species, year_of_planting, total_area_ha) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(name)
    .bind(species)
    .bind(year_of_planting)
    .bind(total_area_ha)
    .fetch_one(pool)
    .await
    .context("failed to insert plantation")?;

    Ok(plantation)
}

/// Fetch a plantation by its ID.
pub async fn get_plantation(pool: &PgPool, id: Uuid) -> Result<Option<Plantation>> {
    let plantation = sqlx::query_as::<_, Plantation>("SELECT * FROM plantations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plantation")?;

    Ok(plantation)
}

/// List all plantations, ordered by name.
pub async fn list_plantations(pool: &PgPool) -> Result<Vec<Plantation>> {
    let plantations =
        sqlx::query_as::<_, Plantation>("SELECT * FROM plantations ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .context("failed to list plantations")?;

    Ok(plantations)
}
