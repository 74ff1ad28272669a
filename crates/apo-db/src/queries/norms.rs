//! Database query functions for the `norms_config` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Norm;

/// A norm joined with its activity's display fields.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct NormWithActivity {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub applicable_age: i32,
    pub species: Option<String>,
    pub standard_rate: f64,
    pub financial_year: String,
    pub activity_name: String,
    pub category: String,
    pub unit: String,
    pub ssr_no: Option<String>,
}

/// Insert a new norm. The partial unique indexes on `norms_config` reject a
/// second species-specific or species-agnostic row for the same
/// (activity, age, financial year).
pub async fn insert_norm(
    pool: &PgPool,
    activity_id: Uuid,
    applicable_age: i32,
    species: Option<&str>,
    standard_rate: f64,
    financial_year: &str,
) -> Result<Norm> {
    let norm = sqlx::query_as::<_, Norm>(
        "INSERT INTO norms_config (activity_id, applicable_age, species, standard_rate, financial_year) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(activity_id)
    .bind(applicable_age)
    .bind(species)
    .bind(standard_rate)
    .bind(financial_year)
    .fetch_one(pool)
    .await
    .context("failed to insert norm")?;

    Ok(norm)
}

/// List all norms for a financial year with activity details, for catalog
/// display.
pub async fn list_norms(pool: &PgPool, financial_year: &str) -> Result<Vec<NormWithActivity>> {
    let norms = sqlx::query_as::<_, NormWithActivity>(
        "SELECT n.id, n.activity_id, n.applicable_age, n.species, n.standard_rate, \
                n.financial_year, \
                a.name AS activity_name, a.category, a.unit, a.ssr_no \
         FROM norms_config n \
         JOIN activity_master a ON a.id = n.activity_id \
         WHERE n.financial_year = $1 \
         ORDER BY a.category, a.name, n.applicable_age",
    )
    .bind(financial_year)
    .fetch_all(pool)
    .await
    .context("failed to list norms")?;

    Ok(norms)
}

/// Fetch the candidate norms at an exact age for a plantation's species:
/// species-specific rows for `species` plus species-agnostic rows.
pub async fn candidates_at_age(
    pool: &PgPool,
    financial_year: &str,
    age: i32,
    species: &str,
) -> Result<Vec<NormWithActivity>> {
    let norms = sqlx::query_as::<_, NormWithActivity>(
        "SELECT n.id, n.activity_id, n.applicable_age, n.species, n.standard_rate, \
                n.financial_year, \
                a.name AS activity_name, a.category, a.unit, a.ssr_no \
         FROM norms_config n \
         JOIN activity_master a ON a.id = n.activity_id \
         WHERE n.financial_year = $1 \
           AND n.applicable_age = $2 \
           AND (n.species IS NULL OR n.species = $3) \
         ORDER BY a.category, a.name",
    )
    .bind(financial_year)
    .bind(age)
    .bind(species)
    .fetch_all(pool)
    .await
    .context("failed to fetch candidate norms")?;

    Ok(norms)
}

/// Find the greatest `applicable_age` strictly above zero and at or below
/// `age` that has any candidate norms for the species. Returns `None` when
/// no such age exists.
pub async fn nearest_lower_age(
    pool: &PgPool,
    financial_year: &str,
    age: i32,
    species: &str,
) -> Result<Option<i32>> {
    let row: (Option<i32>,) = sqlx::query_as(
        "SELECT MAX(applicable_age) \
         FROM norms_config \
         WHERE financial_year = $1 \
           AND applicable_age <= $2 \
           AND applicable_age > 0 \
           AND (species IS NULL OR species = $3)",
    )
    .bind(financial_year)
    .bind(age)
    .bind(species)
    .fetch_one(pool)
    .await
    .context("failed to find nearest lower norm age")?;

    Ok(row.0)
}
