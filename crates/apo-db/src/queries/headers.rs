//! Database query functions for the `apo_headers` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{ApoHeader, ApoStatus};

/// Insert a new header in DRAFT status with a zero total. Runs on an open
/// transaction so the draft generator can insert items and set the total
/// atomically.
pub async fn insert_header(
    conn: &mut PgConnection,
    plantation_id: Uuid,
    financial_year: &str,
    created_by: Option<Uuid>,
) -> Result<ApoHeader> {
    let header = sqlx::query_as::<_, ApoHeader>(
        "INSERT INTO apo_headers (plantation_id, financial_year, created_by) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(plantation_id)
    .bind(financial_year)
    .bind(created_by)
    .fetch_one(conn)
    .await
    .context("failed to insert APO header")?;

    Ok(header)
}

/// Set the header's sanctioned total. Only the draft generator calls this,
/// in the same transaction that created the header.
pub async fn set_header_total(
    conn: &mut PgConnection,
    id: Uuid,
    total_sanctioned_amount: f64,
) -> Result<ApoHeader> {
    let header = sqlx::query_as::<_, ApoHeader>(
        "UPDATE apo_headers \
         SET total_sanctioned_amount = $1, updated_at = now() \
         WHERE id = $2 \
         RETURNING *",
    )
    .bind(total_sanctioned_amount)
    .bind(id)
    .fetch_one(conn)
    .await
    .context("failed to set APO header total")?;

    Ok(header)
}

/// Fetch a header by its ID.
pub async fn get_header(pool: &PgPool, id: Uuid) -> Result<Option<ApoHeader>> {
    let header = sqlx::query_as::<_, ApoHeader>("SELECT * FROM apo_headers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch APO header")?;

    Ok(header)
}

/// List all headers, newest first.
pub async fn list_headers(pool: &PgPool) -> Result<Vec<ApoHeader>> {
    let headers =
        sqlx::query_as::<_, ApoHeader>("SELECT * FROM apo_headers ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
            .context("failed to list APO headers")?;

    Ok(headers)
}

/// List headers for one plantation, newest first.
pub async fn list_headers_for_plantation(
    pool: &PgPool,
    plantation_id: Uuid,
) -> Result<Vec<ApoHeader>> {
    let headers = sqlx::query_as::<_, ApoHeader>(
        "SELECT * FROM apo_headers WHERE plantation_id = $1 ORDER BY created_at DESC",
    )
    .bind(plantation_id)
    .fetch_all(pool)
    .await
    .context("failed to list APO headers for plantation")?;

    Ok(headers)
}

/// List a plantation's SANCTIONED headers (the ones whose items appear in
/// the estimates view).
pub async fn list_sanctioned_for_plantation(
    pool: &PgPool,
    plantation_id: Uuid,
) -> Result<Vec<ApoHeader>> {
    let headers = sqlx::query_as::<_, ApoHeader>(
        "SELECT * FROM apo_headers \
         WHERE plantation_id = $1 AND status = 'SANCTIONED' \
         ORDER BY created_at DESC",
    )
    .bind(plantation_id)
    .fetch_all(pool)
    .await
    .context("failed to list sanctioned APO headers")?;

    Ok(headers)
}

/// Atomically transition a header from one status to another.
///
/// Optimistic locking: the WHERE clause includes `status = $from`, so the
/// row only updates when the observed status still holds. Sanction stamps
/// `approved_by`. Returns the updated header, or `None` when the guard
/// did not match (missing row or lost race).
pub async fn transition_header_status(
    pool: &PgPool,
    id: Uuid,
    from: ApoStatus,
    to: ApoStatus,
    approved_by: Option<Uuid>,
) -> Result<Option<ApoHeader>> {
    let header = sqlx::query_as::<_, ApoHeader>(
        "UPDATE apo_headers \
         SET status = $1, \
             approved_by = COALESCE($2, approved_by), \
             updated_at = now() \
         WHERE id = $3 AND status = $4 \
         RETURNING *",
    )
    .bind(to)
    .bind(approved_by)
    .bind(id)
    .bind(from)
    .fetch_optional(pool)
    .await
    .context("failed to transition APO header status")?;

    Ok(header)
}
