//! Database query functions for the `apo_items` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{ApoItem, EstimateStatus};

/// Insert a line item. Runs on the draft generator's transaction.
/// `total_cost` is computed in SQL from the sanctioned quantity and rate.
pub async fn insert_item(
    conn: &mut PgConnection,
    apo_id: Uuid,
    activity_id: Uuid,
    activity_name: &str,
    unit: &str,
    sanctioned_qty: f64,
    sanctioned_rate: f64,
) -> Result<ApoItem> {
    let item = sqlx::query_as::<_, ApoItem>(
        "INSERT INTO apo_items (apo_id, activity_id, activity_name, unit, sanctioned_qty, sanctioned_rate, total_cost) \
         VALUES ($1, $2, $3, $4, $5, $6, $5 * $6) \
         RETURNING *",
    )
    .bind(apo_id)
    .bind(activity_id)
    .bind(activity_name)
    .bind(unit)
    .bind(sanctioned_qty)
    .bind(sanctioned_rate)
    .fetch_one(conn)
    .await
    .context("failed to insert APO item")?;

    Ok(item)
}

/// Fetch a single item by ID.
pub async fn get_item(pool: &PgPool, id: Uuid) -> Result<Option<ApoItem>> {
    let item = sqlx::query_as::<_, ApoItem>("SELECT * FROM apo_items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch APO item")?;

    Ok(item)
}

/// List all items under a header, in creation order.
pub async fn list_items_for_header(pool: &PgPool, apo_id: Uuid) -> Result<Vec<ApoItem>> {
    let items = sqlx::query_as::<_, ApoItem>(
        "SELECT * FROM apo_items WHERE apo_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(apo_id)
    .fetch_all(pool)
    .await
    .context("failed to list items for APO header")?;

    Ok(items)
}

/// Lock and return every item under a header inside the caller's
/// transaction. `FOR UPDATE` serializes concurrent budget checks on
/// siblings of the same header.
pub async fn lock_items_for_header(
    conn: &mut PgConnection,
    apo_id: Uuid,
) -> Result<Vec<ApoItem>> {
    let items = sqlx::query_as::<_, ApoItem>(
        "SELECT * FROM apo_items \
         WHERE apo_id = $1 \
         ORDER BY created_at ASC, id ASC \
         FOR UPDATE",
    )
    .bind(apo_id)
    .fetch_all(conn)
    .await
    .context("failed to lock items for APO header")?;

    Ok(items)
}

/// Write a revised quantity. Runs inside the revision transaction, after
/// the budget check has passed under the sibling lock.
pub async fn set_revised_qty(
    conn: &mut PgConnection,
    item_id: Uuid,
    revised_qty: f64,
) -> Result<ApoItem> {
    let item = sqlx::query_as::<_, ApoItem>(
        "UPDATE apo_items SET revised_qty = $1 WHERE id = $2 RETURNING *",
    )
    .bind(revised_qty)
    .bind(item_id)
    .fetch_one(conn)
    .await
    .context("failed to set revised quantity")?;

    Ok(item)
}

/// Atomically transition an item's estimate status.
///
/// Optimistic locking: only updates when the observed status still holds.
/// Returns the updated item, or `None` when the guard did not match.
pub async fn transition_estimate_status(
    pool: &PgPool,
    item_id: Uuid,
    from: EstimateStatus,
    to: EstimateStatus,
) -> Result<Option<ApoItem>> {
    let item = sqlx::query_as::<_, ApoItem>(
        "UPDATE apo_items \
         SET estimate_status = $1 \
         WHERE id = $2 AND estimate_status = $3 \
         RETURNING *",
    )
    .bind(to)
    .bind(item_id)
    .bind(from)
    .fetch_optional(pool)
    .await
    .context("failed to transition estimate status")?;

    Ok(item)
}
