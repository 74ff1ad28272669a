//! The estimate ledger: quantity revision under the budget ceiling, and
//! the sanctioned-estimates view.
//!
//! The invariant enforced here is the system's central one: for every
//! header, the sum of `(revised_qty ?? sanctioned_qty) * sanctioned_rate`
//! over its items never exceeds the header's `total_sanctioned_amount`.
//! The check runs against the live sibling set under row locks, so two
//! concurrent revisions on siblings of the same header serialize instead
//! of jointly overshooting the ceiling.

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use apo_db::models::{ApoItem, EstimateStatus, Role};
use apo_db::queries::{headers, items, plantations};

use crate::error::{CoreError, Result};

/// Compute the total cost of a header's items as it would stand after
/// setting the target item's quantity to `new_qty`: the target is priced
/// at `new_qty * rate`, every sibling at its current effective cost.
pub fn prospective_total(items: &[ApoItem], target_id: Uuid, new_qty: f64) -> f64 {
    items
        .iter()
        .map(|item| {
            if item.id == target_id {
                new_qty * item.sanctioned_rate
            } else {
                item.effective_cost()
            }
        })
        .sum()
}

fn check_revision_role(role: Role, status: EstimateStatus) -> Result<()> {
    if role == Role::PlantationSupervisor {
        return Err(CoreError::Forbidden(
            "supervisors cannot edit quantities; only approval is allowed".to_owned(),
        ));
    }
    if role == Role::CaseWorkerEstimates
        && !matches!(status, EstimateStatus::Draft | EstimateStatus::Rejected)
    {
        return Err(CoreError::Forbidden(
            "cannot edit items that are already submitted or approved".to_owned(),
        ));
    }
    Ok(())
}

/// Revise an item's quantity, enforcing the budget ceiling.
///
/// Preconditions, first failure wins: the item exists; the quantity is a
/// non-negative number; the role may edit (supervisors never, case
/// workers only DRAFT or REJECTED items); the prospective header total
/// stays at or under `total_sanctioned_amount`.
///
/// A successful revision writes only `revised_qty`. The estimate status
/// is untouched: editing a rejected item does not implicitly resubmit it.
pub async fn revise_quantity(
    pool: &PgPool,
    item_id: Uuid,
    new_qty: f64,
    role: Role,
) -> Result<ApoItem> {
    let item = items::get_item(pool, item_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("APO item {item_id}")))?;

    if !new_qty.is_finite() || new_qty < 0.0 {
        return Err(CoreError::Validation(format!(
            "revised quantity {new_qty} must be a non-negative number"
        )));
    }

    check_revision_role(role, item.estimate_status)?;

    let header = headers::get_header(pool, item.apo_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("APO header {}", item.apo_id)))?;

    let mut tx = pool
        .begin()
        .await
        .context("failed to begin revision transaction")?;

    // Lock the full sibling set so the budget check sees live rows and a
    // concurrent revision on a sibling waits for this one to commit.
    let siblings = items::lock_items_for_header(&mut *tx, item.apo_id).await?;
    let locked = siblings
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| CoreError::NotFound(format!("APO item {item_id}")))?;

    // Re-check the state gate on the locked row; the status may have moved
    // between the unlocked read and the lock.
    check_revision_role(role, locked.estimate_status)?;

    let attempted = prospective_total(&siblings, item_id, new_qty);
    if attempted > header.total_sanctioned_amount {
        return Err(CoreError::BudgetExceeded {
            attempted,
            ceiling: header.total_sanctioned_amount,
        });
    }

    let updated = items::set_revised_qty(&mut *tx, item_id, new_qty).await?;

    tx.commit()
        .await
        .context("failed to commit revision transaction")?;

    tracing::info!(
        item = %item_id,
        apo = %item.apo_id,
        revised_qty = new_qty,
        prospective_total = attempted,
        ceiling = header.total_sanctioned_amount,
        "quantity revised"
    );

    Ok(updated)
}

/// List the estimate items of a plantation's SANCTIONED headers.
pub async fn list_estimates(pool: &PgPool, plantation_id: Uuid) -> Result<Vec<ApoItem>> {
    plantations::get_plantation(pool, plantation_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("plantation {plantation_id}")))?;

    let sanctioned = headers::list_sanctioned_for_plantation(pool, plantation_id).await?;

    let mut estimates = Vec::new();
    for header in &sanctioned {
        estimates.extend(items::list_items_for_header(pool, header.id).await?);
    }
    Ok(estimates)
}
