//! Item-level estimate state machine.
//!
//! The transition graph:
//!
//! ```text
//! DRAFT     -> SUBMITTED            (case worker)
//! REJECTED  -> SUBMITTED            (case worker, after editing)
//! SUBMITTED -> APPROVED | REJECTED  (supervisor)
//! ```
//!
//! APPROVED is terminal. The rules live in one closed lookup table,
//! `allowed_sources`, so the gate is testable without a database.

use sqlx::PgPool;
use uuid::Uuid;

use apo_db::models::{ApoItem, EstimateStatus, Role};
use apo_db::queries::items;

use crate::error::{CoreError, Result};

/// The source states from which `role` may move an item to `target`.
/// `None` means the (role, target) pair is never permitted.
pub fn allowed_sources(role: Role, target: EstimateStatus) -> Option<&'static [EstimateStatus]> {
    use EstimateStatus::{Approved, Draft, Rejected, Submitted};
    match (role, target) {
        (Role::CaseWorkerEstimates, Submitted) => Some(&[Draft, Rejected]),
        (Role::PlantationSupervisor, Approved | Rejected) => Some(&[Submitted]),
        _ => None,
    }
}

/// Move an item's estimate status, enforcing the role/state rule table.
///
/// Executes with optimistic locking: the UPDATE is guarded on the status
/// observed here, and a lost race surfaces as [`CoreError::Conflict`].
/// Only `estimate_status` changes; no budget recomputation is triggered.
pub async fn change_status(
    pool: &PgPool,
    item_id: Uuid,
    target: EstimateStatus,
    role: Role,
) -> Result<ApoItem> {
    let item = items::get_item(pool, item_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("APO item {item_id}")))?;

    let sources = allowed_sources(role, target).ok_or_else(|| {
        CoreError::Forbidden(format!("role {role} may not move items to {target}"))
    })?;

    if !sources.contains(&item.estimate_status) {
        return Err(CoreError::Forbidden(format!(
            "{role} cannot move an item from {} to {target}",
            item.estimate_status
        )));
    }

    match items::transition_estimate_status(pool, item_id, item.estimate_status, target).await? {
        Some(updated) => {
            tracing::info!(
                item = %item_id,
                from = %item.estimate_status,
                to = %target,
                %role,
                "estimate status changed"
            );
            Ok(updated)
        }
        None => {
            // Either the item vanished or the status moved under us.
            match items::get_item(pool, item_id).await? {
                None => Err(CoreError::NotFound(format!("APO item {item_id}"))),
                Some(current) => Err(CoreError::Conflict(format!(
                    "item {item_id} moved to {} while the transition was in flight",
                    current.estimate_status
                ))),
            }
        }
    }
}
