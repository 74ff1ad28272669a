//! Header-level approval chain: Range Officer submits, the Division
//! Manager forwards or rejects, Head Office sanctions or rejects.
//!
//! ```text
//! DRAFT               -> PENDING_DM_APPROVAL   (range officer)
//! PENDING_DM_APPROVAL -> PENDING_HO_APPROVAL   (division manager)
//! PENDING_DM_APPROVAL -> REJECTED              (division manager)
//! PENDING_HO_APPROVAL -> SANCTIONED            (head office)
//! PENDING_HO_APPROVAL -> REJECTED              (head office)
//! REJECTED            -> DRAFT                 (range officer, to revise)
//! ```
//!
//! `total_sanctioned_amount` is written at draft generation and never
//! recomputed here; the sanctioned quantities and rates are immutable, so
//! the sum at sanction time equals the draft-time sum.

use sqlx::PgPool;
use uuid::Uuid;

use apo_db::models::{ApoHeader, ApoStatus, Role};
use apo_db::queries::headers;

use crate::error::{CoreError, Result};

/// Valid target statuses from a given header status.
pub fn valid_targets(from: ApoStatus) -> &'static [ApoStatus] {
    use ApoStatus::{Draft, PendingDmApproval, PendingHoApproval, Rejected, Sanctioned};
    match from {
        Draft => &[PendingDmApproval],
        PendingDmApproval => &[PendingHoApproval, Rejected],
        PendingHoApproval => &[Sanctioned, Rejected],
        Sanctioned => &[],
        Rejected => &[Draft],
    }
}

/// The single role entitled to drive a given edge, or `None` when the
/// edge is not in the graph.
pub fn required_role(from: ApoStatus, to: ApoStatus) -> Option<Role> {
    use ApoStatus::{Draft, PendingDmApproval, PendingHoApproval, Rejected, Sanctioned};
    match (from, to) {
        (Draft, PendingDmApproval) | (Rejected, Draft) => Some(Role::RangeOfficer),
        (PendingDmApproval, PendingHoApproval) | (PendingDmApproval, Rejected) => {
            Some(Role::DivisionManager)
        }
        (PendingHoApproval, Sanctioned) | (PendingHoApproval, Rejected) => Some(Role::HeadOffice),
        _ => None,
    }
}

/// Move a header through the approval chain.
///
/// Sanctioning stamps `approved_by` with `actor`. Optimistically locked on
/// the observed status; a lost race surfaces as [`CoreError::Conflict`].
pub async fn change_header_status(
    pool: &PgPool,
    apo_id: Uuid,
    target: ApoStatus,
    role: Role,
    actor: Option<Uuid>,
) -> Result<ApoHeader> {
    let header = headers::get_header(pool, apo_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("APO {apo_id}")))?;

    let Some(required) = required_role(header.status, target) else {
        let targets = valid_targets(header.status)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CoreError::Forbidden(format!(
            "invalid transition from {} to {target}; valid targets: {}",
            header.status,
            if targets.is_empty() { "none".to_owned() } else { targets }
        )));
    };

    if role != required {
        return Err(CoreError::Forbidden(format!(
            "only {required} may move an APO from {} to {target}",
            header.status
        )));
    }

    let approved_by = if target == ApoStatus::Sanctioned {
        actor
    } else {
        None
    };

    match headers::transition_header_status(pool, apo_id, header.status, target, approved_by)
        .await?
    {
        Some(updated) => {
            tracing::info!(
                apo = %apo_id,
                from = %header.status,
                to = %target,
                %role,
                "APO status changed"
            );
            Ok(updated)
        }
        None => match headers::get_header(pool, apo_id).await? {
            None => Err(CoreError::NotFound(format!("APO {apo_id}"))),
            Some(current) => Err(CoreError::Conflict(format!(
                "APO {apo_id} moved to {} while the transition was in flight",
                current.status
            ))),
        },
    }
}
