//! Draft generation: turn a resolved norm set into a new APO header with
//! one line item per norm, priced at the standard rate.

use std::collections::HashMap;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use apo_db::models::{ApoHeader, ApoItem};
use apo_db::queries::{headers, items};

use crate::error::{CoreError, Result};
use crate::norms;

/// A freshly generated draft: the header plus its items.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApoDraft {
    pub header: ApoHeader,
    pub items: Vec<ApoItem>,
}

fn validate_quantity(activity_id: Uuid, qty: f64) -> Result<()> {
    if !qty.is_finite() || qty < 0.0 {
        return Err(CoreError::Validation(format!(
            "quantity {qty} for activity {activity_id} must be a non-negative number"
        )));
    }
    Ok(())
}

/// Generate a draft APO for a plantation and financial year.
///
/// One item per resolved norm. `quantities` maps activity id to the
/// caller's planned quantity; activities absent from the map default to
/// the plantation's total area. The header's `total_sanctioned_amount` is
/// the sum of the item costs and never changes afterwards.
///
/// Header and items are written in a single transaction. Deliberately not
/// idempotent: calling twice produces two independent drafts, and the
/// caller enforces any one-draft-per-year rule.
pub async fn generate_draft(
    pool: &PgPool,
    plantation_id: Uuid,
    financial_year: &str,
    quantities: &HashMap<Uuid, f64>,
    created_by: Option<Uuid>,
) -> Result<ApoDraft> {
    let resolved = norms::resolve(pool, plantation_id, financial_year).await?;

    if resolved.norms.is_empty() {
        return Err(CoreError::Validation(format!(
            "no norms applicable for plantation {} (age {}) in {financial_year}",
            resolved.plantation.name, resolved.age
        )));
    }

    // Reject quantities for activities the norm set does not cover, and
    // validate every quantity before the first write.
    for (activity_id, qty) in quantities {
        if !resolved.norms.iter().any(|n| n.activity_id == *activity_id) {
            return Err(CoreError::Validation(format!(
                "no applicable norm for activity {activity_id}"
            )));
        }
        validate_quantity(*activity_id, *qty)?;
    }

    let mut tx = pool
        .begin()
        .await
        .context("failed to begin draft transaction")?;

    let header =
        headers::insert_header(&mut *tx, plantation_id, financial_year, created_by).await?;

    let mut draft_items = Vec::with_capacity(resolved.norms.len());
    let mut total = 0.0;
    for norm in &resolved.norms {
        let qty = quantities
            .get(&norm.activity_id)
            .copied()
            .unwrap_or(resolved.plantation.total_area_ha);
        let item = items::insert_item(
            &mut *tx,
            header.id,
            norm.activity_id,
            &norm.activity_name,
            &norm.unit,
            qty,
            norm.standard_rate,
        )
        .await?;
        total += item.total_cost;
        draft_items.push(item);
    }

    let header = headers::set_header_total(&mut *tx, header.id, total).await?;

    tx.commit()
        .await
        .context("failed to commit draft transaction")?;

    tracing::info!(
        apo_id = %header.id,
        plantation = %plantation_id,
        financial_year,
        items = draft_items.len(),
        total_sanctioned_amount = total,
        "draft APO generated"
    );

    Ok(ApoDraft {
        header,
        items: draft_items,
    })
}
