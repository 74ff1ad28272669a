use std::collections::HashMap;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use apo_core::{approval, draft};
use apo_db::models::{ApoStatus, Role};
use apo_db::queries::{headers, items};

use crate::ApoCommands;
use crate::plantation_cmds::parse_uuid;

/// Parse repeated `--qty <activity-id>=<qty>` flags into an override map.
fn parse_quantities(raw: &[String]) -> anyhow::Result<HashMap<Uuid, f64>> {
    let mut quantities = HashMap::new();
    for entry in raw {
        let (id_part, qty_part) = entry
            .split_once('=')
            .with_context(|| format!("expected <activity-id>=<qty>, got: {entry}"))?;
        let activity_id = parse_uuid(id_part.trim(), "activity")?;
        let qty: f64 = qty_part
            .trim()
            .parse()
            .with_context(|| format!("invalid quantity in: {entry}"))?;
        quantities.insert(activity_id, qty);
    }
    Ok(quantities)
}

pub async fn run_draft(
    pool: &PgPool,
    plantation_id: &str,
    financial_year: &str,
    raw_quantities: &[String],
    created_by: Option<&str>,
) -> anyhow::Result<()> {
    let plantation_id = parse_uuid(plantation_id, "plantation")?;
    let quantities = parse_quantities(raw_quantities)?;
    let created_by = created_by
        .map(|s| parse_uuid(s, "user"))
        .transpose()?;

    let apo_draft =
        draft::generate_draft(pool, plantation_id, financial_year, &quantities, created_by)
            .await?;

    println!(
        "Draft APO {} created for {} ({} items, total {:.2})",
        apo_draft.header.id,
        apo_draft.header.financial_year,
        apo_draft.items.len(),
        apo_draft.header.total_sanctioned_amount
    );
    for item in &apo_draft.items {
        println!(
            "  {:<30} {:>10.2} x {:>10.2} = {:>12.2}",
            item.activity_name, item.sanctioned_qty, item.sanctioned_rate, item.total_cost
        );
    }
    Ok(())
}

pub async fn run_apo_command(command: ApoCommands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        ApoCommands::List { plantation } => {
            let all = match plantation {
                Some(p) => {
                    let plantation_id = parse_uuid(&p, "plantation")?;
                    headers::list_headers_for_plantation(pool, plantation_id).await?
                }
                None => headers::list_headers(pool).await?,
            };
            if all.is_empty() {
                println!("No APO headers.");
                return Ok(());
            }
            println!(
                "{:<38} {:<10} {:<22} {:>14}",
                "ID", "FY", "STATUS", "SANCTIONED"
            );
            for h in all {
                println!(
                    "{:<38} {:<10} {:<22} {:>14.2}",
                    h.id, h.financial_year, h.status, h.total_sanctioned_amount
                );
            }
        }
        ApoCommands::Show { apo_id } => {
            let apo_id = parse_uuid(&apo_id, "APO")?;
            let header = headers::get_header(pool, apo_id)
                .await?
                .with_context(|| format!("APO {apo_id} not found"))?;
            println!("APO {} ({})", header.id, header.financial_year);
            println!("  status: {}", header.status);
            println!("  sanctioned: {:.2}", header.total_sanctioned_amount);
            let item_rows = items::list_items_for_header(pool, apo_id).await?;
            for item in item_rows {
                println!(
                    "  {:<38} {:<30} {:>10.2} -> {:>10.2} [{}]",
                    item.id,
                    item.activity_name,
                    item.sanctioned_qty,
                    item.effective_qty(),
                    item.estimate_status
                );
            }
        }
        ApoCommands::Status {
            apo_id,
            status,
            role,
            actor,
        } => {
            let apo_id = parse_uuid(&apo_id, "APO")?;
            let target: ApoStatus = status.parse()?;
            let role: Role = role.parse()?;
            let actor = actor.map(|s| parse_uuid(&s, "user")).transpose()?;

            let header = approval::change_header_status(pool, apo_id, target, role, actor).await?;
            println!("APO {} is now {}", header.id, header.status);
        }
    }
    Ok(())
}
