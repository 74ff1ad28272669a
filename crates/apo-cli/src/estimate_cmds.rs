use sqlx::PgPool;

use apo_core::{ledger, transition};
use apo_db::models::{EstimateStatus, Role};

use crate::EstimateCommands;
use crate::plantation_cmds::parse_uuid;

async fn change_status(
    pool: &PgPool,
    item_id: &str,
    target: EstimateStatus,
    role: &str,
) -> anyhow::Result<()> {
    let item_id = parse_uuid(item_id, "item")?;
    let role: Role = role.parse()?;
    let item = transition::change_status(pool, item_id, target, role).await?;
    println!("Item {} is now {}", item.id, item.estimate_status);
    Ok(())
}

pub async fn run_estimate_command(command: EstimateCommands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        EstimateCommands::List { plantation_id } => {
            let plantation_id = parse_uuid(&plantation_id, "plantation")?;
            let estimates = ledger::list_estimates(pool, plantation_id).await?;
            if estimates.is_empty() {
                println!("No estimate items under sanctioned APOs.");
                return Ok(());
            }
            println!(
                "{:<38} {:<30} {:>10} {:>10} {:>12} {:<10}",
                "ID", "ACTIVITY", "SANCT QTY", "EFF QTY", "EFF COST", "STATUS"
            );
            for item in estimates {
                println!(
                    "{:<38} {:<30} {:>10.2} {:>10.2} {:>12.2} {:<10}",
                    item.id,
                    item.activity_name,
                    item.sanctioned_qty,
                    item.effective_qty(),
                    item.effective_cost(),
                    item.estimate_status
                );
            }
        }
        EstimateCommands::Revise { item_id, qty, role } => {
            let item_id = parse_uuid(&item_id, "item")?;
            let role: Role = role.parse()?;
            let item = ledger::revise_quantity(pool, item_id, qty, role).await?;
            println!(
                "Item {} revised: qty {:.2}, cost {:.2}",
                item.id,
                item.effective_qty(),
                item.effective_cost()
            );
        }
        EstimateCommands::Submit { item_id, role } => {
            change_status(pool, &item_id, EstimateStatus::Submitted, &role).await?;
        }
        EstimateCommands::Approve { item_id, role } => {
            change_status(pool, &item_id, EstimateStatus::Approved, &role).await?;
        }
        EstimateCommands::Reject { item_id, role } => {
            change_status(pool, &item_id, EstimateStatus::Rejected, &role).await?;
        }
    }
    Ok(())
}
