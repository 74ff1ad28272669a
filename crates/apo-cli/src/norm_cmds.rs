use sqlx::PgPool;

use apo_db::queries::norms;

use crate::NormCommands;
use crate::plantation_cmds::parse_uuid;

pub async fn run_norm_command(command: NormCommands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        NormCommands::Add {
            activity_id,
            age,
            species,
            rate,
            financial_year,
        } => {
            let activity_id = parse_uuid(&activity_id, "activity")?;
            let norm = norms::insert_norm(
                pool,
                activity_id,
                age,
                species.as_deref(),
                rate,
                &financial_year,
            )
            .await?;
            println!("Added norm {}", norm.id);
            println!(
                "  age {} / {} @ {} ({})",
                norm.applicable_age,
                norm.species.as_deref().unwrap_or("any species"),
                norm.standard_rate,
                norm.financial_year
            );
        }
        NormCommands::List { financial_year } => {
            let all = norms::list_norms(pool, &financial_year).await?;
            if all.is_empty() {
                println!("No norms for {financial_year}.");
                return Ok(());
            }
            println!(
                "{:<30} {:<20} {:>4} {:<10} {:>12} {:<14}",
                "ACTIVITY", "CATEGORY", "AGE", "SPECIES", "RATE", "UNIT"
            );
            for n in all {
                println!(
                    "{:<30} {:<20} {:>4} {:<10} {:>12.2} {:<14}",
                    n.activity_name,
                    n.category,
                    n.applicable_age,
                    n.species.as_deref().unwrap_or("any"),
                    n.standard_rate,
                    n.unit
                );
            }
        }
    }
    Ok(())
}
