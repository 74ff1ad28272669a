use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use apo_db::queries::plantations;

use crate::PlantationCommands;

pub fn parse_uuid(s: &str, what: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("invalid {what} ID: {s}"))
}

pub async fn run_plantation_command(
    command: PlantationCommands,
    pool: &PgPool,
) -> anyhow::Result<()> {
    match command {
        PlantationCommands::Add {
            name,
            species,
            year,
            area,
        } => {
            let plantation =
                plantations::insert_plantation(pool, &name, &species, year, area).await?;
            println!("Registered plantation {}", plantation.id);
            println!(
                "  {} ({}, planted {}, {} ha)",
                plantation.name, plantation.species, plantation.year_of_planting, plantation.total_area_ha
            );
        }
        PlantationCommands::List => {
            let all = plantations::list_plantations(pool).await?;
            if all.is_empty() {
                println!("No plantations registered.");
                return Ok(());
            }
            println!("{:<38} {:<24} {:<10} {:>8} {:>10}", "ID", "NAME", "SPECIES", "PLANTED", "AREA (ha)");
            for p in all {
                println!(
                    "{:<38} {:<24} {:<10} {:>8} {:>10}",
                    p.id, p.name, p.species, p.year_of_planting, p.total_area_ha
                );
            }
        }
    }
    Ok(())
}
