use sqlx::PgPool;

use apo_db::queries::activities;

use crate::ActivityCommands;

pub async fn run_activity_command(command: ActivityCommands, pool: &PgPool) -> anyhow::Result<()> {
    match command {
        ActivityCommands::Add {
            name,
            category,
            unit,
            ssr_no,
        } => {
            let activity =
                activities::insert_activity(pool, &name, &category, &unit, ssr_no.as_deref())
                    .await?;
            println!("Added activity {}", activity.id);
            println!("  {} [{}] per {}", activity.name, activity.category, activity.unit);
        }
        ActivityCommands::List => {
            let all = activities::list_activities(pool).await?;
            if all.is_empty() {
                println!("No activities in the master.");
                return Ok(());
            }
            println!(
                "{:<38} {:<30} {:<20} {:<14} {:<10}",
                "ID", "NAME", "CATEGORY", "UNIT", "SSR NO"
            );
            for a in all {
                println!(
                    "{:<38} {:<30} {:<20} {:<14} {:<10}",
                    a.id,
                    a.name,
                    a.category,
                    a.unit,
                    a.ssr_no.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}
