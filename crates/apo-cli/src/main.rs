mod activity_cmds;
mod apo_cmds;
mod config;
mod estimate_cmds;
mod norm_cmds;
mod plantation_cmds;
mod serve_cmd;

use clap::{Parser, Subcommand};

use apo_db::pool;

use config::ApoConfig;

#[derive(Parser)]
#[command(name = "apo", about = "Annual Plan of Operations budgeting for forestry plantations")]
struct Cli {
    /// Database URL (overrides APO_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an apo config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/apo")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the apo database (requires config file or env vars)
    DbInit,
    /// Plantation registry
    Plantation {
        #[command(subcommand)]
        command: PlantationCommands,
    },
    /// Activity master management
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
    /// Cost norm catalog management
    Norm {
        #[command(subcommand)]
        command: NormCommands,
    },
    /// Generate a draft APO from the norm catalog
    Draft {
        /// Plantation ID
        plantation_id: String,
        /// Financial year, e.g. 2026-27
        financial_year: String,
        /// Planned quantity override, repeatable: --qty <activity-id>=<qty>
        #[arg(long = "qty")]
        quantities: Vec<String>,
        /// User ID recorded as the creator
        #[arg(long)]
        created_by: Option<String>,
    },
    /// APO headers and the approval chain
    Apo {
        #[command(subcommand)]
        command: ApoCommands,
    },
    /// Estimate items: revision and review
    Estimate {
        #[command(subcommand)]
        command: EstimateCommands,
    },
    /// Serve the HTTP API
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum PlantationCommands {
    /// Register a plantation
    Add {
        /// Plantation name
        name: String,
        /// Species, e.g. Teak
        #[arg(long)]
        species: String,
        /// Year of planting
        #[arg(long)]
        year: i32,
        /// Total area in hectares
        #[arg(long)]
        area: f64,
    },
    /// List all plantations
    List,
}

#[derive(Subcommand)]
pub enum ActivityCommands {
    /// Add an activity to the master
    Add {
        /// Activity name
        name: String,
        /// Category, e.g. Fire Protection
        #[arg(long)]
        category: String,
        /// Unit, e.g. "Per Hectare"
        #[arg(long)]
        unit: String,
        /// Schedule-of-rates reference number
        #[arg(long)]
        ssr_no: Option<String>,
    },
    /// List all activities
    List,
}

#[derive(Subcommand)]
pub enum NormCommands {
    /// Add a cost norm
    Add {
        /// Activity ID the norm prices
        activity_id: String,
        /// Plantation age the norm applies to
        #[arg(long)]
        age: i32,
        /// Species the norm is restricted to (omit for any species)
        #[arg(long)]
        species: Option<String>,
        /// Standard rate per unit
        #[arg(long)]
        rate: f64,
        /// Financial year, e.g. 2026-27
        #[arg(long)]
        financial_year: String,
    },
    /// List the norm catalog for a financial year
    List {
        /// Financial year, e.g. 2026-27
        financial_year: String,
    },
}

#[derive(Subcommand)]
pub enum ApoCommands {
    /// List APO headers (optionally for one plantation)
    List {
        /// Plantation ID to filter by
        #[arg(long)]
        plantation: Option<String>,
    },
    /// Show a header and its items
    Show {
        /// APO header ID
        apo_id: String,
    },
    /// Move a header through the approval chain
    Status {
        /// APO header ID
        apo_id: String,
        /// Target status, e.g. PENDING_DM_APPROVAL
        status: String,
        /// Acting role, e.g. RANGE_OFFICER
        #[arg(long)]
        role: String,
        /// User ID recorded as the approver on sanction
        #[arg(long)]
        actor: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum EstimateCommands {
    /// List the estimate items of a plantation's sanctioned APOs
    List {
        /// Plantation ID
        plantation_id: String,
    },
    /// Revise an item's quantity (budget-checked)
    Revise {
        /// APO item ID
        item_id: String,
        /// New quantity
        qty: f64,
        /// Acting role
        #[arg(long, default_value = "CASE_WORKER_ESTIMATES")]
        role: String,
    },
    /// Submit an item for supervisor review
    Submit {
        /// APO item ID
        item_id: String,
        /// Acting role
        #[arg(long, default_value = "CASE_WORKER_ESTIMATES")]
        role: String,
    },
    /// Approve a submitted item
    Approve {
        /// APO item ID
        item_id: String,
        /// Acting role
        #[arg(long, default_value = "PLANTATION_SUPERVISOR")]
        role: String,
    },
    /// Reject a submitted item
    Reject {
        /// APO item ID
        item_id: String,
        /// Acting role
        #[arg(long, default_value = "PLANTATION_SUPERVISOR")]
        role: String,
    },
}

/// Execute the `apo init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `apo db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `apo db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = ApoConfig::resolve(cli_db_url)?;

    println!("Initializing apo database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("apo db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Plantation { command } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plantation_cmds::run_plantation_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Activity { command } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = activity_cmds::run_activity_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Norm { command } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = norm_cmds::run_norm_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Draft {
            plantation_id,
            financial_year,
            quantities,
            created_by,
        } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = apo_cmds::run_draft(
                &db_pool,
                &plantation_id,
                &financial_year,
                &quantities,
                created_by.as_deref(),
            )
            .await;
            db_pool.close().await;
            result?;
        }
        Commands::Apo { command } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = apo_cmds::run_apo_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Estimate { command } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = estimate_cmds::run_estimate_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = ApoConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = serve_cmd::run_serve(db_pool.clone(), &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
