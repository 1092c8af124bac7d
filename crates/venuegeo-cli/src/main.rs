mod reconcile;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "venuegeo-cli")]
#[command(about = "Venue geocoding reconciliation command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Geocode every venue's address and write the coordinates back
    Reconcile {
        /// Only reconcile venues that have no coordinates yet
        #[arg(long)]
        missing_only: bool,
        /// Print the JSON report instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert venues from the venues seed file
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("venuegeo-cli: use --help to list commands");
        return Ok(());
    };

    let config = venuegeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool_config = venuegeo_db::PoolConfig::from_app_config(&config);
    let pool = venuegeo_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &config, command).await,
        Commands::Reconcile { missing_only, json } => {
            reconcile::run_reconcile(pool, &config, missing_only, json).await
        }
    }
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &venuegeo_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            venuegeo_db::ping(pool).await.inspect_err(|e| {
                tracing::error!(error = %e, "database ping failed");
            })?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = venuegeo_db::run_migrations(pool).await?;
            tracing::info!(applied, "migrations complete");
            println!("migrations applied: {applied}");
        }
        DbCommands::Seed => {
            let venues = venuegeo_core::load_venues(&config.venues_path)?;
            let count = venuegeo_db::seed_venues(pool, &venues.venues).await?;
            tracing::info!(count, path = %config.venues_path.display(), "venues seeded");
            println!("seeded {count} venues from {}", config.venues_path.display());
        }
    }
    Ok(())
}
