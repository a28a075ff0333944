use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "rxmart-cli")]
#[command(about = "RxMart maintenance command line interface")]
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
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database answers
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert pharmacists and customers from a YAML accounts file
    Seed {
        /// Defaults to `RXMART_ACCOUNTS_PATH`
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(Commands::Db { command }) = cli.command else {
        println!("rxmart-cli: nothing to do, try `rxmart-cli db --help`");
        return Ok(());
    };

    let config = rxmart_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = rxmart_db::PoolConfig::from_app_config(&config);
    let pool = rxmart_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        DbCommands::Ping => {
            rxmart_db::ping(&pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = rxmart_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
        DbCommands::Seed { file } => {
            let path = file.unwrap_or_else(|| config.accounts_path.clone());
            let accounts = rxmart_core::load_accounts(&path)?;
            let seeded = rxmart_db::seed_accounts(&pool, &accounts).await?;
            tracing::info!(path = %path.display(), seeded, "accounts seeded");
            println!("seeded {seeded} accounts from {}", path.display());
        }
    }

    pool.close().await;
    Ok(())
}
