mod db;
mod ledger;
mod pipeline;

use clap::{Parser, Subcommand};
use pricesync_core::PipelineStage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricesync-cli")]
#[command(about = "Retail price feed pipeline operator CLI")]
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
    /// Run a pipeline orchestrator in the foreground
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Inspect or reset the stage ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check the database connection
    Ping,
}

#[derive(Debug, Subcommand)]
enum PipelineCommands {
    /// Initial load: download price-full files and seed every table
    Bootstrap,
    /// Download recent price files and merge them
    Refresh,
}

#[derive(Debug, Subcommand)]
enum LedgerCommands {
    /// Show every stage and its status
    Status,
    /// Mark a stage not completed so the next run repeats it
    Reset {
        /// Stage name, e.g. PRICE_UPDATE
        stage: PipelineStage,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("pricesync-cli: no command given; see --help");
        return Ok(());
    };

    let config = pricesync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = pricesync_db::connect_pool_from_config(&config).await?;

    match command {
        Commands::Db { command } => match command {
            DbCommands::Migrate => db::run_db_migrate(&pool).await,
            DbCommands::Ping => db::run_db_ping(&pool).await,
        },
        Commands::Pipeline { command } => match command {
            PipelineCommands::Bootstrap => pipeline::run_pipeline_bootstrap(&pool, &config).await,
            PipelineCommands::Refresh => pipeline::run_pipeline_refresh(&pool, &config).await,
        },
        Commands::Ledger { command } => match command {
            LedgerCommands::Status => ledger::run_ledger_status(&pool).await,
            LedgerCommands::Reset { stage } => ledger::run_ledger_reset(&pool, stage).await,
        },
    }
}

#[cfg(test)]
mod tests;
