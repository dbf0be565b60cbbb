use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deal_watcher::plugins::PluginManager;
use deal_watcher::scraper::HttpFetcher;
use deal_watcher::{AppConfig, CheckOptions, ProductManager, RunStatus};

/// Exit codes: 0 nothing to report, 1 at least one alert fired,
/// 2 some item could not be checked or the run itself failed.
const EXIT_ALERT: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "deal-watcher")]
#[command(about = "Watch retail prices and availability, alert on thresholds")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to config/default.*)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every configured item once
    Check {
        /// Classify without writing history or sending notifications
        #[arg(long)]
        dry_run: bool,

        /// Only check the item with this id
        #[arg(long = "item")]
        item: Option<String>,
    },

    /// Print price and availability statistics from the history file
    Stats,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("deal_watcher={}", level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let plugins = PluginManager::new();
    plugins.initialize_default_plugins(&config).await?;
    info!("Notifiers: {}", plugins.list_notifier_types().await.join(", "));
    let fetcher = Arc::new(HttpFetcher::new(config.scraper.clone())?);
    let manager = ProductManager::new(config, fetcher, plugins);

    match cli.command {
        Commands::Check { dry_run, item } => {
            let options = CheckOptions {
                dry_run,
                only_item: item,
            };
            let summary = manager.check_all(&options).await?;
            println!("{}", summary);
            Ok(summary.status())
        }
        Commands::Stats => {
            let stats = manager.stats()?;
            if stats.is_empty() {
                println!("No history yet.");
            }
            for item in stats {
                println!("{}\n", item);
            }
            Ok(RunStatus::Success)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    info!("Starting deal-watcher...");

    match run(cli).await {
        Ok(RunStatus::Success) => ExitCode::SUCCESS,
        Ok(RunStatus::AlertTriggered) => ExitCode::from(EXIT_ALERT),
        Ok(RunStatus::Error) => ExitCode::from(EXIT_ERROR),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
