use anyhow::{bail, Context, Result};
use catalog_sync::config::SyncConfig;
use catalog_sync::sync::{RunMode, SyncReport, SyncRunner};
use catalog_sync::telemetry::init_tracing;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "catalog-sync", version, about = "Airtable product catalog sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Run the sync once and write all updates
    Run {
        /// Override SYNC_BATCH_SIZE (clamped to 1..=10)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Reconcile without writing and print the payloads as JSON
    Preview {
        /// Only print the first N payloads
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the select options resolved from the live schema
    Options,
}

fn print_report(report: &SyncReport) {
    for line in &report.logs {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn,catalog_sync=info")?;
    let cli = Cli::parse();

    let mut config = SyncConfig::from_env().context("loading configuration")?;
    if let Commands::Run {
        batch_size: Some(n),
    } = &cli.command
    {
        config.batch_size = catalog_sync::config::clamp_batch_size(*n);
    }
    // Local operators already hold the environment; reuse its password.
    let secret = config.shared_secret.clone();
    let runner = SyncRunner::from_config(config)?;

    match cli.command {
        Commands::Run { .. } => {
            let report = runner.run_with(&secret, RunMode::Write).await;
            print_report(&report);
            if !report.is_success() {
                bail!(report.error.unwrap_or(report.message));
            }
            info!(records = report.stats.records_written, "sync finished");
        }
        Commands::Preview { limit } => {
            let report = runner.preview(&secret).await;
            if !report.is_success() {
                print_report(&report);
                bail!(report.error.unwrap_or(report.message));
            }
            let mut payloads = report.payloads.unwrap_or_default();
            if let Some(n) = limit {
                payloads.truncate(n);
            }
            println!("{}", serde_json::to_string_pretty(&payloads)?);
            eprintln!("{}", report.message);
        }
        Commands::Options => {
            let options = runner.load_options().await?;
            println!("{}", serde_json::to_string_pretty(&options.to_sorted())?);
        }
    }

    Ok(())
}
