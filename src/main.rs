use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weekly_report::commands::{analyze, run_report, ReportOptions};
use weekly_report::config::{AnalysisMode, Config};
use weekly_report::error::ReportErrorTrait;

#[derive(Parser)]
#[command(
    name = "weekly-report",
    version,
    about = "Weekly mod download statistics posted to a chat channel",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weekly report and post it
    Run {
        /// Webhook URL; overrides the configured delivery target
        webhook_url: Option<String>,

        /// Print the message instead of sending it; the snapshot is not written
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Snapshot file path
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// What to rank (history, database)
        #[arg(long)]
        mode: Option<AnalysisMode>,
    },

    /// Print per-mod download changes for a window
    Analyze {
        /// Local download-history JSON; fetched when omitted
        #[arg(long)]
        history: Option<PathBuf>,

        /// Window length in days
        #[arg(long)]
        days: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("weekly-report starting");

    match cli.command {
        Commands::Run {
            webhook_url,
            dry_run,
            snapshot,
            mode,
        } => {
            tracing::info!(
                dry_run = %dry_run,
                snapshot = ?snapshot,
                mode = ?mode,
                "Starting run command"
            );

            let options = ReportOptions {
                dry_run,
                now: None,
                webhook_url,
                snapshot_path: snapshot,
                mode,
            };

            let outcome = match run_report(&config, options).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        category = e.category().as_str(),
                        recoverable = e.is_recoverable(),
                        error = %e,
                        "Report run failed"
                    );
                    return Err(e.into());
                }
            };

            match &outcome.delivery {
                Some(status) => println!("{status}"),
                None => println!("{}", serde_json::to_string_pretty(&outcome.message)?),
            }
        }

        Commands::Analyze { history, days } => {
            tracing::info!(history = ?history, days = ?days, "Starting analyze command");
            analyze(&config, history.as_deref(), days).await?;
        }
    }

    tracing::info!("weekly-report completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("weekly_report=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("weekly_report={level},warn"))
            })
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
