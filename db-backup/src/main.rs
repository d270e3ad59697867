//! db-backup - Main entry point
//!
//! Dumps one configured database and applies the retention schedule to the
//! backup directory. Meant to be run from cron or a systemd timer.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use db_backup::config::{Config, DEFAULT_CONFIG_PATH, DEFAULT_CONNECTION};
use db_backup::job::{self, RunOptions};
use db_backup::utils;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Application name
    #[arg(short, long)]
    app: String,

    /// Environment name (e.g. prod, staging)
    #[arg(short, long)]
    env: String,

    /// Connection name
    #[arg(long, default_value = DEFAULT_CONNECTION)]
    connection: String,

    /// Date to run as, instead of today (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    today: Option<NaiveDate>,

    /// Only apply retention, do not dump
    #[arg(long)]
    skip_dump: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let run_config = config.resolve(&args.app, &args.env, &args.connection)?;
    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!(
        app = %args.app,
        env = %args.env,
        connection = %args.connection,
        backup_dir = %run_config.backup_dir.display(),
        %today,
        "Starting db-backup v{}",
        env!("CARGO_PKG_VERSION")
    );

    let report = job::run(
        &run_config,
        today,
        RunOptions {
            skip_dump: args.skip_dump,
        },
    )?;

    tracing::info!(
        snapshot = ?report.snapshot,
        weekly = ?report.cleanup.weekly,
        monthly = ?report.cleanup.monthly,
        "Run complete"
    );

    Ok(())
}
