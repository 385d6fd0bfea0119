//! pagepulse command line
//!
//! ## Commands
//!
//! - `run`: evaluate every URL of the input list and store the results
//! - `history`: print stored evaluations, most recent first
//!
//! Exit status of `run`: 0 when every URL was fully evaluated, 1 when at least
//! one record is partial or unreachable, 2 on a fatal error, 130 when
//! interrupted.

use clap::{Parser, Subcommand};
use pagepulse::telemetry::init_tracing;
use pagepulse::{Config, Database, Error, Pipeline, RunSummary, shutdown_token};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "pagepulse")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit website performance and record the results in SQLite", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "PAGEPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the configuration file)
    #[arg(long, global = true, env = "PAGEPULSE_DATABASE")]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every URL of the input list
    Run {
        /// CSV file with `url,description` rows
        #[arg(short, long, env = "PAGEPULSE_INPUT")]
        input: Option<PathBuf>,

        /// Auditor executable (default: `lighthouse` from PATH)
        #[arg(long, env = "LIGHTHOUSE_CMD")]
        auditor: Option<PathBuf>,

        /// Directory for temporary audit reports
        #[arg(long, env = "PAGEPULSE_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Auditor timeout in seconds
        #[arg(long)]
        audit_timeout: Option<u64>,
    },

    /// Show stored evaluations
    History {
        /// Only show this URL
        #[arg(long)]
        url: Option<String>,

        /// Maximum number of records
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let result = match load_config(&cli) {
        Ok(config) => match cli.command {
            Commands::Run {
                input,
                auditor,
                output_dir,
                audit_timeout,
            } => {
                let mut config = config;
                if let Some(input) = input {
                    config.input_path = input;
                }
                if let Some(auditor) = auditor {
                    config.auditor.executable = Some(auditor);
                }
                if let Some(dir) = output_dir {
                    config.auditor.output_dir = dir;
                }
                if let Some(secs) = audit_timeout {
                    config.auditor.timeout = Duration::from_secs(secs);
                }
                run(config).await
            }
            Commands::History { url, limit } => history(config, url.as_deref(), limit).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(Error::Interrupted { processed, total }) => {
            error!(processed, total, "interrupted");
            ExitCode::from(130)
        }
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli) -> pagepulse::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(database) = &cli.database {
        config.persistence.database_path = database.clone();
    }
    Ok(config)
}

async fn run(config: Config) -> pagepulse::Result<ExitCode> {
    config.validate()?;

    let pipeline = Pipeline::new(&config).await?;
    let result = pipeline
        .run_file(&config.input_path, &shutdown_token())
        .await;
    pipeline.close().await;

    let summary = result?;
    print_summary(&summary);

    Ok(if summary.all_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_summary(summary: &RunSummary) {
    info!(
        total = summary.total,
        complete = summary.complete,
        partial = summary.partial,
        unreachable = summary.unreachable,
        "summary"
    );
    println!(
        "{} URLs: {} complete, {} partial, {} unreachable",
        summary.total, summary.complete, summary.partial, summary.unreachable
    );
}

async fn history(config: Config, url: Option<&str>, limit: usize) -> pagepulse::Result<ExitCode> {
    let db = Database::new(&config.persistence.database_path).await?;
    let evaluations = db.list_evaluations(url, limit).await?;
    db.close().await;

    for stored in &evaluations {
        let record = &stored.record;
        let scores = record
            .audit
            .map(|a| {
                format!(
                    "perf={} a11y={} bp={} seo={}",
                    a.scores.performance,
                    a.scores.accessibility,
                    a.scores.best_practices,
                    a.scores.seo
                )
            })
            .unwrap_or_else(|| "no audit".to_string());
        let total_time = record
            .timings
            .map(|t| format!("{}ms", t.total_time_ms))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{}  {:<11} {}  {}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.status().to_string(),
            record.url,
            total_time,
            scores
        );
        if let Some(log) = &record.error_log {
            for line in log.lines() {
                println!("    {}", line);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
