//! # pagepulse
//!
//! Batch job that tracks website performance over time.
//!
//! For every URL of an input list pagepulse:
//! - checks that the URL answers at all
//! - measures transport timings of a plain GET
//! - runs an external page auditor (lighthouse) and reads its JSON report
//! - appends one record per URL to a SQLite database
//!
//! A failing stage never aborts the batch. Its diagnostic is stored with the
//! record, together with everything the earlier stages collected. Only a
//! failed database write stops the run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagepulse::{Config, Pipeline, shutdown_token};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let pipeline = Pipeline::new(&config).await?;
//!
//!     let summary = pipeline
//!         .run_file(Path::new("urls.csv"), &shutdown_token())
//!         .await?;
//!     println!("{} URLs evaluated", summary.total);
//!
//!     pipeline.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// External auditor and report handling
pub mod audit;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Environment and deployed version resolution
pub mod environment;
/// Error types
pub mod error;
/// Input list parsing
pub mod input;
/// Evaluation pipeline
pub mod pipeline;
/// Liveness probe
pub mod probe;
/// Logging setup
pub mod telemetry;
/// Transport timing measurement
pub mod timing;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use audit::{AuditOutcome, AuditRunner, Auditor};
pub use config::Config;
pub use db::{Database, StoredEvaluation};
pub use error::{DatabaseError, Error, Result, StageError};
pub use pipeline::{Pipeline, Stages};
pub use probe::{HttpLivenessProbe, LivenessProbe};
pub use timing::{HttpTimingCollector, TimingCollector};
pub use types::{
    AuditMetrics, CategoryScores, EvaluationRecord, Reachability, RecordStatus, RunSummary,
    TransportTimings, UrlEntry, WebVitals,
};

/// Token that is cancelled on the first termination signal.
///
/// Pass it to [`Pipeline::run`] to stop a batch between URLs.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Must be called from within a tokio runtime.
pub fn shutdown_token() -> tokio_util::sync::CancellationToken {
    let token = tokio_util::sync::CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Stopping after the URL in progress");
        trigger.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let register = |kind: SignalKind, name: &str| {
        signal(kind)
            .inspect_err(|e| tracing::warn!(error = %e, "Could not register {} handler", name))
            .ok()
    };
    let sigterm = register(SignalKind::terminate(), "SIGTERM");
    let sigint = register(SignalKind::interrupt(), "SIGINT");

    match (sigterm, sigint) {
        (Some(mut term), Some(mut int)) => {
            tokio::select! {
                _ = term.recv() => tracing::info!("Received SIGTERM signal"),
                _ = int.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Some(mut term), None) => {
            term.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (None, Some(mut int)) => {
            int.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (None, None) => {
            tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
