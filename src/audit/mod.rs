//! External page auditor integration
//!
//! The auditor is an out-of-process CLI that writes a JSON report to a path we
//! choose. One audit walks these states, and each transition can fail on its
//! own:
//!
//! ```text
//! NotStarted -> Running -> ArtifactMissing
//!                       -> ArtifactReady -> Extracted -> Cleaned
//! ```
//!
//! A clean process exit is not trusted on its own: the report must exist and
//! decode before the audit counts as successful. The report is deleted as soon
//! as it has been read, whether or not it decoded.
//!
//! - [`AuditRunner`] implements each step and the [`Auditor`] trait
//! - [`AuditOutcome`] is the tagged result of a whole audit

use crate::config::Config;
use crate::error::{Result, StageError};
use crate::types::AuditMetrics;
use crate::utils::artifact_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub mod report;

pub use report::parse_report;

/// Lifecycle state of one audit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditState {
    /// Nothing launched yet
    NotStarted,
    /// Auditor process running
    Running,
    /// Process exited cleanly but no report was written
    ArtifactMissing,
    /// Report present on disk
    ArtifactReady,
    /// Report read and decoded
    Extracted,
    /// Report removed
    Cleaned,
}

/// Result of a complete audit
#[derive(Clone, Debug, PartialEq)]
pub enum AuditOutcome {
    /// Report decoded; the artifact has been removed
    Success(AuditMetrics),
    /// Spawn failure, non-zero exit or timeout, with captured diagnostics
    ProcessFailed(String),
    /// Clean exit but no report at the expected path
    ArtifactMissing(PathBuf),
    /// Report present but not decodable; the artifact has been removed
    ArtifactMalformed(String),
}

impl AuditOutcome {
    /// Convert into the metrics or the matching stage failure
    pub fn into_result(self) -> std::result::Result<AuditMetrics, StageError> {
        match self {
            AuditOutcome::Success(metrics) => Ok(metrics),
            AuditOutcome::ProcessFailed(diagnostic) => {
                Err(StageError::AuditProcessFailed { diagnostic })
            }
            AuditOutcome::ArtifactMissing(path) => Err(StageError::AuditArtifactMissing { path }),
            AuditOutcome::ArtifactMalformed(reason) => {
                Err(StageError::AuditArtifactMalformed { reason })
            }
        }
    }
}

/// Trait for running a page audit
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Audit `url`, writing and consuming the artifact named by `artifact_key`
    async fn audit(&self, url: &str, artifact_key: &str) -> AuditOutcome;
}

/// Auditor driven through its command line
///
/// # Examples
///
/// ```no_run
/// use pagepulse::audit::{AuditRunner, Auditor};
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let runner = AuditRunner::new(
///     PathBuf::from("/usr/local/bin/lighthouse"),
///     PathBuf::from("./audits"),
///     Duration::from_secs(180),
/// );
/// let outcome = runner.audit("https://example.com", "home-0-1700000000000").await;
/// println!("{:?}", outcome);
/// # }
/// ```
pub struct AuditRunner {
    executable: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    preset: String,
}

impl AuditRunner {
    /// Create a runner with the default "desktop" preset
    pub fn new(executable: PathBuf, output_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            executable,
            output_dir,
            timeout,
            preset: "desktop".to_string(),
        }
    }

    /// Create a runner from the batch configuration
    ///
    /// Fails if no auditor binary can be located.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            executable: config.auditor_executable()?,
            output_dir: config.auditor.output_dir.clone(),
            timeout: config.auditor.timeout,
            preset: config.auditor.preset.clone(),
        })
    }

    /// Binary being invoked
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Where the report for `artifact_key` is written
    pub fn artifact_path(&self, artifact_key: &str) -> PathBuf {
        artifact_path(&self.output_dir, artifact_key)
    }

    /// Arguments passed to the auditor for one URL
    pub fn command_args(&self, url: &str, artifact_key: &str) -> Vec<String> {
        vec![
            url.to_string(),
            "--output=json".to_string(),
            format!("--output-path={}", self.artifact_path(artifact_key).display()),
            "--no-enable-error-reporting".to_string(),
            "--no-update-notifier".to_string(),
            "--chrome-flags=--headless".to_string(),
            "--quiet".to_string(),
            "--preset".to_string(),
            self.preset.clone(),
        ]
    }

    /// Launch the auditor and wait for it to exit
    ///
    /// A stale report at the target path is removed first so that a later
    /// existence check only sees output of this run.
    pub async fn run(&self, url: &str, artifact_key: &str) -> std::result::Result<(), StageError> {
        let process_failed = |diagnostic: String| StageError::AuditProcessFailed { diagnostic };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                process_failed(format!(
                    "failed to create output directory {}: {}",
                    self.output_dir.display(),
                    e
                ))
            })?;

        let path = self.artifact_path(artifact_key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(artifact = ?path, "removing stale audit report");
            self.delete_artifact(artifact_key).await;
        }

        debug!(url, executable = ?self.executable, artifact = ?path, "launching auditor");
        let mut command = Command::new(&self.executable);
        command
            .args(self.command_args(url, artifact_key))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(process_failed(format!(
                    "failed to execute {}: {}",
                    self.executable.display(),
                    e
                )));
            }
            Err(_) => {
                return Err(process_failed(format!(
                    "auditor timed out after {}s",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let captured = if stderr.trim().is_empty() {
            stdout.trim()
        } else {
            stderr.trim()
        };
        Err(process_failed(format!("{}: {}", output.status, captured)))
    }

    /// Whether the report for `artifact_key` exists; logs when it does not
    pub async fn artifact_exists(&self, artifact_key: &str) -> bool {
        let path = self.artifact_path(artifact_key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => true,
            Ok(_) => {
                warn!(artifact = ?path, "audit artifact is not a regular file");
                false
            }
            Err(e) => {
                warn!(artifact = ?path, error = %e, "audit artifact does not exist");
                false
            }
        }
    }

    /// Read and decode the report for `artifact_key`
    ///
    /// Either all ten metrics are returned or none.
    pub async fn extract_metrics(
        &self,
        artifact_key: &str,
    ) -> std::result::Result<AuditMetrics, StageError> {
        let path = self.artifact_path(artifact_key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StageError::AuditArtifactMissing { path });
            }
            Err(e) => {
                return Err(StageError::AuditArtifactMalformed {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        parse_report(&bytes).map_err(|reason| {
            warn!(artifact = ?path, error = %reason, "audit artifact malformed");
            StageError::AuditArtifactMalformed { reason }
        })
    }

    /// Remove the report for `artifact_key`; failures are only logged
    pub async fn delete_artifact(&self, artifact_key: &str) {
        let path = self.artifact_path(artifact_key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(artifact = ?path, "deleted audit artifact"),
            Err(e) => warn!(artifact = ?path, error = %e, "failed to delete audit artifact"),
        }
    }
}

#[async_trait]
impl Auditor for AuditRunner {
    async fn audit(&self, url: &str, artifact_key: &str) -> AuditOutcome {
        let transition = |state: AuditState| debug!(url, artifact_key, ?state, "audit state");
        transition(AuditState::NotStarted);

        transition(AuditState::Running);
        if let Err(e) = self.run(url, artifact_key).await {
            warn!(url, error = %e, "auditor failed");
            // A failing auditor may still have written its report
            if tokio::fs::try_exists(self.artifact_path(artifact_key))
                .await
                .unwrap_or(false)
            {
                self.delete_artifact(artifact_key).await;
                transition(AuditState::Cleaned);
            }
            return match e {
                StageError::AuditProcessFailed { diagnostic } => {
                    AuditOutcome::ProcessFailed(diagnostic)
                }
                other => AuditOutcome::ProcessFailed(other.to_string()),
            };
        }

        if !self.artifact_exists(artifact_key).await {
            transition(AuditState::ArtifactMissing);
            return AuditOutcome::ArtifactMissing(self.artifact_path(artifact_key));
        }
        transition(AuditState::ArtifactReady);

        let extracted = self.extract_metrics(artifact_key).await;
        if extracted.is_ok() {
            transition(AuditState::Extracted);
        }

        self.delete_artifact(artifact_key).await;
        transition(AuditState::Cleaned);

        match extracted {
            Ok(metrics) => {
                info!(
                    url,
                    performance = metrics.scores.performance,
                    accessibility = metrics.scores.accessibility,
                    best_practices = metrics.scores.best_practices,
                    seo = metrics.scores.seo,
                    "audit complete"
                );
                AuditOutcome::Success(metrics)
            }
            Err(StageError::AuditArtifactMissing { path }) => AuditOutcome::ArtifactMissing(path),
            Err(e) => AuditOutcome::ArtifactMalformed(match e {
                StageError::AuditArtifactMalformed { reason } => reason,
                other => other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers;
