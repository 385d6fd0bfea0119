//! Error types for pagepulse
//!
//! This module provides the error handling for the library:
//! - [`Error`], the fatal error type returned from batch-level operations
//! - [`DatabaseError`], persistence failures (always escalated)
//! - [`StageError`], per-URL stage failures that are captured into a record's
//!   `error_log` instead of aborting the batch

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagepulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pagepulse
///
/// Anything surfacing as an [`Error`] stops the batch. Stage failures of an
/// individual URL are [`StageError`]s and never reach this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "auditor.output_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input list could not be read
    #[error("input error: {0}")]
    Csv(#[from] csv::Error),

    /// External tool could not be located or configured
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// The batch was interrupted before all URLs were processed
    #[error("interrupted: {processed} of {total} URLs processed")]
    Interrupted {
        /// URLs whose records were persisted before the interrupt
        processed: usize,
        /// URLs in the input list
        total: usize,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error means an evaluation record may have been lost
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Sqlx(_))
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// A failed stage of one URL's evaluation
///
/// The `Display` text is what ends up in the persisted `error_log`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// Liveness probe failed: bad status or transport error
    #[error("unreachable: {reason}")]
    NetworkUnreachable {
        /// Status code or transport error text
        reason: String,
    },

    /// Timing request failed; no timing field is populated
    #[error("timing collection failed: {reason}")]
    TimingCollectionFailed {
        /// Transport error text
        reason: String,
    },

    /// Auditor could not be spawned, exited non-zero or timed out
    #[error("audit process failed: {diagnostic}")]
    AuditProcessFailed {
        /// Captured stderr or spawn error
        diagnostic: String,
    },

    /// Auditor exited successfully but wrote no report
    #[error("audit artifact missing: {}", path.display())]
    AuditArtifactMissing {
        /// Where the report was expected
        path: PathBuf,
    },

    /// Report exists but does not match the expected schema
    #[error("audit artifact malformed: {reason}")]
    AuditArtifactMalformed {
        /// Decode error text
        reason: String,
    },
}

impl StageError {
    /// Short machine-readable name of the failure category
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::NetworkUnreachable { .. } => "network_unreachable",
            StageError::TimingCollectionFailed { .. } => "timing_collection_failed",
            StageError::AuditProcessFailed { .. } => "audit_process_failed",
            StageError::AuditArtifactMissing { .. } => "audit_artifact_missing",
            StageError::AuditArtifactMalformed { .. } => "audit_artifact_malformed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_display_is_log_text() {
        let err = StageError::AuditArtifactMissing {
            path: PathBuf::from("/tmp/audits/home-0-1.json"),
        };
        assert_eq!(
            err.to_string(),
            "audit artifact missing: /tmp/audits/home-0-1.json"
        );

        let err = StageError::NetworkUnreachable {
            reason: "HTTP 503".into(),
        };
        assert_eq!(err.to_string(), "unreachable: HTTP 503");
        assert_eq!(err.kind(), "network_unreachable");
    }

    #[test]
    fn persistence_errors_are_flagged() {
        assert!(Error::Database(DatabaseError::QueryFailed("locked".into())).is_persistence());
        assert!(!Error::Other("nope".into()).is_persistence());
        assert!(
            !Error::Config {
                message: "bad".into(),
                key: None
            }
            .is_persistence()
        );
    }
}
