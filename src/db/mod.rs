//! Database layer for pagepulse
//!
//! Handles SQLite persistence of evaluation records. The table is append-only:
//! one row per evaluated URL per run, never updated.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`evaluations`]: Record insertion and read-back queries

use crate::error::DatabaseError;
use crate::types::{AuditMetrics, CategoryScores, EvaluationRecord, TransportTimings, WebVitals};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod evaluations;
mod migrations;

/// Database handle for evaluation records
pub struct Database {
    pool: SqlitePool,
}

/// Evaluation record read back from the database
#[derive(Clone, Debug, PartialEq)]
pub struct StoredEvaluation {
    /// Unique database ID
    pub id: i64,
    /// The persisted record
    pub record: EvaluationRecord,
}

/// Evaluation row from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub(crate) struct EvaluationRow {
    pub id: i64,
    pub url: String,
    pub description: String,
    pub timestamp: String,
    pub environment: Option<String>,
    pub version: Option<String>,
    pub branch: Option<String>,
    pub reachable: Option<bool>,
    pub dns_lookup: Option<i64>,
    pub connect_time: Option<i64>,
    pub start_transfer_time: Option<i64>,
    pub total_time: Option<i64>,
    pub performance_score: Option<i64>,
    pub accessibility_score: Option<i64>,
    pub best_practices_score: Option<i64>,
    pub seo_score: Option<i64>,
    pub first_contentful_paint: Option<f64>,
    pub speed_index: Option<f64>,
    pub largest_contentful_paint: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
    pub total_blocking_time: Option<f64>,
    pub time_to_interactive: Option<f64>,
    pub error_log: Option<String>,
}

impl EvaluationRow {
    fn timings(&self) -> Option<TransportTimings> {
        Some(TransportTimings {
            dns_lookup_ms: self.dns_lookup?,
            connect_time_ms: self.connect_time?,
            start_transfer_ms: self.start_transfer_time?,
            total_time_ms: self.total_time?,
        })
    }

    fn audit(&self) -> Option<AuditMetrics> {
        Some(AuditMetrics {
            scores: CategoryScores {
                seo: self.seo_score?,
                accessibility: self.accessibility_score?,
                performance: self.performance_score?,
                best_practices: self.best_practices_score?,
            },
            vitals: WebVitals {
                first_contentful_paint: self.first_contentful_paint?,
                speed_index: self.speed_index?,
                largest_contentful_paint: self.largest_contentful_paint?,
                cumulative_layout_shift: self.cumulative_layout_shift?,
                total_blocking_time: self.total_blocking_time?,
                time_to_interactive: self.time_to_interactive?,
            },
        })
    }
}

impl TryFrom<EvaluationRow> for StoredEvaluation {
    type Error = Error;

    fn try_from(row: EvaluationRow) -> Result<Self> {
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Invalid timestamp '{}' on evaluation {}: {}",
                    row.timestamp, row.id, e
                )))
            })?
            .with_timezone(&Utc);

        let timings = row.timings();
        let audit = row.audit();

        Ok(StoredEvaluation {
            id: row.id,
            record: EvaluationRecord {
                url: row.url,
                description: row.description,
                timestamp,
                environment: row.environment,
                version: row.version,
                branch: row.branch,
                reachable: row.reachable,
                timings,
                audit,
                error_log: row.error_log,
            },
        })
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
