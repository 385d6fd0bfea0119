//! Core types for pagepulse

use crate::error::StageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the input list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    /// Target URL
    pub url: String,
    /// Free-form label for the URL, empty when the row has none
    pub description: String,
}

impl UrlEntry {
    /// Create a new entry
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Outcome of the liveness probe
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reachability {
    /// Final status was in `[200, 400)`
    Reachable {
        /// Final HTTP status after redirects
        status: u16,
    },
    /// Any other status, or a transport failure
    Unreachable {
        /// Status code or transport error text
        reason: String,
    },
}

impl Reachability {
    /// Whether the URL answered with a success or redirect status
    pub fn is_reachable(&self) -> bool {
        matches!(self, Reachability::Reachable { .. })
    }
}

/// Transport timings of one GET, cumulative from the start of the request,
/// in whole milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportTimings {
    /// Name resolution finished
    pub dns_lookup_ms: i64,
    /// TCP connection established
    pub connect_time_ms: i64,
    /// First response byte (headers) received
    pub start_transfer_ms: i64,
    /// Body fully received
    pub total_time_ms: i64,
}

/// Category scores as integer percentages (0-100)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    /// SEO category
    pub seo: i64,
    /// Accessibility category
    pub accessibility: i64,
    /// Performance category
    pub performance: i64,
    /// Best practices category
    pub best_practices: i64,
}

/// Page vitals in the auditor's own units (milliseconds, except the
/// unitless layout shift)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebVitals {
    /// First contentful paint
    pub first_contentful_paint: f64,
    /// Speed index
    pub speed_index: f64,
    /// Largest contentful paint
    pub largest_contentful_paint: f64,
    /// Cumulative layout shift, full precision
    pub cumulative_layout_shift: f64,
    /// Total blocking time
    pub total_blocking_time: f64,
    /// Time to interactive
    pub time_to_interactive: f64,
}

/// Everything extracted from one audit report
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditMetrics {
    /// Category scores
    pub scores: CategoryScores,
    /// Timing vitals
    pub vitals: WebVitals,
}

/// Combined result of evaluating one URL
///
/// Grouped fields (`timings`, `audit`) are all-or-nothing: a stage either
/// contributes its full set of values or none of them. Stages that did not run
/// leave their fields `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Target URL
    pub url: String,
    /// Label from the input row
    pub description: String,
    /// Captured once when evaluation of this URL started
    pub timestamp: DateTime<Utc>,
    /// Deployment environment the URL belongs to
    pub environment: Option<String>,
    /// Deployed application version
    pub version: Option<String>,
    /// Deployed release branch
    pub branch: Option<String>,
    /// Liveness result, `None` if the probe never ran
    pub reachable: Option<bool>,
    /// Transport timings
    pub timings: Option<TransportTimings>,
    /// Audit scores and vitals
    pub audit: Option<AuditMetrics>,
    /// Newline-separated stage failures, `None` if every stage that ran succeeded
    pub error_log: Option<String>,
}

impl EvaluationRecord {
    /// Start a record for `entry`
    pub fn new(entry: &UrlEntry, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: entry.url.clone(),
            description: entry.description.clone(),
            timestamp,
            environment: None,
            version: None,
            branch: None,
            reachable: None,
            timings: None,
            audit: None,
            error_log: None,
        }
    }

    /// Append a stage failure to `error_log`
    ///
    /// Only touches `error_log`; values from earlier stages are kept.
    pub fn record_failure(&mut self, error: &StageError) {
        let line = error.to_string();
        match &mut self.error_log {
            Some(log) => {
                log.push('\n');
                log.push_str(&line);
            }
            None => self.error_log = Some(line),
        }
    }

    /// How far evaluation of this URL got
    pub fn status(&self) -> RecordStatus {
        match self.reachable {
            Some(false) => RecordStatus::Unreachable,
            _ if self.error_log.is_none() && self.audit.is_some() => RecordStatus::Complete,
            _ => RecordStatus::Partial,
        }
    }
}

/// Coarse classification of a persisted record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Every stage succeeded
    Complete,
    /// Reachable, but at least one later stage failed
    Partial,
    /// Liveness probe failed; nothing else ran
    Unreachable,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordStatus::Complete => "complete",
            RecordStatus::Partial => "partial",
            RecordStatus::Unreachable => "unreachable",
        };
        f.write_str(s)
    }
}

/// Counts for one batch run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records persisted
    pub total: usize,
    /// Records with every stage successful
    pub complete: usize,
    /// Reachable records with a failed later stage
    pub partial: usize,
    /// Records whose liveness probe failed
    pub unreachable: usize,
}

impl RunSummary {
    /// Count one persisted record
    pub fn add(&mut self, record: &EvaluationRecord) {
        self.total += 1;
        match record.status() {
            RecordStatus::Complete => self.complete += 1,
            RecordStatus::Partial => self.partial += 1,
            RecordStatus::Unreachable => self.unreachable += 1,
        }
    }

    /// Whether every URL was fully evaluated
    pub fn all_complete(&self) -> bool {
        self.complete == self.total
    }
}
