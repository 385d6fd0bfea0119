//! Per-URL evaluation pipeline and batch driver
//!
//! Each URL runs through the stages in a fixed order:
//!
//! 1. environment resolution (never fails)
//! 2. liveness probe; an unreachable URL skips every later stage
//! 3. transport timing; a failure is logged and the audit still runs
//! 4. external audit, including the report artifact lifecycle
//!
//! Stage failures end up in the record's `error_log`. Whatever a stage managed
//! to collect is kept. Exactly one record is persisted per URL, and a failed
//! insert aborts the batch.

use crate::audit::{AuditRunner, Auditor};
use crate::config::Config;
use crate::db::Database;
use crate::environment::EnvironmentResolver;
use crate::error::{Error, Result, StageError};
use crate::input::read_entries;
use crate::probe::{HttpLivenessProbe, LivenessProbe, build_http_client};
use crate::timing::{HttpTimingCollector, TimingCollector};
use crate::types::{EvaluationRecord, Reachability, RunSummary, UrlEntry};
use crate::utils::artifact_key;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The three pluggable stages of an evaluation
#[derive(Clone)]
pub struct Stages {
    /// Liveness probe
    pub probe: Arc<dyn LivenessProbe>,
    /// Transport timing collector
    pub timing: Arc<dyn TimingCollector>,
    /// External auditor
    pub auditor: Arc<dyn Auditor>,
}

/// Evaluates URLs and persists one record for each
pub struct Pipeline {
    db: Database,
    stages: Stages,
    resolver: EnvironmentResolver,
    run_id: i64,
}

impl Pipeline {
    /// Build a pipeline with the HTTP stages and the command-line auditor
    ///
    /// Opens (and migrates) the database. Fails if the auditor binary cannot
    /// be located.
    pub async fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.http)?;
        let stages = Stages {
            probe: Arc::new(HttpLivenessProbe::new(client.clone())),
            timing: Arc::new(HttpTimingCollector::new(config.http.clone())),
            auditor: Arc::new(AuditRunner::from_config(config)?),
        };
        let db = Database::new(&config.persistence.database_path).await?;
        Ok(Self::assemble(config, db, stages, client))
    }

    /// Build a pipeline around caller-provided stages
    pub fn with_stages(config: &Config, db: Database, stages: Stages) -> Result<Self> {
        let client = build_http_client(&config.http)?;
        Ok(Self::assemble(config, db, stages, client))
    }

    // `client` is shared with the environment resolver
    fn assemble(config: &Config, db: Database, stages: Stages, client: reqwest::Client) -> Self {
        Self {
            db,
            stages,
            resolver: EnvironmentResolver::new(client, config),
            run_id: Utc::now().timestamp_millis(),
        }
    }

    /// Identifier of this run, part of every artifact key
    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    /// Database records are written to
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Close the underlying database
    pub async fn close(self) {
        self.db.close().await;
    }

    /// Run every stage for one URL
    ///
    /// Never fails: stage errors are recorded on the returned record.
    pub async fn evaluate(&self, index: usize, entry: &UrlEntry) -> EvaluationRecord {
        let url = entry.url.as_str();
        let mut record = EvaluationRecord::new(entry, Utc::now());

        let env = self.resolver.resolve(url).await;
        record.environment = Some(env.name);
        record.version = env.version;
        record.branch = env.branch;

        match self.stages.probe.probe(url).await {
            Reachability::Reachable { status } => {
                info!(url, status, "reachable");
                record.reachable = Some(true);
            }
            Reachability::Unreachable { reason } => {
                let failure = StageError::NetworkUnreachable { reason };
                warn!(url, kind = failure.kind(), error = %failure, "unreachable");
                record.reachable = Some(false);
                record.record_failure(&failure);
                return record;
            }
        }

        match self.stages.timing.measure(url).await {
            Ok(timings) => record.timings = Some(timings),
            Err(e) => {
                warn!(url, kind = e.kind(), error = %e, "timing collection failed");
                record.record_failure(&e);
            }
        }

        let key = artifact_key(&entry.description, index, self.run_id);
        match self.stages.auditor.audit(url, &key).await.into_result() {
            Ok(metrics) => record.audit = Some(metrics),
            Err(e) => {
                warn!(url, kind = e.kind(), error = %e, "audit failed");
                record.record_failure(&e);
            }
        }

        record
    }

    /// Evaluate one URL and persist its record
    ///
    /// Only a persistence failure is returned as an error.
    pub async fn process(&self, index: usize, entry: &UrlEntry) -> Result<EvaluationRecord> {
        let record = self.evaluate(index, entry).await;

        let id = self.db.insert_evaluation(&record).await.map_err(|e| {
            tracing::error!(url = %record.url, error = %e, "failed to persist evaluation");
            e
        })?;

        info!(
            url = %record.url,
            id,
            status = %record.status(),
            error_log = record.error_log.as_deref().unwrap_or(""),
            "evaluation stored"
        );
        Ok(record)
    }

    /// Evaluate `entries` in order
    ///
    /// `cancel` is checked between URLs; the URL in flight when it fires is
    /// still persisted, then [`Error::Interrupted`] is returned.
    pub async fn run(&self, entries: &[UrlEntry], cancel: &CancellationToken) -> Result<RunSummary> {
        let total = entries.len();
        info!(total, run_id = self.run_id, "starting batch");

        let mut summary = RunSummary::default();
        for (index, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(processed = summary.total, total, "batch interrupted");
                return Err(Error::Interrupted {
                    processed: summary.total,
                    total,
                });
            }

            info!(index = index + 1, total, url = %entry.url, "evaluating");
            let record = self.process(index, entry).await?;
            summary.add(&record);
        }

        info!(
            total = summary.total,
            complete = summary.complete,
            partial = summary.partial,
            unreachable = summary.unreachable,
            "batch finished"
        );
        Ok(summary)
    }

    /// Read the input list at `path` and evaluate it
    pub async fn run_file(&self, path: &Path, cancel: &CancellationToken) -> Result<RunSummary> {
        let entries = read_entries(path)?;
        if entries.is_empty() {
            warn!(input = ?path, "input list has no URLs");
        }
        self.run(&entries, cancel).await
    }
}
