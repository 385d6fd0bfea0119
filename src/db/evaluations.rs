//! Evaluation record persistence.

use crate::types::EvaluationRecord;
use crate::{Error, Result};
use chrono::SecondsFormat;

use super::{Database, EvaluationRow, StoredEvaluation};

const SELECT_COLUMNS: &str = r#"
    SELECT id, url, description, timestamp, environment, version, branch, reachable,
           dns_lookup, connect_time, start_transfer_time, total_time,
           performance_score, accessibility_score, best_practices_score, seo_score,
           first_contentful_paint, speed_index, largest_contentful_paint,
           cumulative_layout_shift, total_blocking_time, time_to_interactive,
           error_log
    FROM evaluations
"#;

impl Database {
    /// Insert one evaluation record
    ///
    /// The insert runs in its own transaction and is committed before this
    /// returns, so a record is durable before the next URL is evaluated.
    /// Stages that did not run are stored as NULL.
    pub async fn insert_evaluation(&self, record: &EvaluationRecord) -> Result<i64> {
        let timings = record.timings.as_ref();
        let scores = record.audit.as_ref().map(|a| &a.scores);
        let vitals = record.audit.as_ref().map(|a| &a.vitals);

        let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;

        let result = sqlx::query(
            r#"
            INSERT INTO evaluations (
                url, description, date, time, timestamp,
                environment, version, branch, reachable,
                dns_lookup, connect_time, start_transfer_time, total_time,
                performance_score, accessibility_score, best_practices_score, seo_score,
                first_contentful_paint, speed_index, largest_contentful_paint,
                cumulative_layout_shift, total_blocking_time, time_to_interactive,
                error_log
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.url)
        .bind(&record.description)
        .bind(record.timestamp.format("%Y-%m-%d").to_string())
        .bind(record.timestamp.format("%H:%M:%S").to_string())
        .bind(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(&record.environment)
        .bind(&record.version)
        .bind(&record.branch)
        .bind(record.reachable)
        .bind(timings.map(|t| t.dns_lookup_ms))
        .bind(timings.map(|t| t.connect_time_ms))
        .bind(timings.map(|t| t.start_transfer_ms))
        .bind(timings.map(|t| t.total_time_ms))
        .bind(scores.map(|s| s.performance))
        .bind(scores.map(|s| s.accessibility))
        .bind(scores.map(|s| s.best_practices))
        .bind(scores.map(|s| s.seo))
        .bind(vitals.map(|v| v.first_contentful_paint))
        .bind(vitals.map(|v| v.speed_index))
        .bind(vitals.map(|v| v.largest_contentful_paint))
        .bind(vitals.map(|v| v.cumulative_layout_shift))
        .bind(vitals.map(|v| v.total_blocking_time))
        .bind(vitals.map(|v| v.time_to_interactive))
        .bind(&record.error_log)
        .execute(&mut *tx)
        .await
        .map_err(Error::Sqlx)?;

        tx.commit().await.map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Get a single evaluation by ID
    pub async fn get_evaluation(&self, id: i64) -> Result<Option<StoredEvaluation>> {
        let row = sqlx::query_as::<_, EvaluationRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        row.map(StoredEvaluation::try_from).transpose()
    }

    /// List evaluations, most recent first, optionally for one URL only
    pub async fn list_evaluations(
        &self,
        url_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<StoredEvaluation>> {
        let query = if let Some(url) = url_filter {
            sqlx::query_as::<_, EvaluationRow>(&format!(
                "{} WHERE url = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
                SELECT_COLUMNS
            ))
            .bind(url.to_string())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, EvaluationRow>(&format!(
                "{} ORDER BY timestamp DESC, id DESC LIMIT ?",
                SELECT_COLUMNS
            ))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
        };

        let rows = query.map_err(Error::Sqlx)?;
        rows.into_iter().map(StoredEvaluation::try_from).collect()
    }

    /// Count all persisted evaluations
    pub async fn count_evaluations(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM evaluations")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)
    }
}
