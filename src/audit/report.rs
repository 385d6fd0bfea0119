//! Audit report decoding
//!
//! Only the fields stored on a record are modelled; everything else in the
//! report is ignored. A missing field, a `null` score or an empty metrics item
//! list fails the whole extraction.

use crate::types::{AuditMetrics, CategoryScores, WebVitals};
use crate::utils::score_to_percent;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Report {
    categories: Categories,
    audits: Audits,
}

#[derive(Debug, Deserialize)]
struct Categories {
    seo: Category,
    accessibility: Category,
    performance: Category,
    #[serde(rename = "best-practices")]
    best_practices: Category,
}

#[derive(Debug, Deserialize)]
struct Category {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct Audits {
    metrics: MetricsAudit,
}

#[derive(Debug, Deserialize)]
struct MetricsAudit {
    details: MetricsDetails,
}

#[derive(Debug, Deserialize)]
struct MetricsDetails {
    items: Vec<MetricsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsItem {
    first_contentful_paint: f64,
    speed_index: f64,
    largest_contentful_paint: f64,
    cumulative_layout_shift: f64,
    total_blocking_time: f64,
    interactive: f64,
}

/// Decode the ten stored metrics from a JSON report
///
/// Returns a human-readable reason on failure.
pub fn parse_report(bytes: &[u8]) -> Result<AuditMetrics, String> {
    let report: Report = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    let item = report
        .audits
        .metrics
        .details
        .items
        .into_iter()
        .next()
        .ok_or_else(|| "audits.metrics.details.items is empty".to_string())?;

    let categories = report.categories;
    Ok(AuditMetrics {
        scores: CategoryScores {
            seo: score_to_percent(categories.seo.score),
            accessibility: score_to_percent(categories.accessibility.score),
            performance: score_to_percent(categories.performance.score),
            best_practices: score_to_percent(categories.best_practices.score),
        },
        vitals: WebVitals {
            first_contentful_paint: item.first_contentful_paint,
            speed_index: item.speed_index,
            largest_contentful_paint: item.largest_contentful_paint,
            cumulative_layout_shift: item.cumulative_layout_shift,
            total_blocking_time: item.total_blocking_time,
            time_to_interactive: item.interactive,
        },
    })
}
