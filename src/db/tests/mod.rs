use crate::types::{
    AuditMetrics, CategoryScores, EvaluationRecord, TransportTimings, UrlEntry, WebVitals,
};
use chrono::{DateTime, TimeZone, Utc};

mod close;

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
}

/// Record with every stage successful
fn complete_record(url: &str) -> EvaluationRecord {
    let mut record = EvaluationRecord::new(&UrlEntry::new(url, "Home page"), fixed_time());
    record.environment = Some("PROD".to_string());
    record.version = Some("4.2.1".to_string());
    record.branch = Some("4.2".to_string());
    record.reachable = Some(true);
    record.timings = Some(TransportTimings {
        dns_lookup_ms: 3,
        connect_time_ms: 15,
        start_transfer_ms: 120,
        total_time_ms: 240,
    });
    record.audit = Some(AuditMetrics {
        scores: CategoryScores {
            seo: 87,
            accessibility: 95,
            performance: 64,
            best_practices: 100,
        },
        vitals: WebVitals {
            first_contentful_paint: 912.0,
            speed_index: 1530.5,
            largest_contentful_paint: 2104.0,
            cumulative_layout_shift: 0.0421,
            total_blocking_time: 120.0,
            time_to_interactive: 3311.0,
        },
    });
    record
}

/// Record whose liveness probe failed
fn unreachable_record(url: &str) -> EvaluationRecord {
    let mut record = EvaluationRecord::new(&UrlEntry::new(url, ""), fixed_time());
    record.reachable = Some(false);
    record.error_log = Some("unreachable: connection refused".to_string());
    record
}
