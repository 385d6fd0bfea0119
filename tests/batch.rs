//! End-to-end batch runs against a local HTTP server and a scripted auditor

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use pagepulse::config::EnvironmentConfig;
use pagepulse::{Database, Error, Pipeline, RecordStatus};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("build app-release-4.2.1-7f3c"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_batch_mixed_outcomes() {
    let dir = tempdir().unwrap();
    let server = site().await;
    let auditor = write_auditor_script(dir.path(), "lighthouse", &report_unless_silent());
    let mut config = test_config(dir.path(), auditor);
    config.environments = vec![EnvironmentConfig {
        name: "LOCAL".into(),
        marker: "127.0.0.1".into(),
        version_url: Some(format!("{}/version", server.uri())),
    }];

    let ok_url = format!("{}/home", server.uri());
    let refused_url = format!("http://127.0.0.1:{}/", closed_port());
    let silent_url = format!("{}/silent", server.uri());
    write_input(
        &config,
        &[
            (ok_url.as_str(), "Home page"),
            (refused_url.as_str(), "Down"),
            (silent_url.as_str(), ""),
        ],
    );

    let pipeline = Pipeline::new(&config).await.unwrap();
    let summary = pipeline
        .run_file(&config.input_path, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.complete, 1);
    assert_eq!(summary.unreachable, 1);
    assert_eq!(summary.partial, 1);
    assert!(!summary.all_complete());

    let db = pipeline.database();
    assert_eq!(db.count_evaluations().await.unwrap(), 3);

    // Reachable with timings and a full audit
    let stored = db.list_evaluations(Some(ok_url.as_str()), 10).await.unwrap();
    let ok = &stored[0].record;
    assert_eq!(ok.status(), RecordStatus::Complete);
    assert_eq!(ok.description, "Home page");
    assert_eq!(ok.environment.as_deref(), Some("LOCAL"));
    assert_eq!(ok.version.as_deref(), Some("4.2.1"));
    assert_eq!(ok.branch.as_deref(), Some("4.2"));
    let timings = ok.timings.unwrap();
    assert!(timings.dns_lookup_ms <= timings.connect_time_ms);
    assert!(timings.connect_time_ms <= timings.start_transfer_ms);
    assert!(timings.start_transfer_ms <= timings.total_time_ms);
    let audit = ok.audit.unwrap();
    assert_eq!(audit.scores.seo, 87);
    assert_eq!(audit.scores.best_practices, 100);
    assert_eq!(audit.vitals.cumulative_layout_shift, 0.0421);
    assert!(ok.error_log.is_none());

    // Refused connection: nothing beyond the probe
    let stored = db.list_evaluations(Some(refused_url.as_str()), 10).await.unwrap();
    let down = &stored[0].record;
    assert_eq!(down.reachable, Some(false));
    assert!(down.timings.is_none());
    assert!(down.audit.is_none());
    assert!(down.error_log.as_deref().unwrap().starts_with("unreachable:"));

    // Clean auditor exit without a report
    let stored = db.list_evaluations(Some(silent_url.as_str()), 10).await.unwrap();
    let silent = &stored[0].record;
    assert_eq!(silent.reachable, Some(true));
    assert!(silent.timings.is_some());
    assert!(silent.audit.is_none());
    assert!(
        silent
            .error_log
            .as_deref()
            .unwrap()
            .starts_with("audit artifact missing:")
    );

    // Every report consumed
    let leftovers = std::fs::read_dir(dir.path().join("audits")).unwrap().count();
    assert_eq!(leftovers, 0);

    pipeline.close().await;
}

#[tokio::test]
async fn test_batch_error_status_is_unreachable() {
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let auditor = write_auditor_script(dir.path(), "lighthouse", &report_unless_silent());
    let config = test_config(dir.path(), auditor);
    let url = server.uri();
    write_input(&config, &[(url.as_str(), "Maintenance")]);

    let pipeline = Pipeline::new(&config).await.unwrap();
    let summary = pipeline
        .run_file(&config.input_path, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.unreachable, 1);

    let stored = pipeline.database().list_evaluations(None, 1).await.unwrap();
    let record = &stored[0].record;
    assert_eq!(
        record.error_log.as_deref(),
        Some("unreachable: HTTP status 503")
    );
    pipeline.close().await;
}

#[tokio::test]
async fn test_runs_append_to_history() {
    let dir = tempdir().unwrap();
    let server = site().await;
    let auditor = write_auditor_script(dir.path(), "lighthouse", &report_unless_silent());
    let config = test_config(dir.path(), auditor);
    let url = format!("{}/home", server.uri());
    write_input(&config, &[(url.as_str(), "Home")]);

    for _ in 0..2 {
        let pipeline = Pipeline::new(&config).await.unwrap();
        let summary = pipeline
            .run_file(&config.input_path, &CancellationToken::new())
            .await
            .unwrap();
        assert!(summary.all_complete());
        pipeline.close().await;
    }

    let db = Database::new(&config.persistence.database_path)
        .await
        .unwrap();
    assert_eq!(db.list_evaluations(Some(url.as_str()), 10).await.unwrap().len(), 2);
    db.close().await;
}

#[tokio::test]
async fn test_cancelled_batch_stores_nothing() {
    let dir = tempdir().unwrap();
    let server = site().await;
    let auditor = write_auditor_script(dir.path(), "lighthouse", &report_unless_silent());
    let config = test_config(dir.path(), auditor);
    let url = format!("{}/home", server.uri());
    write_input(&config, &[(url.as_str(), "Home")]);

    let token = CancellationToken::new();
    token.cancel();

    let pipeline = Pipeline::new(&config).await.unwrap();
    let err = pipeline
        .run_file(&config.input_path, &token)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Interrupted { processed: 0, total: 1 }));
    assert_eq!(pipeline.database().count_evaluations().await.unwrap(), 0);
    pipeline.close().await;
}
