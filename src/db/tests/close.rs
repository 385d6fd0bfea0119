use super::complete_record;
use crate::db::*;
use tempfile::NamedTempFile;

/// Verify that inserting after closing the pool returns an error
/// rather than hanging or panicking.
#[tokio::test]
async fn test_insert_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool().close().await;

    let result = db
        .insert_evaluation(&complete_record("http://example.com"))
        .await;
    assert!(
        result.is_err(),
        "insert_evaluation after pool close should return an error, got: {:?}",
        result
    );
    assert!(result.unwrap_err().is_persistence());
}

/// Verify that listing after closing the pool returns an error
#[tokio::test]
async fn test_list_after_pool_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.pool().close().await;

    let result = db.list_evaluations(None, 10).await;
    assert!(
        result.is_err(),
        "list_evaluations after pool close should return an error, got: {:?}",
        result
    );
}
