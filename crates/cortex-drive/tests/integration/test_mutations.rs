//! Integration tests for file delete and rename

use cortex_core::domain::newtypes::RemoteFileId;
use cortex_core::ports::IDriveSource;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::common;

fn file_id(id: &str) -> RemoteFileId {
    RemoteFileId::new(id.to_string()).unwrap()
}

#[tokio::test]
async fn test_delete_file_sends_delete() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/files/f1"))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    source
        .delete_file(&common::access(), &file_id("f1"))
        .await
        .expect("Delete failed");
}

#[tokio::test]
async fn test_delete_missing_file_is_not_found() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/files/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "File not found: gone."}
        })))
        .mount(&server)
        .await;

    let err = source
        .delete_file(&common::access(), &file_id("gone"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<cortex_drive::DriveApiError>(),
        Some(cortex_drive::DriveApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_rename_file_patches_name() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("PATCH"))
        .and(path("/files/f1"))
        .and(body_json(serde_json::json!({"name": "Budget 2024.xlsx"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "f1",
            "name": "Budget 2024.xlsx"
        })))
        .expect(1)
        .mount(&server)
        .await;

    source
        .rename_file(&common::access(), &file_id("f1"), "Budget 2024.xlsx")
        .await
        .expect("Rename failed");
}

#[tokio::test]
async fn test_rename_forbidden() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("PATCH"))
        .and(path("/files/f1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "Insufficient permissions"}
        })))
        .mount(&server)
        .await;

    let err = source
        .rename_file(&common::access(), &file_id("f1"), "x")
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<cortex_drive::DriveApiError>(),
        Some(cortex_drive::DriveApiError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("DELETE"))
        .and(path("/files/f1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = source
        .delete_file(&common::access(), &file_id("f1"))
        .await
        .unwrap_err();

    match err.downcast_ref::<cortex_drive::DriveApiError>() {
        Some(cortex_drive::DriveApiError::TooManyRequests { retry_after }) => {
            assert_eq!(*retry_after, Some(std::time::Duration::from_secs(7)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
