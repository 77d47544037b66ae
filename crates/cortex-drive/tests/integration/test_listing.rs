//! Integration tests for the paginated Drive listing

use cortex_core::ports::IDriveSource;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_single_page_listing() {
    let (server, source) = common::setup_drive_mock().await;
    common::mount_first_page(
        &server,
        serde_json::json!([common::drive_file("f1", "application/pdf", Some("1024"))]),
        None,
    )
    .await;

    let files = source.list_all_files(&common::access()).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, "f1");
    assert_eq!(files[0].size.as_deref(), Some("1024"));
    assert_eq!(
        files[0].primary_owner().unwrap().display_name.as_deref(),
        Some("Alice")
    );
    assert_eq!(files[0].shared, Some(true));
}

#[tokio::test]
async fn test_follows_page_tokens_until_exhausted() {
    let (server, source) = common::setup_drive_mock().await;
    common::mount_first_page(
        &server,
        serde_json::json!([common::drive_file("f1", "application/pdf", Some("1"))]),
        Some("page-2"),
    )
    .await;
    common::mount_next_page(
        &server,
        "page-2",
        serde_json::json!([
            common::drive_file("f2", "image/png", Some("2")),
            common::drive_file("f3", "image/png", None)
        ]),
        None,
    )
    .await;

    let files = source.list_all_files(&common::access()).await.unwrap();

    let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["f1", "f2", "f3"]);
    assert!(files[2].size.is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_listing_sends_page_size_fields_and_bearer() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageSize", "100"))
        .and(query_param("fields", cortex_drive::listing::LISTING_FIELDS))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"files": []})))
        .expect(1)
        .mount(&server)
        .await;

    let files = source.list_all_files(&common::access()).await.unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_failing_second_page_aborts_listing() {
    let (server, source) = common::setup_drive_mock().await;
    common::mount_first_page(
        &server,
        serde_json::json!([common::drive_file("f1", "application/pdf", Some("1"))]),
        Some("page-2"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"code": 500, "message": "Backend Error"}
        })))
        .mount(&server)
        .await;

    let err = source.list_all_files(&common::access()).await.unwrap_err();
    assert!(format!("{err:#}").contains("Backend Error"));
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let err = source.list_all_files(&common::access()).await.unwrap_err();
    let api_error = err
        .downcast_ref::<cortex_drive::DriveApiError>()
        .expect("typed Drive error");
    assert!(matches!(api_error, cortex_drive::DriveApiError::Unauthorized(m) if m == "Invalid Credentials"));
}

#[tokio::test]
async fn test_malformed_body_is_an_error() {
    let (server, source) = common::setup_drive_mock().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    assert!(source.list_all_files(&common::access()).await.is_err());
}
