//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup for the Drive v3 listing
//! endpoint and the Google OAuth2 endpoints.

use cortex_core::ports::AccessToken;
use cortex_drive::auth::{GoogleAuthAdapter, GoogleOAuthConfig};
use cortex_drive::provider::GoogleDriveSource;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-token";

/// Starts a mock server and returns it with a source pointing at it
pub async fn setup_drive_mock() -> (MockServer, GoogleDriveSource) {
    let server = MockServer::start().await;
    let source = GoogleDriveSource::with_base_url(server.uri());
    (server, source)
}

pub fn access() -> AccessToken {
    AccessToken::new(TEST_TOKEN)
}

/// A Drive file resource as returned by the listing endpoint
pub fn drive_file(id: &str, mime_type: &str, size: Option<&str>) -> serde_json::Value {
    let mut file = serde_json::json!({
        "id": id,
        "name": format!("{id}.bin"),
        "mimeType": mime_type,
        "webViewLink": format!("https://drive.google.com/file/d/{id}/view"),
        "createdTime": "2024-01-01T00:00:00.000Z",
        "modifiedTime": "2024-02-01T00:00:00.000Z",
        "owners": [{"displayName": "Alice", "emailAddress": "alice@example.com"}],
        "starred": false,
        "shared": true
    });
    if let Some(size) = size {
        file["size"] = serde_json::Value::String(size.to_string());
    }
    file
}

/// Mounts the first listing page (no `pageToken` in the request)
pub async fn mount_first_page(
    server: &MockServer,
    files: serde_json::Value,
    next_page_token: Option<&str>,
) {
    let mut body = serde_json::json!({ "files": files });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = serde_json::Value::String(token.to_string());
    }

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a continuation page answered for the given `pageToken`
pub async fn mount_next_page(
    server: &MockServer,
    page_token: &str,
    files: serde_json::Value,
    next_page_token: Option<&str>,
) {
    let mut body = serde_json::json!({ "files": files });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = serde_json::Value::String(token.to_string());
    }

    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("pageToken", page_token))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Builds an auth adapter whose token and profile endpoints point at the mock server
pub fn auth_adapter(server: &MockServer) -> GoogleAuthAdapter {
    let config = GoogleOAuthConfig::new(
        "client-id",
        Some("client-secret".to_string()),
        "http://localhost:5173/auth/callback",
    )
    .with_token_url(format!("{}/token", server.uri()))
    .with_userinfo_url(format!("{}/oauth2/v2/userinfo", server.uri()));

    GoogleAuthAdapter::new(&config).expect("valid test config")
}
