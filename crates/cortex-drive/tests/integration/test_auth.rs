//! Integration tests for the Google sign-in flow

use cortex_core::ports::{AccessToken, ICredentialProvisioner, IIdentityProvider};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

#[tokio::test]
async fn test_exchange_code_returns_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.access",
            "refresh_token": "1//refresh",
            "token_type": "Bearer",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/drive.readonly"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = common::auth_adapter(&server)
        .exchange_code("auth-code-1")
        .await
        .expect("exchange failed");

    assert_eq!(tokens.access_token.secret(), "ya29.access");
    assert_eq!(tokens.refresh_token.as_deref(), Some("1//refresh"));
    assert!(tokens.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn test_exchange_without_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.access",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(&server)
        .await;

    let tokens = common::auth_adapter(&server)
        .exchange_code("code")
        .await
        .unwrap();
    assert!(tokens.refresh_token.is_none());
}

#[tokio::test]
async fn test_rejected_code_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .mount(&server)
        .await;

    assert!(common::auth_adapter(&server)
        .exchange_code("stale")
        .await
        .is_err());
}

#[tokio::test]
async fn test_refresh_returns_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let access = common::auth_adapter(&server)
        .refresh("1//refresh")
        .await
        .unwrap();
    assert_eq!(access.secret(), "ya29.fresh");
}

#[tokio::test]
async fn test_fetch_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/v2/userinfo"))
        .and(header("authorization", "Bearer ya29.access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "1234",
            "email": "alice@example.com",
            "verified_email": true,
            "name": "Alice Example",
            "picture": "https://example.com/a.png"
        })))
        .mount(&server)
        .await;

    let profile = common::auth_adapter(&server)
        .fetch_profile(&AccessToken::new("ya29.access"))
        .await
        .unwrap();

    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.name.as_deref(), Some("Alice Example"));
}

#[tokio::test]
async fn test_profile_without_email_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/v2/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "1234",
            "name": "No Mail"
        })))
        .mount(&server)
        .await;

    assert!(common::auth_adapter(&server)
        .fetch_profile(&AccessToken::new("t"))
        .await
        .is_err());
}
