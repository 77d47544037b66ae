//! Google Drive v3 HTTP client
//!
//! Provides a typed HTTP client for the Google Drive v3 REST API.
//! Handles the bearer header, endpoint construction and the mapping of
//! unsuccessful statuses to [`DriveApiError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cortex_drive::client::DriveClient;
//! use reqwest::Method;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let response = client.send(client.request(Method::GET, "/about?fields=user")).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::DriveApiError;

/// Base URL for Google Drive API v3
pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

// ============================================================================
// Error body
// ============================================================================

/// Google API error envelope: `{"error": {"code": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive API calls
///
/// Wraps `reqwest::Client` with the bearer header and base URL
/// construction. One instance is bound to one access token.
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Short-lived OAuth2 access token
    access_token: String,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token with Drive scope
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_http_client(Client::new(), access_token, base_url)
    }

    /// Creates a DriveClient that shares an existing connection pool
    pub fn with_http_client(
        client: Client,
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL and adds the Authorization header.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, PATCH, DELETE, etc.)
    /// * `path` - API path relative to base URL (e.g., "/files")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Builds the URL of a single file resource
    ///
    /// The ID is escaped as one path segment.
    pub fn file_url(&self, id: &str) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url).context("Invalid Drive base URL")?;
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("Drive base URL cannot carry a path"))?
            .pop_if_empty()
            .push("files")
            .push(id);
        Ok(url)
    }

    /// Creates an authenticated request builder for an absolute URL
    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.access_token)
    }

    /// Sends a request and turns every unsuccessful status into a [`DriveApiError`]
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, DriveApiError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(error_from_response(response).await)
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Classifies an unsuccessful response by status code
async fn error_from_response(response: Response) -> DriveApiError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    debug!(status = status.as_u16(), %message, "Drive API returned error status");

    match status {
        StatusCode::UNAUTHORIZED => DriveApiError::Unauthorized(message),
        StatusCode::FORBIDDEN => DriveApiError::Forbidden(message),
        StatusCode::NOT_FOUND => DriveApiError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!(?retry_after, "Drive API rate limit hit");
            DriveApiError::TooManyRequests { retry_after }
        }
        s if s.is_server_error() => DriveApiError::ServerError(message),
        s => DriveApiError::Status {
            status: s.as_u16(),
            message,
        },
    }
}
