//! Cortex Drive - Google Drive API client
//!
//! Provides async client for:
//! - OAuth2 authentication (consent URL, code exchange, token refresh, profile)
//! - Paginated file listing via Google Drive v3
//! - File delete and rename
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 flow and profile lookup
//! - [`client`] - Google Drive v3 HTTP client
//! - [`listing`] - Paginated listing of a user's files
//! - [`provider`] - `IDriveSource` implementation

pub mod auth;
pub mod client;
pub mod listing;
pub mod provider;

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when communicating with the Google Drive API
#[derive(Debug, Error)]
pub enum DriveApiError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Server-suggested wait, when the response carried one
        retry_after: Option<Duration>,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other unsuccessful status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
