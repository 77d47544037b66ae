//! Use-case error taxonomy
//!
//! Every use case reports failures as a [`CoreError`] with an explicit kind.
//! The kind decides the HTTP-equivalent severity ([`CoreError::status_code`])
//! and whether the message may be shown to the caller
//! ([`CoreError::is_operational`]).

use thiserror::Error;

/// Errors surfaced by use cases
#[derive(Debug, Error)]
pub enum CoreError {
    /// Missing or expired credential, or no valid session
    #[error("{0}")]
    Unauthorized(String),

    /// The requested record does not exist for this user
    #[error("{0}")]
    NotFound(String),

    /// The request was rejected before any remote or store call
    #[error("{0}")]
    Validation(String),

    /// A remote delete or rename failed
    #[error("{}", mutation_message(.operation))]
    RemoteMutation {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A remote read (listing, profile) failed
    #[error("{message}")]
    Remote {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// An upstream service throttled the request
    #[error("{0}")]
    RateLimited(String),

    /// An upstream service is temporarily failing
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The assistant could not produce an answer
    #[error("{message}")]
    Assistant { status: u16, message: String },

    /// The local store failed
    #[error("Storage failure: {0:#}")]
    Storage(#[source] anyhow::Error),

    /// Anything unexpected
    #[error("Internal error: {0:#}")]
    Internal(#[source] anyhow::Error),
}

fn mutation_message(operation: &str) -> String {
    match operation {
        "delete" => "Failed to delete file from Google Drive".to_string(),
        other => format!("Failed to {other} file in Google Drive"),
    }
}

impl CoreError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Remote {
            message: message.into(),
            source,
        }
    }

    /// HTTP-equivalent status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::RateLimited(_) => 429,
            Self::ServiceUnavailable(_) => 503,
            Self::Assistant { status, .. } => *status,
            Self::RemoteMutation { .. }
            | Self::Remote { .. }
            | Self::Storage(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns true when the message is safe to show to the caller.
    ///
    /// Storage and internal failures are not: they are logged in full and
    /// reported generically.
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}
