//! HTTP error mapping
//!
//! Every failure leaves the server as `{"status": "fail" | "error", "message": ...}`.
//! `fail` marks client errors (4xx), `error` server errors (5xx). Failures
//! whose message is not safe to show are logged in full and answered with a
//! generic 500.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cortex_core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// Message returned for failures whose detail must not leak
pub const GENERIC_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Internal server error: {0:#}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        Self::Internal(error.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Core(e) => StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_operational(&self) -> bool {
        match self {
            Self::Core(e) => e.is_operational(),
            Self::Internal(_) => false,
            _ => true,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (status, message) = if !self.is_operational() {
            tracing::error!(error = ?self, "Unexpected failure");
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_MESSAGE.to_string())
        } else {
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
            }
            (status, self.to_string())
        };

        let body = ErrorBody {
            status: if status.is_client_error() { "fail" } else { "error" },
            message,
        };
        (status, Json(body)).into_response()
    }
}
