//! Cortex Server - HTTP surface for the Drive dashboard
//!
//! Wires the `cortex-core` use cases behind an axum router:
//! - Google sign-in and session tokens
//! - Drive sync, file listing, statistics and file management
//! - Questions to the assistant
//!
//! ## Modules
//!
//! - [`auth`] - Session token issuing/verification and bearer extraction
//! - [`error`] - `ApiError` and the JSON error body
//! - [`routes`] - Router, middleware and handlers
//! - [`state`] - Shared application state

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::app_router;
pub use state::{Adapters, AppState};
