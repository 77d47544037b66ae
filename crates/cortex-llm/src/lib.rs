//! Cortex LLM - OpenAI assistant adapter
//!
//! Implements the `IAssistant` port against the OpenAI Responses API.
//!
//! ## Modules
//!
//! - [`client`] - HTTP client and status classification
//! - [`extract`] - Reply extraction over the loosely specified response shape

pub mod client;
pub mod extract;

pub use client::{AssistantSettings, OpenAiAssistant};
