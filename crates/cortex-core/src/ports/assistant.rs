//! Assistant port (driven/secondary port)
//!
//! Question answering is delegated to a third-party language model. Unlike
//! the other ports this one returns a typed [`AssistantError`], because the
//! caller needs to tell throttling apart from outages and misconfiguration.

use thiserror::Error;

/// A fully assembled prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantRequest {
    /// Persona plus the user's file metadata
    pub system_prompt: String,
    /// Optional extra context supplied by the caller
    pub context: Option<String>,
    /// The user's question
    pub message: String,
}

/// Failures reported by an assistant adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssistantError {
    /// No API key is configured
    #[error("OpenAI API key is not configured. Please set OPENAI_API_KEY in environment variables.")]
    NotConfigured,

    /// The provider rejected the API key
    #[error("Invalid OpenAI API key")]
    InvalidApiKey,

    /// The provider throttled the request
    #[error("OpenAI API rate limit exceeded. Please try again later.")]
    RateLimited,

    /// The provider failed with a server error
    #[error("OpenAI service error. Please try again later.")]
    Unavailable,

    /// The provider answered with another error status
    #[error("OpenAI API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// The response held no usable reply
    #[error("No response generated from AI model")]
    NoReply,

    /// The request never reached the provider
    #[error("Failed to generate response: {0}")]
    Transport(String),
}

/// Port trait for the language model
#[async_trait::async_trait]
pub trait IAssistant: Send + Sync {
    /// Sends the prompt and returns the model's reply text
    async fn complete(&self, request: &AssistantRequest) -> Result<String, AssistantError>;
}
