//! OpenAI Responses API client
//!
//! Sends one assembled prompt to `POST {base_url}/responses` and classifies
//! the outcome into [`AssistantError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cortex_core::ports::{AssistantRequest, IAssistant};
//! use cortex_llm::{AssistantSettings, OpenAiAssistant};
//!
//! # async fn example() -> Result<(), cortex_core::ports::AssistantError> {
//! let assistant = OpenAiAssistant::new(AssistantSettings::new(Some("sk-...".to_string())));
//! let reply = assistant
//!     .complete(&AssistantRequest {
//!         system_prompt: "You are helpful.".to_string(),
//!         context: None,
//!         message: "Hello".to_string(),
//!     })
//!     .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use cortex_core::ports::{AssistantError, AssistantRequest, IAssistant};

use crate::extract::extract_reply;

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1000;

// ============================================================================
// Settings
// ============================================================================

/// Connection settings for the assistant
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// `None` leaves the assistant unconfigured; every call then fails
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl AssistantSettings {
    /// Creates settings for the public API with the default model
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL (useful for testing and compatible gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

// ============================================================================
// Request body
// ============================================================================

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage>,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

fn input_messages(request: &AssistantRequest) -> Vec<InputMessage> {
    let mut input = vec![InputMessage {
        role: "system",
        content: request.system_prompt.clone(),
    }];
    if let Some(context) = &request.context {
        input.push(InputMessage {
            role: "system",
            content: format!("Additional context: {context}"),
        });
    }
    input.push(InputMessage {
        role: "user",
        content: request.message.clone(),
    });
    input
}

// ============================================================================
// OpenAiAssistant
// ============================================================================

/// Assistant adapter backed by the OpenAI Responses API
pub struct OpenAiAssistant {
    http: Client,
    settings: AssistantSettings,
}

impl OpenAiAssistant {
    pub fn new(settings: AssistantSettings) -> Self {
        Self {
            http: Client::new(),
            settings: AssistantSettings {
                api_key: settings.api_key.filter(|k| !k.trim().is_empty()),
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
        }
    }

    /// Whether an API key is configured
    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }
}

#[async_trait::async_trait]
impl IAssistant for OpenAiAssistant {
    async fn complete(&self, request: &AssistantRequest) -> Result<String, AssistantError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(AssistantError::NotConfigured)?;

        let body = ResponsesRequest {
            model: &self.settings.model,
            input: input_messages(request),
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        };

        debug!(model = %self.settings.model, "Sending assistant request");

        let response = self
            .http
            .post(format!("{}/responses", self.settings.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AssistantError::Transport(e.to_string()))?;

        extract_reply(&json).ok_or_else(|| {
            warn!("Assistant response held no reply text");
            AssistantError::NoReply
        })
    }
}

/// Maps an unsuccessful status to an [`AssistantError`]
fn classify_status(status: StatusCode, body: &str) -> AssistantError {
    match status {
        StatusCode::UNAUTHORIZED => AssistantError::InvalidApiKey,
        StatusCode::TOO_MANY_REQUESTS => AssistantError::RateLimited,
        s if s.is_server_error() => AssistantError::Unavailable,
        s => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_string))
                .unwrap_or_else(|| s.canonical_reason().unwrap_or("unknown error").to_string());
            AssistantError::Upstream {
                status: s.as_u16(),
                message,
            }
        }
    }
}
