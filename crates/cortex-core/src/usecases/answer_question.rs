//! Question answering use case
//!
//! Assembles a prompt from the user's file metadata and forwards the question
//! to the assistant port.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{newtypes::UserId, FileRecord};
use crate::error::CoreError;
use crate::ports::{AssistantError, AssistantRequest, IAssistant, IStateRepository};

const PERSONA: &str = "You are Cortex, an intelligent assistant for the user's Google Drive. \
You have access to the user's file metadata. Use it to answer questions about their files.";

const CSV_HEADER: &str = "Name,Type,Size,Date,Owner,Starred";

/// Use case answering natural-language questions about a user's files
pub struct AnswerQuestionUseCase {
    assistant: Arc<dyn IAssistant + Send + Sync>,
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

impl AnswerQuestionUseCase {
    /// Creates a new AnswerQuestionUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `assistant` - Language model adapter
    /// * `state_repository` - Source of the user's file metadata
    pub fn new(
        assistant: Arc<dyn IAssistant + Send + Sync>,
        state_repository: Arc<dyn IStateRepository + Send + Sync>,
    ) -> Self {
        Self {
            assistant,
            state_repository,
        }
    }

    /// Asks the assistant a question about the user's files
    ///
    /// # Arguments
    ///
    /// * `user_id` - The asking user; only their records enter the prompt
    /// * `message` - The question, trimmed before use
    /// * `context` - Optional extra context, sent as a second system message
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] when the message is blank
    /// - [`CoreError::RateLimited`] / [`CoreError::ServiceUnavailable`] when the provider throttles or fails
    /// - [`CoreError::Assistant`] for every other assistant failure
    pub async fn execute(
        &self,
        user_id: &UserId,
        message: &str,
        context: Option<&str>,
    ) -> Result<String, CoreError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::validation(
                "Message is required and must be a non-empty string",
            ));
        }

        let files = self
            .state_repository
            .list_files(user_id)
            .await
            .map_err(CoreError::Storage)?;
        debug!(user_id = %user_id, files = files.len(), "Building assistant prompt");

        let request = AssistantRequest {
            system_prompt: system_prompt(&files),
            context: context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            message: message.to_string(),
        };

        self.assistant.complete(&request).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Assistant request failed");
            classify(e)
        })
    }
}

fn classify(error: AssistantError) -> CoreError {
    let message = error.to_string();
    match error {
        AssistantError::RateLimited => CoreError::RateLimited(message),
        AssistantError::Unavailable => CoreError::ServiceUnavailable(message),
        // A rejected key is a server misconfiguration, not a session failure
        AssistantError::NotConfigured | AssistantError::InvalidApiKey | AssistantError::NoReply => {
            CoreError::Assistant {
                status: 500,
                message,
            }
        }
        AssistantError::Upstream { .. } | AssistantError::Transport(_) => CoreError::Assistant {
            status: 502,
            message,
        },
    }
}

// ============================================================================
// Prompt assembly
// ============================================================================

/// Renders the persona and the user's files into one system prompt
///
/// Files are listed as CSV with the header `Name,Type,Size,Date,Owner,Starred`.
pub fn system_prompt(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return format!(
            "{PERSONA}\n\nThe user currently has no files indexed. \
If they ask about their files, suggest syncing Google Drive first."
        );
    }

    let mut prompt = format!(
        "{PERSONA}\n\nThe user has {} files. Their metadata follows as CSV:\n\n{CSV_HEADER}\n",
        files.len()
    );
    for file in files {
        let owner = if file.owner_name.is_empty() {
            &file.owner_email
        } else {
            &file.owner_name
        };
        // Writing into a String cannot fail
        let _ = writeln!(
            prompt,
            "{},{},{},{},{},{}",
            csv_field(&file.name),
            csv_field(&file.mime_type),
            file.size,
            file.modified_time.format("%Y-%m-%d"),
            csv_field(owner),
            if file.is_starred { "yes" } else { "no" },
        );
    }
    prompt
}

/// Quotes a field when it contains a comma, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
