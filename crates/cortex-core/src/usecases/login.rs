//! Sign-in use case
//!
//! Completes the Google consent flow: the one-time authorization code is
//! exchanged for tokens, the account profile is fetched, and the user is
//! created or updated by email. A refresh credential is only issued on first
//! consent, so an existing one is kept when the exchange returns none.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{newtypes::Email, User};
use crate::error::CoreError;
use crate::ports::{IIdentityProvider, IStateRepository};

/// Use case for the Google sign-in flow
pub struct LoginUseCase {
    identity: Arc<dyn IIdentityProvider + Send + Sync>,
    state_repository: Arc<dyn IStateRepository + Send + Sync>,
}

impl LoginUseCase {
    /// Creates a new LoginUseCase with the required dependencies
    ///
    /// # Arguments
    ///
    /// * `identity` - Consent URL, code exchange and profile lookup
    /// * `state_repository` - Persistent storage for users
    pub fn new(
        identity: Arc<dyn IIdentityProvider + Send + Sync>,
        state_repository: Arc<dyn IStateRepository + Send + Sync>,
    ) -> Self {
        Self {
            identity,
            state_repository,
        }
    }

    /// Returns the consent page URL the browser should be sent to
    pub fn authorization_url(&self) -> Result<String, CoreError> {
        self.identity.authorization_url().map_err(CoreError::Internal)
    }

    /// Exchanges an authorization code and upserts the signed-in user
    ///
    /// When the profile carries no display name, the local part of the email
    /// is used instead.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] when the code is blank
    /// - [`CoreError::Unauthorized`] when the code is rejected
    /// - [`CoreError::Remote`] when the profile cannot be read or is invalid
    /// - [`CoreError::Storage`] when the user cannot be saved
    pub async fn execute(&self, code: &str) -> Result<User, CoreError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CoreError::validation("Authorization code is required"));
        }

        // Step 1: code exchange
        let tokens = self.identity.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "Authorization code rejected");
            CoreError::unauthorized("Google authentication failed")
        })?;

        // Step 2: profile
        let profile = self
            .identity
            .fetch_profile(&tokens.access_token)
            .await
            .map_err(|e| CoreError::remote("Failed to fetch Google profile", e))?;

        let email = Email::new(profile.email.clone()).map_err(|e| {
            CoreError::remote("Google profile has an invalid email", anyhow::Error::new(e))
        })?;

        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| local_part(&email));

        // Step 3: upsert by email
        let user = self
            .state_repository
            .upsert_user_by_email(&email, &name, tokens.refresh_token.as_deref())
            .await
            .map_err(CoreError::Storage)?;

        info!(user_id = %user.id(), drive_connected = user.is_drive_connected(), "User signed in");
        Ok(user)
    }
}

fn local_part(email: &Email) -> String {
    email
        .as_str()
        .split('@')
        .next()
        .unwrap_or_default()
        .to_string()
}
