//! Credential and identity ports (driven/secondary ports)
//!
//! - [`ICredentialProvisioner`] turns a stored refresh credential into a
//!   short-lived access credential.
//! - [`IIdentityProvider`] drives the sign-in flow: consent URL, code
//!   exchange and profile lookup.

use std::fmt;

use chrono::{DateTime, Utc};

// ============================================================================
// AccessToken
// ============================================================================

/// A short-lived bearer credential for the remote Drive
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for use in an `Authorization` header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Tokens issued by a code exchange
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: AccessToken,
    /// Only issued on first consent (or when consent is forced)
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Profile of the signed-in account as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub email: String,
    pub name: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

/// Port trait for minting access credentials
#[async_trait::async_trait]
pub trait ICredentialProvisioner: Send + Sync {
    /// Exchanges a long-lived refresh credential for a fresh access credential
    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<AccessToken>;
}

/// Port trait for the sign-in flow
#[async_trait::async_trait]
pub trait IIdentityProvider: Send + Sync {
    /// Builds the consent URL the browser is sent to
    fn authorization_url(&self) -> anyhow::Result<String>;

    /// Exchanges an authorization code for tokens
    async fn exchange_code(&self, code: &str) -> anyhow::Result<IssuedTokens>;

    /// Fetches the profile of the account the access credential belongs to
    async fn fetch_profile(&self, access: &AccessToken) -> anyhow::Result<IdentityProfile>;
}
