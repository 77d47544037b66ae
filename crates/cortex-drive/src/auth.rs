//! OAuth2 authentication for Google Drive
//!
//! Implements the server-side Authorization Code flow against Google's
//! identity platform: the browser is sent to the consent page, the web client
//! posts the returned code back, and the server exchanges it for tokens.
//! Offline access is requested so a refresh token is issued, and consent is
//! forced so a new one is issued on every sign-in.
//!
//! ## Components
//!
//! - [`GoogleOAuthConfig`] - Client credentials, endpoints and scopes
//! - [`GoogleAuthAdapter`] - Implements `IIdentityProvider` and
//!   `ICredentialProvisioner`

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tracing::{debug, info};

use cortex_core::ports::{
    AccessToken, ICredentialProvisioner, IIdentityProvider, IdentityProfile, IssuedTokens,
};

/// Google OAuth2 authorization endpoint
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth2 token endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google profile endpoint
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes for profile lookup and read access to Drive
const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/drive.readonly",
];

// ============================================================================
// GoogleOAuthConfig
// ============================================================================

/// Configuration for the Google OAuth2 flow
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID from the Google Cloud console
    pub client_id: String,
    /// OAuth client secret (web application clients have one)
    pub client_secret: Option<String>,
    /// Redirect URI registered for the client
    pub redirect_uri: String,
    /// OAuth scopes to request
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    /// Creates a config with Google's public endpoints and the default scopes
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: redirect_uri.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }

    /// Creates a config with custom scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Overrides the token endpoint (useful for testing)
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Overrides the profile endpoint (useful for testing)
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }
}

// ============================================================================
// Google API response types
// ============================================================================

/// Response from the userinfo endpoint
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    email: Option<String>,
    name: Option<String>,
}

// ============================================================================
// GoogleAuthAdapter
// ============================================================================

/// Google identity and credential adapter
///
/// Builds consent URLs, exchanges authorization codes, refreshes access
/// tokens and reads the signed-in account's profile.
pub struct GoogleAuthAdapter {
    client: BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>,
    scopes: Vec<String>,
    http: reqwest::Client,
    userinfo_url: String,
}

impl GoogleAuthAdapter {
    /// Creates a new GoogleAuthAdapter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configured endpoint is not a valid URL.
    pub fn new(config: &GoogleOAuthConfig) -> Result<Self> {
        let mut client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(AuthUrl::new(config.auth_url.clone()).context("Invalid authorization URL")?)
            .set_token_uri(TokenUrl::new(config.token_url.clone()).context("Invalid token URL")?)
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone()).context("Invalid redirect URI")?,
            )
            .set_auth_type(AuthType::RequestBody);
        if let Some(secret) = &config.client_secret {
            client = client.set_client_secret(ClientSecret::new(secret.clone()));
        }

        // Token endpoints must not be followed across redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build OAuth HTTP client")?;

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
            http,
            userinfo_url: config.userinfo_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl IIdentityProvider for GoogleAuthAdapter {
    fn authorization_url(&self) -> Result<String> {
        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, _csrf_token) = auth_request.url();
        debug!("Generated authorization URL");
        Ok(auth_url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<IssuedTokens> {
        info!("Exchanging authorization code for tokens");

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .context("Failed to exchange authorization code")?;

        let expires_at = token_result
            .expires_in()
            .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
            .unwrap_or_else(|| Utc::now() + Duration::hours(1));

        let tokens = IssuedTokens {
            access_token: AccessToken::new(token_result.access_token().secret().clone()),
            refresh_token: token_result.refresh_token().map(|t| t.secret().to_string()),
            expires_at,
        };

        info!(
            has_refresh_token = tokens.refresh_token.is_some(),
            "Successfully obtained OAuth tokens"
        );
        Ok(tokens)
    }

    async fn fetch_profile(&self, access: &AccessToken) -> Result<IdentityProfile> {
        debug!("Fetching Google profile");

        let info: UserInfoResponse = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access.secret())
            .send()
            .await
            .context("Failed to fetch userinfo")?
            .error_for_status()
            .context("GET userinfo returned error status")?
            .json()
            .await
            .context("Failed to parse userinfo response")?;

        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .context("Google profile has no email address")?;

        Ok(IdentityProfile {
            email,
            name: info.name,
        })
    }
}

#[async_trait::async_trait]
impl ICredentialProvisioner for GoogleAuthAdapter {
    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        debug!("Refreshing access token");

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .context("Failed to refresh token")?;

        Ok(AccessToken::new(token_result.access_token().secret().clone()))
    }
}
