//! Configuration module for Cortex.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Cortex.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub auth: AuthConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub bind_addr: String,
    /// Browser origin allowed by CORS.
    pub cors_origin: String,
}

/// Local store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

/// Google OAuth client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Where Google sends the browser back after consent.
    pub redirect_uri: String,
}

/// Session token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Required to start the server.
    pub jwt_secret: Option<String>,
    /// Lifetime of an issued session token, in hours.
    pub token_ttl_hours: u64,
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// `None` disables the assistant; questions then fail with a configuration error.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cortex/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cortex")
            .join("config.yaml")
    }

    /// Overlay values from the process environment.
    ///
    /// | Variable               | Field                     |
    /// |------------------------|---------------------------|
    /// | `BIND_ADDR`            | `server.bind_addr`        |
    /// | `CLIENT_URL`           | `server.cors_origin`      |
    /// | `DATABASE_PATH`        | `database.path`           |
    /// | `GOOGLE_CLIENT_ID`     | `google.client_id`        |
    /// | `GOOGLE_CLIENT_SECRET` | `google.client_secret`    |
    /// | `GOOGLE_REDIRECT_URI`  | `google.redirect_uri`     |
    /// | `JWT_SECRET`           | `auth.jwt_secret`         |
    /// | `JWT_EXPIRES_IN_HOURS` | `auth.token_ttl_hours`    |
    /// | `OPENAI_API_KEY`       | `assistant.api_key`       |
    /// | `OPENAI_MODEL`         | `assistant.model`         |
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = get("CLIENT_URL") {
            self.server.cors_origin = v;
        }
        if let Some(v) = get("DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = get("GOOGLE_CLIENT_ID") {
            self.google.client_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_CLIENT_SECRET") {
            self.google.client_secret = Some(v);
        }
        if let Some(v) = get("GOOGLE_REDIRECT_URI") {
            self.google.redirect_uri = v;
        }
        if let Some(v) = get("JWT_SECRET") {
            self.auth.jwt_secret = Some(v);
        }
        if let Some(hours) = get("JWT_EXPIRES_IN_HOURS").and_then(|v| v.trim().parse().ok()) {
            self.auth.token_ttl_hours = hours;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.assistant.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.assistant.model = v;
        }
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("cortex")
                .join("cortex.db"),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: "http://localhost:5173/auth/callback".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 168,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"auth.token_ttl_hours"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Minimum HS256 secret length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. A missing JWT secret
    /// is not a validation error here; the server checks it at startup.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- server ---
        if self.server.bind_addr.trim().is_empty() {
            errors.push(ValidationError {
                field: "server.bind_addr".into(),
                message: "must not be empty".into(),
            });
        }

        // --- auth ---
        if self.auth.token_ttl_hours == 0 {
            errors.push(ValidationError {
                field: "auth.token_ttl_hours".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LEN {
                errors.push(ValidationError {
                    field: "auth.jwt_secret".into(),
                    message: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use cortex_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .bind_addr("0.0.0.0:8080")
///     .jwt_secret("0123456789abcdef0123456789abcdef")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- server ---

    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server.bind_addr = addr.into();
        self
    }

    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.server.cors_origin = origin.into();
        self
    }

    // --- database ---

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    // --- google ---

    pub fn google_client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.google.client_id = Some(id.into());
        self.config.google.client_secret = Some(secret.into());
        self
    }

    pub fn google_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.google.redirect_uri = uri.into();
        self
    }

    // --- auth ---

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.auth.jwt_secret = Some(secret.into());
        self
    }

    pub fn token_ttl_hours(mut self, hours: u64) -> Self {
        self.config.auth.token_ttl_hours = hours;
        self
    }

    // --- assistant ---

    pub fn assistant_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.assistant.api_key = Some(key.into());
        self
    }

    pub fn assistant_model(mut self, model: impl Into<String>) -> Self {
        self.config.assistant.model = model.into();
        self
    }

    pub fn assistant_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.assistant.base_url = url.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
