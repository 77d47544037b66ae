//! Cortex HTTP server (cortexd)
//!
//! Loads the YAML configuration, overlays the process environment (a `.env`
//! file is read first when present), wires the Google, SQLite and OpenAI
//! adapters into the use cases and serves the API until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cortex_cache::{DatabasePool, SqliteStateRepository};
use cortex_core::config::Config;
use cortex_drive::auth::{GoogleAuthAdapter, GoogleOAuthConfig};
use cortex_drive::provider::GoogleDriveSource;
use cortex_llm::{AssistantSettings, OpenAiAssistant};
use cortex_server::auth::SessionKeys;
use cortex_server::{app_router, Adapters, AppState};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cortexd", version, about = "Cortex Drive dashboard server")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    bind: Option<String>,
}

// ============================================================================
// Startup
// ============================================================================

fn load_config(cli: &Cli) -> Config {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&path);
    config.apply_env_overrides();
    if let Some(bind) = &cli.bind {
        config.server.bind_addr = bind.clone();
    }
    config
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Builds the adapters from the configuration
fn build_adapters(config: &Config, repository: SqliteStateRepository) -> Result<Adapters> {
    let Some(client_id) = config.google.client_id.clone() else {
        bail!("google.client_id is required (set GOOGLE_CLIENT_ID)");
    };

    let oauth = GoogleOAuthConfig::new(
        client_id,
        config.google.client_secret.clone(),
        config.google.redirect_uri.clone(),
    );
    let google =
        Arc::new(GoogleAuthAdapter::new(&oauth).context("Invalid Google OAuth settings")?);

    let assistant = OpenAiAssistant::new(
        AssistantSettings::new(config.assistant.api_key.clone())
            .with_model(config.assistant.model.clone())
            .with_base_url(config.assistant.base_url.clone()),
    );
    if !assistant.is_configured() {
        warn!("No assistant API key configured; chat requests will fail");
    }

    Ok(Adapters {
        drive: Arc::new(GoogleDriveSource::new()),
        credentials: google.clone(),
        identity: google,
        assistant: Arc::new(assistant),
        state_repository: Arc::new(repository),
    })
}

// ============================================================================
// Shutdown
// ============================================================================

/// Cancels `token` on SIGINT or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli);
    init_tracing(&config);

    info!("Cortex server starting (cortexd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!(field = %e.field, "{}", e.message);
        }
        bail!("Invalid configuration ({} errors)", errors.len());
    }

    let Some(jwt_secret) = config.auth.jwt_secret.as_deref() else {
        bail!("auth.jwt_secret is required (set JWT_SECRET)");
    };
    let sessions = SessionKeys::new(jwt_secret, config.auth.token_ttl_hours);

    let pool = DatabasePool::new(&config.database.path)
        .await
        .context("Failed to open the database")?;
    let repository = SqliteStateRepository::new(pool.pool().clone());

    let adapters = build_adapters(&config, repository)?;
    let state = AppState::new(adapters, sessions, config.server.cors_origin.clone());
    let router = app_router(state);

    let listener = TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "Listening");

    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Cortex server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "cortexd",
            "--config",
            "/tmp/cortex.yaml",
            "--bind",
            "0.0.0.0:9000",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/cortex.yaml")));
        assert_eq!(cli.bind.as_deref(), Some("0.0.0.0:9000"));
    }

    #[test]
    fn test_bind_flag_overrides_config() {
        let cli = Cli::parse_from([
            "cortexd",
            "--config",
            "/nonexistent/cortex.yaml",
            "--bind",
            "127.0.0.1:4321",
        ]);
        assert_eq!(load_config(&cli).server.bind_addr, "127.0.0.1:4321");
    }

    #[tokio::test]
    async fn test_missing_client_id_is_rejected() {
        let mut config = Config::default();
        config.google.client_id = None;
        let pool = DatabasePool::in_memory().await.unwrap();
        let repository = SqliteStateRepository::new(pool.pool().clone());

        let err = build_adapters(&config, repository).err().unwrap();
        assert!(err.to_string().contains("google.client_id"));
    }
}
