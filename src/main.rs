//! Users API Server

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use users_api::auth::generate_access_token;
use users_api::config::Config;
use users_api::routes::{self, USERS_PATH};
use users_api::services::{InMemoryUserStore, UserStore};
use users_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting users API");

    let store = match &config.user_seed_file {
        Some(path) => InMemoryUserStore::from_seed_file(path)
            .with_context(|| format!("Failed to load users from {}", path.display()))?,
        None => InMemoryUserStore::default(),
    };
    tracing::info!(users = store.len(), "User store ready");

    let store: Arc<dyn UserStore> = Arc::new(store);
    if !config.environment.is_production() {
        log_development_token(&config, store.as_ref()).await?;
    }

    let state = AppState::new(store, config.jwt_secret.as_str());
    let app = routes::app(state)?.layer(configure_cors(&config));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("User routes at http://{}{}", addr, USERS_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Print a bearer token for the first seeded user so protected routes can be
/// tried locally
async fn log_development_token(config: &Config, store: &dyn UserStore) -> anyhow::Result<()> {
    let Some(user) = store.list().await?.into_iter().next() else {
        return Ok(());
    };

    let token = generate_access_token(
        user.id,
        &config.jwt_secret,
        config.jwt_access_token_ttl_seconds,
    )?;
    tracing::info!(user_id = %user.id, token = %token, "Development bearer token");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed) = config.cors_allowed_origins.as_deref() else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
