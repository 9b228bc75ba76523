//! Install/uninstall service for a Shopify app.
//!
//! Reads configuration from the environment (a `.env` file is honoured),
//! persists credentials to a JSON snapshot, and serves the install, callback
//! and uninstall routes until Ctrl+C or SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use shopify_app_auth::auth::oauth::{spawn_sweeper, MemoryNonceRegistry};
use shopify_app_auth::server::{router, AppState};
use shopify_app_auth::store::FileStore;
use shopify_app_auth::{AppConfig, ServerSettings};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopify_app_auth=info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Service failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(AppConfig::from_env()?);
    let settings = ServerSettings::from_env()?;

    let store = FileStore::open(&settings.credentials_path)?;
    tracing::info!(path = %settings.credentials_path.display(), "Credential store opened");

    let nonces = Arc::new(MemoryNonceRegistry::new(config.nonce_ttl()));
    let sweeper = spawn_sweeper(nonces.clone(), config.nonce_sweep_interval());

    let state = AppState::new(Arc::clone(&config), nonces, Arc::new(store));
    let app = router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(
        addr = %settings.bind_addr,
        callback = %config.redirect_uri(),
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
