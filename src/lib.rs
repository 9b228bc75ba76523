//! # Shopify App Auth
//!
//! Install and uninstall lifecycle for a Shopify app: the OAuth authorization
//! code handshake, per-shop credential storage, and revocation on the
//! `app/uninstalled` webhook.
//!
//! ## Overview
//!
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`]
//! - Validated newtypes for API credentials and domain values
//! - OAuth scope handling with implied scope support
//! - The install handshake via [`auth::oauth::OAuthOrchestrator`]
//! - Single-use, expiring nonces via [`auth::oauth::NonceRegistry`]
//! - Credential persistence via [`store::CredentialStore`]
//! - Webhook verification and uninstall handling via [`webhooks`]
//! - An axum router exposing all of the above via [`server`]
//!
//! ## Quick Start
//!
//! ```rust
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, ApiVersion, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.com").unwrap())
//!     .scopes("read_products,write_orders".parse().unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "https://your-app.com/auth/callback");
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shopify_app_auth::auth::oauth::{spawn_sweeper, MemoryNonceRegistry};
//! use shopify_app_auth::server::{router, AppState};
//! use shopify_app_auth::store::FileStore;
//! use shopify_app_auth::AppConfig;
//!
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(AppConfig::from_env()?);
//! let nonces = Arc::new(MemoryNonceRegistry::new(config.nonce_ttl()));
//! spawn_sweeper(nonces.clone(), config.nonce_sweep_interval());
//!
//! let store = Arc::new(FileStore::open("data/credentials.json")?);
//! let app = router(AppState::new(config, nonces, store));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: configuration and stores are passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all shared types are `Send + Sync`
//! - **No secret leakage**: tokens and secrets are masked in `Debug` output

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use auth::{AccessToken, AuthScopes, CredentialRecord, CredentialSummary};
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, AppConfig, AppConfigBuilder, HostUrl, ServerSettings,
    ShopDomain,
};
pub use error::ConfigError;

// Re-export the install flow for convenience
pub use auth::oauth::{InstallResult, OAuthError, OAuthOrchestrator};
