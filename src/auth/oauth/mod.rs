//! The authorization code install flow.
//!
//! 1. **Initiation** ([`OAuthOrchestrator::begin_install`]): validate the shop,
//!    issue a single-use [`Nonce`], and build the [`authorization_url`].
//! 2. **Callback** ([`OAuthOrchestrator::complete_install`]): check required
//!    parameters, verify the query signature, redeem the nonce, then
//!    [`exchange_code`] and persist the resulting credential.
//!
//! # Security
//!
//! - Callback signatures are HMAC-SHA256 over the sorted query and compared in
//!   constant time ([`verify_query_signature`])
//! - A nonce redeems at most once, and only before its TTL elapses
//! - An old API secret is accepted during key rotation
//! - Tokens never appear in `Debug` output or logs
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use shopify_app_auth::auth::oauth::{MemoryNonceRegistry, OAuthOrchestrator};
//! use shopify_app_auth::store::MemoryStore;
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("client-id").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .scopes("read_products".parse().unwrap())
//!     .build()
//!     .unwrap();
//! let orchestrator = OAuthOrchestrator::new(
//!     Arc::new(config),
//!     Arc::new(MemoryNonceRegistry::new(Duration::from_secs(600))),
//!     Arc::new(MemoryStore::new()),
//! );
//!
//! let begun = orchestrator.begin_install("acme.myshopify.com").unwrap();
//! assert!(begun.auth_url.contains(begun.state.as_ref()));
//! ```

mod begin_auth;
mod callback;
mod error;
pub mod hmac;
mod nonce;
mod orchestrator;
mod token_exchange;

pub use begin_auth::{authorization_url, BeginAuthResult};
pub use callback::CallbackParams;
pub use error::OAuthError;
pub use hmac::verify_query_signature;
pub use nonce::{spawn_sweeper, MemoryNonceRegistry, Nonce, NonceRegistry};
pub use orchestrator::{InstallResult, InstallState, OAuthOrchestrator};
pub use token_exchange::{exchange_code, AccessTokenResponse};
