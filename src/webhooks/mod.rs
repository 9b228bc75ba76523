//! Webhook handling: signature verification, uninstall revocation and
//! uninstall subscription.
//!
//! # Overview
//!
//! - [`verify_webhook_signature`]: base64 HMAC check over the raw body
//! - [`UninstallHandler`]: verifies an `app/uninstalled` delivery and deletes
//!   the shop's credential
//! - [`register_uninstall_webhook`]: subscribes a newly installed shop to
//!   `app/uninstalled`
//! - [`WebhookError`], [`RegistrationError`]: failure types
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shopify_app_auth::webhooks::{UninstallHandler, UninstallOutcome, WebhookRequest};
//! use shopify_app_auth::auth::oauth::hmac::compute_signature_base64;
//! use shopify_app_auth::store::MemoryStore;
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//! let handler = UninstallHandler::new(Arc::new(config), Arc::new(MemoryStore::new()));
//!
//! let body = b"{}".to_vec();
//! let hmac = compute_signature_base64(&body, "secret");
//! let request = WebhookRequest::new(
//!     body,
//!     hmac,
//!     Some("app/uninstalled".to_string()),
//!     Some("acme.myshopify.com".to_string()),
//! );
//!
//! let outcome = handler.handle(&request).await.unwrap();
//! assert!(matches!(outcome, UninstallOutcome::AlreadyRevoked { .. }));
//! # }
//! ```

mod errors;
mod registration;
mod uninstall;
mod verification;

pub use errors::{RegistrationError, WebhookError};
pub use registration::{register_uninstall_webhook, RegistrationOutcome, HEADER_ACCESS_TOKEN};
pub use uninstall::{UninstallHandler, UninstallOutcome, APP_UNINSTALLED_TOPIC};
pub use verification::{
    verify_hmac, verify_webhook_signature, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN,
    HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
