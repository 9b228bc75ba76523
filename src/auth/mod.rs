//! Authentication types: scopes, access tokens and stored credentials.
//!
//! # Overview
//!
//! - [`AuthScopes`]: a set of OAuth scopes with implied scope handling
//! - [`AccessToken`]: an opaque token whose value is masked in `Debug`
//! - [`CredentialRecord`]: what is persisted per installed shop
//! - [`NewCredential`]: a freshly exchanged token waiting to be stored
//! - [`oauth`]: the install handshake
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{AccessToken, AuthScopes, ShopDomain};
//! use shopify_app_auth::auth::NewCredential;
//!
//! let credential = NewCredential::new(
//!     ShopDomain::new("acme.myshopify.com").unwrap(),
//!     AccessToken::new("shpat_123"),
//!     "write_products",
//! );
//!
//! let granted: AuthScopes = credential.scope.parse().unwrap();
//! assert!(granted.covers(&"read_products".parse().unwrap()));
//! assert!(!format!("{credential:?}").contains("shpat_123"));
//! ```

mod credential;
pub mod oauth;
mod scopes;

pub use credential::{AccessToken, CredentialRecord, CredentialSummary, NewCredential};
pub use scopes::AuthScopes;
