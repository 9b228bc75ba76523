//! Configuration error types.
//!
//! Everything [`AppConfig`](crate::AppConfig) is built from is checked up
//! front, so a misconfigured service fails at startup instead of mid-install.
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building an [`AppConfig`](crate::AppConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The client id was blank.
    #[error("SHOPIFY_API_KEY is empty; the app client id is required")]
    EmptyApiKey,

    /// The client secret was blank.
    #[error("SHOPIFY_API_SECRET is empty; the app client secret is required")]
    EmptyApiSecretKey,

    /// Shop domain does not match `<name>.myshopify.com`.
    #[error("'{domain}' is not a <name>.myshopify.com shop domain")]
    InvalidShopDomain {
        /// Normalized input.
        domain: String,
    },

    /// Not a released quarter or `unstable`.
    #[error("'{version}' is not a quarterly API version (YYYY-01/04/07/10) or 'unstable'")]
    InvalidApiVersion {
        /// Rejected input.
        version: String,
    },

    /// A scope entry could not be parsed.
    #[error("Scope list rejected: {reason}")]
    InvalidScopes {
        /// Parser detail.
        reason: String,
    },

    /// A builder field or environment variable without a default was absent.
    #[error("{field} is required but was not set")]
    MissingRequiredField {
        /// Field or variable name.
        field: &'static str,
    },

    /// A host URL lacked a scheme or host.
    #[error("'{url}' is not an absolute URL")]
    InvalidHostUrl {
        /// Rejected input.
        url: String,
    },

    /// A configurable route cannot be mounted.
    #[error("Route path '{path}' rejected: {reason}")]
    InvalidRoutePath {
        /// Rejected path.
        path: String,
        /// Why it cannot be mounted.
        reason: &'static str,
    },

    /// A duration setting that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Builder field name.
        field: &'static str,
    },

    /// An environment variable is present but cannot be parsed.
    #[error("{name} has an unusable value: {reason}")]
    InvalidEnvVar {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
