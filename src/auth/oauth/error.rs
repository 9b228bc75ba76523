//! Failure taxonomy for the install flow.
//!
//! Every [`OAuthError`] maps to an HTTP status and a short public message.
//! The `Display` output carries the detailed cause and is meant for logs only;
//! responses use [`OAuthError::public_message`].
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::OAuthError;
//!
//! let error = OAuthError::CsrfViolation;
//! assert_eq!(error.status_code(), 400);
//! assert_eq!(error.public_message(), "Invalid request");
//! ```

use thiserror::Error;

/// Errors that can end an install attempt.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The shop identifier is not a `<name>.myshopify.com` domain.
    #[error("Invalid shop domain '{domain}'")]
    InvalidShopDomain {
        /// The rejected input.
        domain: String,
    },

    /// The callback is missing a required parameter.
    #[error("Callback is missing required parameter '{parameter}'")]
    MissingParameters {
        /// Name of the first missing parameter.
        parameter: &'static str,
    },

    /// The callback signature did not verify.
    #[error("Callback HMAC signature validation failed")]
    AuthenticityFailure,

    /// The `state` nonce was unknown, expired, or already used.
    #[error("OAuth state nonce was unknown, expired, or already redeemed")]
    CsrfViolation,

    /// The authorization code could not be exchanged for a token.
    #[error("Token exchange failed: {reason}")]
    ExchangeFailure {
        /// Cause of the failure.
        reason: String,
    },

    /// The credential could not be persisted after a retry.
    #[error("Credential storage unavailable: {reason}")]
    StorageUnavailable {
        /// Cause of the last storage failure.
        reason: String,
    },
}

impl OAuthError {
    /// HTTP status returned to the caller.
    ///
    /// Caller faults are `400`; platform and storage faults are `500`.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidShopDomain { .. }
            | Self::MissingParameters { .. }
            | Self::AuthenticityFailure
            | Self::CsrfViolation => 400,
            Self::ExchangeFailure { .. } | Self::StorageUnavailable { .. } => 500,
        }
    }

    /// Generic response body that leaks no internal detail.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidShopDomain { .. } => "Invalid shop domain",
            Self::MissingParameters { .. } => "Missing required parameters",
            Self::AuthenticityFailure | Self::CsrfViolation => "Invalid request",
            Self::ExchangeFailure { .. } | Self::StorageUnavailable { .. } => {
                "Installation could not be completed"
            }
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_faults_map_to_bad_request() {
        let errors = [
            OAuthError::InvalidShopDomain {
                domain: "evil.com".to_string(),
            },
            OAuthError::MissingParameters { parameter: "code" },
            OAuthError::AuthenticityFailure,
            OAuthError::CsrfViolation,
        ];
        for error in errors {
            assert_eq!(error.status_code(), 400, "{error}");
        }
    }

    #[test]
    fn test_upstream_faults_map_to_server_error() {
        let exchange = OAuthError::ExchangeFailure {
            reason: "timed out".to_string(),
        };
        let storage = OAuthError::StorageUnavailable {
            reason: "disk full".to_string(),
        };
        assert_eq!(exchange.status_code(), 500);
        assert_eq!(storage.status_code(), 500);
    }

    #[test]
    fn test_public_message_hides_cause() {
        let error = OAuthError::StorageUnavailable {
            reason: "/var/lib/creds.json: permission denied".to_string(),
        };
        assert!(error.to_string().contains("permission denied"));
        assert!(!error.public_message().contains("permission"));
    }

    #[test]
    fn test_missing_parameter_names_the_parameter() {
        let error = OAuthError::MissingParameters { parameter: "shop" };
        assert!(error.to_string().contains("'shop'"));
    }

    #[test]
    fn test_oauth_error_implements_std_error() {
        let error: &dyn std::error::Error = &OAuthError::CsrfViolation;
        let _ = error;
    }
}
