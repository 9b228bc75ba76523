//! Webhook error types.
//!
//! ```rust
//! use shopify_app_auth::webhooks::WebhookError;
//!
//! let error = WebhookError::InvalidHmac;
//! assert_eq!(error.status_code(), 403);
//! assert_eq!(error.to_string(), "Webhook signature verification failed");
//! ```

use thiserror::Error;

use crate::store::StoreError;

/// Reasons an uninstall delivery is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The body signature did not verify. Nothing was deleted.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// The delivery carried no shop domain header.
    #[error("Webhook is missing the shop domain header")]
    MissingShopDomain,

    /// The shop domain header is not a `<name>.myshopify.com` domain.
    #[error("Webhook shop domain '{domain}' is invalid")]
    InvalidShopDomain {
        /// The rejected header value.
        domain: String,
    },

    /// The credential could not be deleted.
    #[error("Failed to revoke credential: {0}")]
    Storage(#[from] StoreError),
}

impl WebhookError {
    /// HTTP status returned to the platform.
    ///
    /// Only storage failures are `5xx`, which makes the platform redeliver.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidHmac => 403,
            Self::MissingShopDomain | Self::InvalidShopDomain { .. } => 400,
            Self::Storage(_) => 500,
        }
    }
}

/// Failure to register a webhook subscription for a shop.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The request never got a response.
    #[error("Webhook registration request failed: {reason}")]
    Request {
        /// Transport detail.
        reason: String,
    },

    /// The platform answered with an unexpected status.
    #[error("Webhook registration rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

// Verify error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
    assert_send_sync::<RegistrationError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(WebhookError::InvalidHmac.status_code(), 403);
        assert_eq!(WebhookError::MissingShopDomain.status_code(), 400);
        assert_eq!(
            WebhookError::InvalidShopDomain {
                domain: "x".to_string()
            }
            .status_code(),
            400
        );
        let storage: WebhookError = StoreError::Unavailable {
            message: "down".to_string(),
        }
        .into();
        assert_eq!(storage.status_code(), 500);
    }

    #[test]
    fn test_storage_error_message_includes_cause() {
        let error: WebhookError = StoreError::Unavailable {
            message: "disk full".to_string(),
        }
        .into();
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn test_rejected_registration_message() {
        let error = RegistrationError::Rejected {
            status: 401,
            body: "Invalid API key or access token".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("401"));
        assert!(message.contains("Invalid API key"));
    }
}
