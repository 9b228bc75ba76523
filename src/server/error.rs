//! HTTP responses for crate errors.
//!
//! Bodies carry a fixed public message only. Causes are logged where the error
//! is raised and never echoed to the caller.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::oauth::OAuthError;
use crate::store::StoreError;
use crate::webhooks::WebhookError;

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        (status(self.status_code()), self.public_message()).into_response()
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::InvalidHmac => "Forbidden",
            Self::MissingShopDomain | Self::InvalidShopDomain { .. } => "Bad request",
            Self::Storage(_) => "Internal server error",
        };
        (status(self.status_code()), message).into_response()
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Credential store request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_error_statuses() {
        assert_eq!(
            OAuthError::CsrfViolation.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OAuthError::ExchangeFailure {
                reason: "timeout".to_string()
            }
            .into_response()
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_webhook_error_statuses() {
        assert_eq!(
            WebhookError::InvalidHmac.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WebhookError::MissingShopDomain.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        let storage = WebhookError::Storage(StoreError::Unavailable {
            message: "disk".to_string(),
        });
        assert_eq!(
            storage.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
