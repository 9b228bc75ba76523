//! Webhook signature verification.
//!
//! The platform signs each delivery with HMAC-SHA256 over the raw request
//! body, base64-encodes the digest, and sends it in [`HEADER_HMAC`]. The body
//! must be checked byte-for-byte before it is parsed.
//!
//! ```rust
//! use shopify_app_auth::webhooks::{verify_webhook_signature, WebhookRequest};
//! use shopify_app_auth::auth::oauth::hmac::compute_signature_base64;
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":1}"#;
//! let request = WebhookRequest::new(
//!     body.to_vec(),
//!     compute_signature_base64(body, "my-secret"),
//!     Some("app/uninstalled".to_string()),
//!     Some("acme.myshopify.com".to_string()),
//! );
//! assert!(verify_webhook_signature(&request, &config));
//! ```

use crate::auth::oauth::hmac::{compute_signature_base64, constant_time_compare};
use crate::config::AppConfig;

/// Base64 HMAC-SHA256 of the body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Topic of the delivery, e.g. `app/uninstalled`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// Domain of the shop the delivery concerns.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// Unique delivery id, stable across redeliveries.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

/// An incoming webhook delivery: the raw body plus the headers we act on.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
}

impl WebhookRequest {
    /// Creates a request from its raw body and header values.
    #[must_use]
    pub const fn new(
        body: Vec<u8>,
        hmac_header: String,
        topic: Option<String>,
        shop_domain: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
        }
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Value of [`HEADER_HMAC`].
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }

    /// Value of [`HEADER_TOPIC`], if sent.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Value of [`HEADER_SHOP_DOMAIN`], if sent.
    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }
}

/// Checks one body signature against one secret.
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    let computed = compute_signature_base64(raw_body, secret);
    constant_time_compare(&computed, hmac_header.trim())
}

/// Verifies a delivery's body signature.
///
/// Tries the current API secret, then the previous one if configured.
/// An empty header never verifies.
#[must_use]
pub fn verify_webhook_signature(request: &WebhookRequest, config: &AppConfig) -> bool {
    if request.hmac_header().trim().is_empty() {
        return false;
    }

    std::iter::once(config.api_secret_key())
        .chain(config.old_api_secret_key())
        .any(|secret| verify_hmac(request.body(), request.hmac_header(), secret.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(old: Option<&str>) -> AppConfig {
        let mut builder = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("current").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap());
        if let Some(old) = old {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn request(body: &[u8], hmac: String) -> WebhookRequest {
        WebhookRequest::new(body.to_vec(), hmac, None, None)
    }

    #[test]
    fn test_header_constants() {
        assert_eq!(HEADER_HMAC, "X-Shopify-Hmac-SHA256");
        assert_eq!(HEADER_TOPIC, "X-Shopify-Topic");
        assert_eq!(HEADER_SHOP_DOMAIN, "X-Shopify-Shop-Domain");
    }

    #[test]
    fn test_valid_signature_verifies() {
        let body = br#"{"domain":"acme.myshopify.com"}"#;
        let req = request(body, compute_signature_base64(body, "current"));
        assert!(verify_webhook_signature(&req, &config(None)));
    }

    #[test]
    fn test_single_byte_change_fails() {
        let body = br#"{"domain":"acme.myshopify.com"}"#;
        let hmac = compute_signature_base64(body, "current");
        let tampered = br#"{"domain":"acme.myshopify.con"}"#;

        assert!(!verify_webhook_signature(&request(tampered, hmac), &config(None)));
    }

    #[test]
    fn test_empty_or_garbage_header_fails() {
        let body = b"{}";
        assert!(!verify_webhook_signature(&request(body, String::new()), &config(None)));
        assert!(!verify_webhook_signature(
            &request(body, "not base64!".to_string()),
            &config(None)
        ));
    }

    #[test]
    fn test_old_secret_accepted_during_rotation() {
        let body = b"{}";
        let req = request(body, compute_signature_base64(body, "previous"));

        assert!(!verify_webhook_signature(&req, &config(None)));
        assert!(verify_webhook_signature(&req, &config(Some("previous"))));
    }

    #[test]
    fn test_non_utf8_body_is_signed_as_bytes() {
        let body: &[u8] = &[0xff, 0xfe, 0x00, 0x80];
        let req = request(body, compute_signature_base64(body, "current"));
        assert!(verify_webhook_signature(&req, &config(None)));
    }
}
