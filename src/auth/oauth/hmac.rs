//! Keyed-hash primitives and the callback query signature check.
//!
//! Two signing schemes are in use:
//!
//! - OAuth redirects carry a lowercase hex HMAC-SHA256 over the sorted query
//!   string in an `hmac` parameter ([`verify_query_signature`]).
//! - Webhooks carry a base64 HMAC-SHA256 over the raw body in a header
//!   (see [`crate::webhooks::verify_webhook_signature`]).
//!
//! Both are keyed with the app's API secret, fall back to the previous secret
//! during key rotation, and compare in constant time.
//!
//! ```rust
//! use shopify_app_auth::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let sig = compute_signature("code=abc&shop=acme.myshopify.com", "secret");
//! assert_eq!(sig.len(), 64);
//!
//! let sig = compute_signature_base64(b"{\"id\":1}", "secret");
//! assert_eq!(sig.len(), 44);
//! ```

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

/// Query parameters that are never part of the signed message.
const UNSIGNED_PARAMS: [&str; 2] = ["hmac", "signature"];

fn mac(message: &[u8], secret: &str) -> [u8; 32] {
    // HMAC accepts keys of any length
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// HMAC-SHA256 of `message` as lowercase hex.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    hex::encode(mac(message.as_bytes(), secret))
}

/// HMAC-SHA256 of raw bytes as standard base64.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    BASE64_STANDARD.encode(mac(message, secret))
}

/// Constant-time string equality.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Builds the message the platform signs for a redirect query.
///
/// Every parameter except `hmac` and `signature`, sorted by key, rendered as
/// `key=value` and joined with `&`. Values are the decoded query values.
#[must_use]
pub fn signable_string(params: &[(String, String)]) -> String {
    let mut signed: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| !UNSIGNED_PARAMS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    signed.sort_unstable();

    signed
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Verifies the `hmac` parameter of a redirect query.
///
/// Returns `false` when the parameter is missing, malformed, or does not
/// match under either the current or the previous API secret.
#[must_use]
pub fn verify_query_signature(params: &[(String, String)], config: &AppConfig) -> bool {
    let Some(received) = params
        .iter()
        .find_map(|(key, value)| (key == "hmac").then_some(value.as_str()))
    else {
        return false;
    };

    if received.is_empty() {
        return false;
    }
    let received = received.to_ascii_lowercase();
    let message = signable_string(params);

    std::iter::once(config.api_secret_key())
        .chain(config.old_api_secret_key())
        .any(|secret| constant_time_compare(&compute_signature(&message, secret.as_ref()), &received))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(old_secret: Option<&str>) -> AppConfig {
        let mut builder = AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("hush").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap());
        if let Some(old) = old_secret {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old).unwrap());
        }
        builder.build().unwrap()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn signed(items: &[(&str, &str)], secret: &str) -> Vec<(String, String)> {
        let mut params = pairs(items);
        let hmac = compute_signature(&signable_string(&params), secret);
        params.push(("hmac".to_string(), hmac));
        params
    }

    #[test]
    fn test_compute_signature_matches_known_vector() {
        assert_eq!(
            compute_signature("message", "key"),
            "6e9ef29b75fffc5b7abae527d58fdadb2fe42e7219011976917343065f58ed4a"
        );
        assert_eq!(
            compute_signature_base64(b"message", "key"),
            "bp7ym3X//Ft6uuUn1Y/a2y/kLnIZARl2kXNDBl9Y7Uo="
        );
    }

    #[test]
    fn test_signable_string_sorts_and_skips_signature_params() {
        let params = pairs(&[
            ("timestamp", "1700000000"),
            ("hmac", "ignored"),
            ("code", "abc"),
            ("signature", "legacy"),
            ("shop", "acme.myshopify.com"),
        ]);

        assert_eq!(
            signable_string(&params),
            "code=abc&shop=acme.myshopify.com&timestamp=1700000000"
        );
    }

    #[test]
    fn test_verify_query_signature_accepts_valid_signature() {
        let params = signed(
            &[
                ("code", "abc"),
                ("shop", "acme.myshopify.com"),
                ("state", "n0nce"),
                ("timestamp", "1700000000"),
            ],
            "hush",
        );
        assert!(verify_query_signature(&params, &config(None)));
    }

    #[test]
    fn test_verify_query_signature_detects_single_character_tamper() {
        let mut params = signed(&[("code", "abc"), ("shop", "acme.myshopify.com")], "hush");
        params[0].1 = "abd".to_string();
        assert!(!verify_query_signature(&params, &config(None)));

        let mut params = signed(&[("code", "abc"), ("shop", "acme.myshopify.com")], "hush");
        let hmac = &mut params.last_mut().unwrap().1;
        let flipped = if hmac.ends_with('0') { '1' } else { '0' };
        hmac.pop();
        hmac.push(flipped);
        assert!(!verify_query_signature(&params, &config(None)));
    }

    #[test]
    fn test_verify_query_signature_rejects_missing_or_empty_hmac() {
        let params = pairs(&[("code", "abc"), ("shop", "acme.myshopify.com")]);
        assert!(!verify_query_signature(&params, &config(None)));

        let params = pairs(&[("code", "abc"), ("hmac", "")]);
        assert!(!verify_query_signature(&params, &config(None)));
    }

    #[test]
    fn test_verify_query_signature_falls_back_to_old_secret() {
        let params = signed(&[("code", "abc"), ("shop", "acme.myshopify.com")], "previous");

        assert!(!verify_query_signature(&params, &config(None)));
        assert!(verify_query_signature(&params, &config(Some("previous"))));
    }

    #[test]
    fn test_verify_query_signature_accepts_uppercase_hex() {
        let mut params = signed(&[("code", "abc")], "hush");
        let upper = params.last().unwrap().1.to_uppercase();
        params.last_mut().unwrap().1 = upper;
        assert!(verify_query_signature(&params, &config(None)));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("", "a"));
    }
}
