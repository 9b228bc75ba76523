//! Authorization URL construction.

use crate::auth::oauth::nonce::Nonce;
use crate::config::{AppConfig, ShopDomain};

/// Where the merchant is sent to approve an install, and the nonce it carries.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// Full authorization URL on the shop's admin.
    pub auth_url: String,
    /// The nonce embedded as `state`; already recorded in the registry.
    pub state: Nonce,
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};

/// Builds the authorization URL for `shop`.
///
/// The URL always targets `https://{shop}/admin/oauth/authorize`: the merchant's
/// browser must land on the real shop admin even when outbound API calls are
/// routed elsewhere. Keys and values are percent-encoded. Per-user tokens add
/// `grant_options[]=per-user`.
///
/// ```rust
/// use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl, ShopDomain};
/// use shopify_app_auth::auth::oauth::{authorization_url, Nonce};
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("client-id").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://app.example.com").unwrap())
///     .scopes("read_products".parse().unwrap())
///     .build()
///     .unwrap();
/// let shop = ShopDomain::new("acme.myshopify.com").unwrap();
///
/// let url = authorization_url(&config, &shop, &Nonce::generate());
/// assert!(url.starts_with("https://acme.myshopify.com/admin/oauth/authorize?client_id=client-id"));
/// ```
#[must_use]
pub fn authorization_url(config: &AppConfig, shop: &ShopDomain, state: &Nonce) -> String {
    let mut params = vec![
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", config.scopes().to_string()),
        ("redirect_uri", config.redirect_uri()),
        ("state", state.to_string()),
    ];
    if config.online_tokens() {
        params.push(("grant_options[]", "per-user".to_string()));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("https://{}/admin/oauth/authorize?{query}", shop.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};

    fn config(online: bool) -> AppConfig {
        AppConfig::builder()
            .api_key(ApiKey::new("test-api-key").unwrap())
            .api_secret_key(ApiSecretKey::new("test-secret").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .scopes("read_products,write_orders".parse().unwrap())
            .online_tokens(online)
            .build()
            .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("test-shop.myshopify.com").unwrap()
    }

    #[test]
    fn test_url_targets_shop_admin() {
        let url = authorization_url(&config(false), &shop(), &Nonce::generate());
        assert!(url.starts_with("https://test-shop.myshopify.com/admin/oauth/authorize?"));
    }

    #[test]
    fn test_url_encodes_scope_redirect_and_state() {
        let nonce = Nonce::generate();
        let url = authorization_url(&config(false), &shop(), &nonce);

        assert!(url.contains("client_id=test-api-key"));
        assert!(url.contains("scope=read_orders%2Cread_products%2Cwrite_orders"));
        assert!(url.contains(&format!(
            "redirect_uri={}",
            urlencoding::encode("https://myapp.example.com/auth/callback")
        )));
        assert!(url.contains(&format!("state={nonce}")));
    }

    #[test]
    fn test_grant_options_only_for_online_tokens() {
        let offline = authorization_url(&config(false), &shop(), &Nonce::generate());
        let online = authorization_url(&config(true), &shop(), &Nonce::generate());

        assert!(!offline.contains("grant_options"));
        assert!(online.contains("grant_options%5B%5D=per-user"));
    }

    #[test]
    fn test_url_ignores_api_host_override() {
        let config = AppConfig::builder()
            .api_key(ApiKey::new("k").unwrap())
            .api_secret_key(ApiSecretKey::new("s").unwrap())
            .host(HostUrl::new("https://myapp.example.com").unwrap())
            .api_host(HostUrl::new("http://127.0.0.1:9000").unwrap())
            .build()
            .unwrap();

        let url = authorization_url(&config, &shop(), &Nonce::generate());
        assert!(url.starts_with("https://test-shop.myshopify.com/"));
    }
}
