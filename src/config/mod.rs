//! Configuration for the install/uninstall service.
//!
//! All secrets and settings live in an explicit [`AppConfig`] that is passed to
//! component constructors. Nothing in the crate reads process-wide state after
//! startup; [`AppConfig::from_env`] is the only place the environment is
//! consulted.
//!
//! # Overview
//!
//! - [`AppConfig`]: the validated configuration
//! - [`AppConfigBuilder`]: builder for [`AppConfig`]
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`]: validated newtypes
//! - [`ApiVersion`]: Admin API version used for webhook registration
//!
//! # Example
//!
//! ```rust
//! use shopify_app_auth::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .scopes("read_products".parse().unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "https://app.example.com/auth/callback");
//! ```

mod env;
mod newtypes;
mod version;

pub use env::ServerSettings;
pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;

/// Path the platform redirects back to after the merchant approves the install.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";

/// Path the platform delivers `app/uninstalled` notifications to.
pub const DEFAULT_UNINSTALL_WEBHOOK_PATH: &str = "/webhooks/app/uninstalled";

/// Path that starts an install.
pub const BEGIN_INSTALL_PATH: &str = "/auth";

/// Liveness check path.
pub const HEALTH_PATH: &str = "/health";

/// Path listing installed shops.
pub const DEBUG_SHOPS_PATH: &str = "/debug/shops";

const FIXED_ROUTES: [(&str, &str); 3] = [
    (BEGIN_INSTALL_PATH, "already served by the install route"),
    (HEALTH_PATH, "already served by the health route"),
    (DEBUG_SHOPS_PATH, "already served by the shop listing"),
];

const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_NONCE_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Validated service configuration.
///
/// Cheap to clone; share it behind an `Arc` when handing it to several
/// components.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: HostUrl,
    callback_path: String,
    post_install_redirect: String,
    online_tokens: bool,
    api_version: ApiVersion,
    api_host: Option<HostUrl>,
    exchange_timeout: Duration,
    nonce_ttl: Duration,
    nonce_sweep_interval: Duration,
    register_uninstall_webhook: bool,
    uninstall_webhook_path: String,
}

impl AppConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// The OAuth client id.
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// The shared secret used for token exchange and signature checks.
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// The previous shared secret, accepted for signatures during key rotation.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Scopes requested on every install.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// The app's public origin.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Path of the single OAuth callback route.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    /// Absolute callback URL sent as `redirect_uri`.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.host.join(&self.callback_path)
    }

    /// Where the merchant lands after a successful install.
    #[must_use]
    pub fn post_install_redirect(&self) -> &str {
        &self.post_install_redirect
    }

    /// Whether installs request per-user (online) tokens.
    #[must_use]
    pub const fn online_tokens(&self) -> bool {
        self.online_tokens
    }

    /// Admin API version used for outbound webhook registration.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Optional origin that replaces `https://{shop}` for outbound calls.
    #[must_use]
    pub const fn api_host(&self) -> Option<&HostUrl> {
        self.api_host.as_ref()
    }

    /// Origin outbound calls for `shop` are sent to.
    #[must_use]
    pub fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}", shop.as_ref()),
            |host| host.as_ref().to_string(),
        )
    }

    /// Upper bound on a single token exchange round trip.
    #[must_use]
    pub const fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }

    /// How long an issued nonce stays redeemable.
    #[must_use]
    pub const fn nonce_ttl(&self) -> Duration {
        self.nonce_ttl
    }

    /// How often expired nonces are purged.
    #[must_use]
    pub const fn nonce_sweep_interval(&self) -> Duration {
        self.nonce_sweep_interval
    }

    /// Whether reaching the installed state registers the uninstall webhook.
    #[must_use]
    pub const fn register_uninstall_webhook(&self) -> bool {
        self.register_uninstall_webhook
    }

    /// Path of the uninstall webhook route.
    #[must_use]
    pub fn uninstall_webhook_path(&self) -> &str {
        &self.uninstall_webhook_path
    }

    /// Absolute URL the platform should deliver uninstall notifications to.
    #[must_use]
    pub fn uninstall_webhook_address(&self) -> String {
        self.host.join(&self.uninstall_webhook_path)
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for [`AppConfig`].
///
/// `api_key`, `api_secret_key` and `host` are required; everything else has a
/// default.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    callback_path: Option<String>,
    post_install_redirect: Option<String>,
    online_tokens: Option<bool>,
    api_version: Option<ApiVersion>,
    api_host: Option<HostUrl>,
    exchange_timeout: Option<Duration>,
    nonce_ttl: Option<Duration>,
    nonce_sweep_interval: Option<Duration>,
    register_uninstall_webhook: Option<bool>,
    uninstall_webhook_path: Option<String>,
}

impl AppConfigBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous secret accepted during key rotation.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the scopes requested on install.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the app's public origin (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Overrides the callback path (default `/auth/callback`).
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    /// Overrides the post-install landing path or URL (default `/`).
    #[must_use]
    pub fn post_install_redirect(mut self, target: impl Into<String>) -> Self {
        self.post_install_redirect = Some(target.into());
        self
    }

    /// Requests per-user tokens instead of offline tokens.
    #[must_use]
    pub const fn online_tokens(mut self, online: bool) -> Self {
        self.online_tokens = Some(online);
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub const fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Routes outbound platform calls through `host` instead of the shop domain.
    #[must_use]
    pub fn api_host(mut self, host: HostUrl) -> Self {
        self.api_host = Some(host);
        self
    }

    /// Sets the token exchange timeout.
    #[must_use]
    pub const fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = Some(timeout);
        self
    }

    /// Sets the nonce lifetime.
    #[must_use]
    pub const fn nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = Some(ttl);
        self
    }

    /// Sets how often expired nonces are swept.
    #[must_use]
    pub const fn nonce_sweep_interval(mut self, interval: Duration) -> Self {
        self.nonce_sweep_interval = Some(interval);
        self
    }

    /// Enables uninstall webhook registration after each install.
    #[must_use]
    pub const fn register_uninstall_webhook(mut self, enabled: bool) -> Self {
        self.register_uninstall_webhook = Some(enabled);
        self
    }

    /// Overrides the uninstall webhook path.
    #[must_use]
    pub fn uninstall_webhook_path(mut self, path: impl Into<String>) -> Self {
        self.uninstall_webhook_path = Some(path.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] when a required field is
    /// unset, [`ConfigError::InvalidRoutePath`] when the callback or webhook
    /// path is malformed or collides with another route, and
    /// [`ConfigError::ZeroDuration`] when a timeout, TTL or sweep interval is
    /// zero.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        let callback_path = self
            .callback_path
            .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string());
        let uninstall_webhook_path = self
            .uninstall_webhook_path
            .unwrap_or_else(|| DEFAULT_UNINSTALL_WEBHOOK_PATH.to_string());

        check_route_path(&callback_path)?;
        check_route_path(&uninstall_webhook_path)?;
        if callback_path == uninstall_webhook_path {
            return Err(ConfigError::InvalidRoutePath {
                path: callback_path,
                reason: "callback and webhook paths must differ",
            });
        }

        let exchange_timeout = positive(
            "exchange_timeout",
            self.exchange_timeout.unwrap_or(DEFAULT_EXCHANGE_TIMEOUT),
        )?;
        let nonce_ttl = positive("nonce_ttl", self.nonce_ttl.unwrap_or(DEFAULT_NONCE_TTL))?;
        let nonce_sweep_interval = positive(
            "nonce_sweep_interval",
            self.nonce_sweep_interval
                .unwrap_or(DEFAULT_NONCE_SWEEP_INTERVAL),
        )?;

        Ok(AppConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes: self.scopes.unwrap_or_default(),
            host,
            callback_path,
            post_install_redirect: self
                .post_install_redirect
                .unwrap_or_else(|| "/".to_string()),
            online_tokens: self.online_tokens.unwrap_or(false),
            api_version: self.api_version.unwrap_or_default(),
            api_host: self.api_host,
            exchange_timeout,
            nonce_ttl,
            nonce_sweep_interval,
            register_uninstall_webhook: self.register_uninstall_webhook.unwrap_or(false),
            uninstall_webhook_path,
        })
    }
}

fn check_route_path(path: &str) -> Result<(), ConfigError> {
    let reject = |reason| {
        Err(ConfigError::InvalidRoutePath {
            path: path.to_string(),
            reason,
        })
    };

    if !path.starts_with('/') {
        return reject("must start with '/'");
    }
    // Braces, colons and stars would be read as route captures
    if !path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return reject("may only contain letters, digits, '/', '-', '_' and '.'");
    }
    if let Some((_, reason)) = FIXED_ROUTES.iter().find(|(fixed, _)| *fixed == path) {
        return reject(reason);
    }
    Ok(())
}

fn positive(field: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> AppConfigBuilder {
        AppConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = AppConfigBuilder::new()
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "api_key" })
        ));
    }

    #[test]
    fn test_builder_requires_host() {
        let result = AppConfigBuilder::new()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "host" })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = required().build().unwrap();

        assert_eq!(config.callback_path(), DEFAULT_CALLBACK_PATH);
        assert_eq!(config.post_install_redirect(), "/");
        assert!(!config.online_tokens());
        assert!(config.scopes().is_empty());
        assert!(config.old_api_secret_key().is_none());
        assert!(config.api_host().is_none());
        assert_eq!(config.exchange_timeout(), Duration::from_secs(10));
        assert_eq!(config.nonce_ttl(), Duration::from_secs(600));
        assert_eq!(config.nonce_sweep_interval(), Duration::from_secs(600));
        assert!(!config.register_uninstall_webhook());
        assert_eq!(config.api_version(), ApiVersion::latest());
    }

    #[test]
    fn test_redirect_and_webhook_addresses_use_host() {
        let config = required().build().unwrap();

        assert_eq!(
            config.redirect_uri(),
            "https://app.example.com/auth/callback"
        );
        assert_eq!(
            config.uninstall_webhook_address(),
            "https://app.example.com/webhooks/app/uninstalled"
        );
    }

    #[test]
    fn test_shop_origin_defaults_to_shop_domain() {
        let shop = ShopDomain::new("acme.myshopify.com").unwrap();

        let config = required().build().unwrap();
        assert_eq!(config.shop_origin(&shop), "https://acme.myshopify.com");

        let config = required()
            .api_host(HostUrl::new("http://127.0.0.1:9999").unwrap())
            .build()
            .unwrap();
        assert_eq!(config.shop_origin(&shop), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_builder_rejects_relative_route_paths() {
        let result = required().callback_path("auth/callback").build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRoutePath { ref path, .. }) if path == "auth/callback"
        ));
    }

    #[test]
    fn test_builder_rejects_paths_colliding_with_fixed_routes() {
        for fixed in [BEGIN_INSTALL_PATH, HEALTH_PATH, DEBUG_SHOPS_PATH] {
            let callback = required().callback_path(fixed).build();
            assert!(
                matches!(callback, Err(ConfigError::InvalidRoutePath { .. })),
                "callback path {fixed} accepted"
            );

            let webhook = required().uninstall_webhook_path(fixed).build();
            assert!(
                matches!(webhook, Err(ConfigError::InvalidRoutePath { .. })),
                "webhook path {fixed} accepted"
            );
        }
    }

    #[test]
    fn test_builder_rejects_shared_callback_and_webhook_path() {
        let result = required()
            .callback_path("/shopify")
            .uninstall_webhook_path("/shopify")
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidRoutePath { .. })));
    }

    #[test]
    fn test_builder_rejects_capture_syntax_in_paths() {
        assert!(required().callback_path("/auth/{shop}").build().is_err());
        assert!(required().uninstall_webhook_path("/hooks/*rest").build().is_err());
        assert!(required().callback_path("/oauth/return").build().is_ok());
    }

    #[test]
    fn test_builder_rejects_zero_durations() {
        let sweep = required().nonce_sweep_interval(Duration::ZERO).build();
        assert_eq!(
            sweep.unwrap_err(),
            ConfigError::ZeroDuration {
                field: "nonce_sweep_interval"
            }
        );

        let ttl = required().nonce_ttl(Duration::ZERO).build();
        assert!(matches!(ttl, Err(ConfigError::ZeroDuration { field: "nonce_ttl" })));

        let timeout = required().exchange_timeout(Duration::ZERO).build();
        assert!(matches!(
            timeout,
            Err(ConfigError::ZeroDuration {
                field: "exchange_timeout"
            })
        ));
    }

    #[test]
    fn test_config_debug_masks_secret() {
        let config = required().build().unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("ApiSecretKey(*****)"));
        assert!(!debug.contains("\"secret\""));
    }
}
