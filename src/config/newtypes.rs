//! Checked wrappers for the values the service is configured with.
//!
//! Credentials and shop identifiers are only constructible through these
//! types, so code past the config layer can assume they are well-formed.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

fn non_blank(value: String, blank: ConfigError) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(blank)
    } else {
        Ok(value)
    }
}

/// The app's OAuth client id, sent as `client_id`.
///
/// ```rust
/// use shopify_app_auth::ApiKey;
///
/// assert_eq!(ApiKey::new("client-id").unwrap().as_ref(), "client-id");
/// assert!(ApiKey::new(" ").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a non-blank client id.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyApiKey`] for blank input.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        non_blank(key.into(), ConfigError::EmptyApiKey).map(Self)
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The app's client secret.
///
/// Doubles as the HMAC key for OAuth callbacks and webhook bodies. Never
/// printed: `Debug` shows a placeholder.
///
/// ```rust
/// use shopify_app_auth::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("hush").unwrap();
/// assert_eq!(format!("{secret:?}"), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Wraps a non-blank client secret.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyApiSecretKey`] for blank input.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        non_blank(key.into(), ConfigError::EmptyApiSecretKey).map(Self)
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated shop domain of the form `<name>.myshopify.com`.
///
/// The shop domain is the primary key of every stored credential, so only the
/// full canonical form is accepted. Input is trimmed and lowercased.
///
/// ```rust
/// use shopify_app_auth::ShopDomain;
///
/// let domain = ShopDomain::new("acme.myshopify.com").unwrap();
/// assert_eq!(domain.as_ref(), "acme.myshopify.com");
/// assert_eq!(domain.shop_name(), "acme");
///
/// assert!(ShopDomain::new("acme").is_err());
/// assert!(ShopDomain::new("acme.example.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShopDomain(String);

const SHOP_SUFFIX: &str = ".myshopify.com";

/// Longest DNS label the platform hands out.
const MAX_SHOP_NAME_LEN: usize = 63;

fn is_shop_label(name: &str) -> bool {
    (1..=MAX_SHOP_NAME_LEN).contains(&name.len())
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl ShopDomain {
    /// Normalizes and checks `domain`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidShopDomain`] unless the input is a single DNS
    /// label followed by `.myshopify.com`.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let domain = domain.into().trim().to_ascii_lowercase();
        let valid = domain.strip_suffix(SHOP_SUFFIX).is_some_and(is_shop_label);
        if valid {
            Ok(Self(domain))
        } else {
            Err(ConfigError::InvalidShopDomain { domain })
        }
    }

    /// The label before `.myshopify.com`.
    #[must_use]
    pub fn shop_name(&self) -> &str {
        &self.0[..self.0.len() - SHOP_SUFFIX.len()]
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)
            .and_then(|raw| Self::new(raw).map_err(de::Error::custom))
    }
}

/// A validated absolute URL with a scheme and host.
///
/// Used for the app's public origin (to build the OAuth `redirect_uri`) and
/// for the optional outbound API host override.
///
/// ```rust
/// use shopify_app_auth::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), "myapp.example.com");
/// assert_eq!(url.join("/auth/callback"), "https://myapp.example.com/auth/callback");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host: std::ops::Range<usize>,
}

impl HostUrl {
    /// Parses `scheme://host[:port][/path]`, dropping trailing slashes.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHostUrl`] when the scheme or host is missing.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();

        let Some(host) = Self::host_range(&url) else {
            return Err(ConfigError::InvalidHostUrl { url });
        };
        Ok(Self { url, host })
    }

    fn host_range(url: &str) -> Option<std::ops::Range<usize>> {
        let (scheme, rest) = url.split_once("://")?;
        if scheme.is_empty() || !scheme.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        let start = scheme.len() + 3;
        let len = rest.find([':', '/', '?', '#']).unwrap_or(rest.len());
        (len > 0).then_some(start..start + len)
    }

    /// The scheme, e.g. `https`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.url[..self.host.start - 3]
    }

    /// The host without port or path.
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host.clone()]
    }

    /// This URL followed by `path`, with exactly one `/` between them.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
