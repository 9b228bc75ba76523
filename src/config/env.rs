//! Environment-driven configuration loading.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - OAuth client id
//! - `SHOPIFY_API_SECRET` - OAuth client secret, also the HMAC key
//! - `HOST` - Public origin of this service (e.g. `https://app.example.com`)
//!
//! ## Optional
//! - `SHOPIFY_OLD_API_SECRET` - Previous secret accepted during key rotation
//! - `SHOPIFY_SCOPES` - Comma-separated scopes (default: none)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: latest)
//! - `SHOPIFY_API_HOST` - Origin replacing `https://{shop}` for outbound calls
//! - `SHOPIFY_ONLINE_TOKENS` - `true` to request per-user tokens
//! - `POST_INSTALL_REDIRECT` - Landing target after install (default: `/`)
//! - `TOKEN_EXCHANGE_TIMEOUT_SECS` - Token exchange timeout (default: 10)
//! - `NONCE_TTL_SECS` - Nonce lifetime (default: 600)
//! - `NONCE_SWEEP_INTERVAL_SECS` - Nonce sweep period (default: 600)
//! - `REGISTER_UNINSTALL_WEBHOOK` - `true` to register `app/uninstalled` on install
//! - `BIND_ADDR` - Listen address for the binary (default: `127.0.0.1:3000`)
//! - `CREDENTIALS_PATH` - Credential snapshot file (default: `data/credentials.json`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::{ApiKey, ApiSecretKey, AppConfig, HostUrl};
use crate::error::ConfigError;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CREDENTIALS_PATH: &str = "data/credentials.json";

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` first so a local `.env` file is honoured.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a required variable is missing or a
    /// value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = get("SHOPIFY_API_KEY").ok_or(ConfigError::MissingRequiredField {
            field: "SHOPIFY_API_KEY",
        })?;
        let api_secret = get("SHOPIFY_API_SECRET").ok_or(ConfigError::MissingRequiredField {
            field: "SHOPIFY_API_SECRET",
        })?;
        let host = get("HOST").ok_or(ConfigError::MissingRequiredField { field: "HOST" })?;

        let mut builder = Self::builder()
            .api_key(ApiKey::new(api_key)?)
            .api_secret_key(ApiSecretKey::new(api_secret)?)
            .host(HostUrl::new(host)?);

        if let Some(old) = get("SHOPIFY_OLD_API_SECRET") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(scopes) = get("SHOPIFY_SCOPES") {
            builder = builder.scopes(scopes.parse()?);
        }
        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }
        if let Some(api_host) = get("SHOPIFY_API_HOST") {
            builder = builder.api_host(HostUrl::new(api_host)?);
        }
        if let Some(online) = get("SHOPIFY_ONLINE_TOKENS") {
            builder = builder.online_tokens(parse_bool("SHOPIFY_ONLINE_TOKENS", &online)?);
        }
        if let Some(target) = get("POST_INSTALL_REDIRECT") {
            builder = builder.post_install_redirect(target);
        }
        if let Some(secs) = get("TOKEN_EXCHANGE_TIMEOUT_SECS") {
            builder = builder.exchange_timeout(parse_secs("TOKEN_EXCHANGE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("NONCE_TTL_SECS") {
            builder = builder.nonce_ttl(parse_secs("NONCE_TTL_SECS", &secs)?);
        }
        if let Some(secs) = get("NONCE_SWEEP_INTERVAL_SECS") {
            builder =
                builder.nonce_sweep_interval(parse_secs("NONCE_SWEEP_INTERVAL_SECS", &secs)?);
        }
        if let Some(enabled) = get("REGISTER_UNINSTALL_WEBHOOK") {
            builder = builder
                .register_uninstall_webhook(parse_bool("REGISTER_UNINSTALL_WEBHOOK", &enabled)?);
        }

        builder.build()
    }
}

/// Process-level settings used only by the server binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: SocketAddr,
    /// File the credential snapshot is persisted to.
    pub credentials_path: PathBuf,
}

impl ServerSettings {
    /// Loads server settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] when `BIND_ADDR` is not a socket address.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads server settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerSettings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;
        let credentials_path = lookup("CREDENTIALS_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from);

        Ok(Self {
            bind_addr,
            credentials_path,
        })
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvVar {
            name,
            reason: e.to_string(),
        })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            name,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}
