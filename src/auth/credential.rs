//! Persisted per-shop credentials.

use crate::config::ShopDomain;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An access token issued for a shop.
///
/// Its `Debug` output is masked so records can be logged without leaking the
/// secret. Use [`AccessToken::expose`] at the single place the raw value is
/// needed (an outbound request header).
///
/// ```rust
/// use shopify_app_auth::AccessToken;
///
/// let token = AccessToken::new("shpat_123");
/// assert_eq!(format!("{token:?}"), "AccessToken(*****)");
/// assert_eq!(token.expose(), "shpat_123");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// The stored credential for one installed shop.
///
/// There is at most one record per shop. Re-installing overwrites the token,
/// scope and `updated_at`; `installed_at` keeps the first install time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Primary key.
    pub shop: ShopDomain,
    /// Token used for calls on the shop's behalf.
    pub access_token: AccessToken,
    /// Scope string as granted by the platform.
    pub scope: String,
    /// Expiry for per-user tokens; `None` for offline tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// First time this shop was installed.
    pub installed_at: DateTime<Utc>,
    /// Last time the record was written.
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Token-free projection of this record.
    #[must_use]
    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            shop: self.shop.clone(),
            scope: self.scope.clone(),
            installed_at: self.installed_at,
            expired: self.is_expired(),
        }
    }

    /// Whether a per-user token has passed its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// What the debug listing exposes about an installed shop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    /// Shop domain.
    pub shop: ShopDomain,
    /// Granted scope string.
    pub scope: String,
    /// First install time.
    pub installed_at: DateTime<Utc>,
    /// Set once a per-user token has expired and the shop needs a fresh install.
    pub expired: bool,
}

/// Fields written by an upsert.
#[derive(Clone, Debug)]
pub struct NewCredential {
    /// Shop the token belongs to.
    pub shop: ShopDomain,
    /// Freshly exchanged token.
    pub access_token: AccessToken,
    /// Granted scope string.
    pub scope: String,
    /// Expiry for per-user tokens.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCredential {
    /// Creates an offline credential with no expiry.
    #[must_use]
    pub fn new(shop: ShopDomain, access_token: AccessToken, scope: impl Into<String>) -> Self {
        Self {
            shop,
            access_token,
            scope: scope.into(),
            expires_at: None,
        }
    }

    /// Builds the record to store, keeping `installed_at` from `existing`.
    #[must_use]
    pub fn into_record(self, existing: Option<&CredentialRecord>, now: DateTime<Utc>) -> CredentialRecord {
        CredentialRecord {
            installed_at: existing.map_or(now, |record| record.installed_at),
            updated_at: now,
            shop: self.shop,
            access_token: self.access_token,
            scope: self.scope,
            expires_at: self.expires_at,
        }
    }
}

// Verify credential types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CredentialRecord>();
    assert_send_sync::<NewCredential>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn shop() -> ShopDomain {
        ShopDomain::new("acme.myshopify.com").unwrap()
    }

    #[test]
    fn test_record_debug_never_contains_token() {
        let record = NewCredential::new(shop(), AccessToken::new("shpat_secret"), "read_products")
            .into_record(None, Utc::now());

        let debug = format!("{record:?}");
        assert!(!debug.contains("shpat_secret"));
        assert!(debug.contains("AccessToken(*****)"));
    }

    #[test]
    fn test_into_record_preserves_installed_at() {
        let first_seen = Utc::now() - Duration::days(3);
        let existing = NewCredential::new(shop(), AccessToken::new("old"), "read_products")
            .into_record(None, first_seen);

        let now = Utc::now();
        let updated = NewCredential::new(shop(), AccessToken::new("new"), "write_products")
            .into_record(Some(&existing), now);

        assert_eq!(updated.installed_at, first_seen);
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.access_token.expose(), "new");
        assert_eq!(updated.scope, "write_products");
    }

    #[test]
    fn test_summary_serializes_without_token() {
        let record = NewCredential::new(shop(), AccessToken::new("shpat_secret"), "read_orders")
            .into_record(None, Utc::now());

        let json = serde_json::to_string(&record.summary()).unwrap();
        assert!(json.contains("acme.myshopify.com"));
        assert!(json.contains("installed_at"));
        assert!(!json.contains("shpat_secret"));
        assert!(!json.contains("access_token"));
    }

    #[test]
    fn test_is_expired_only_for_past_expiry() {
        let mut record = NewCredential::new(shop(), AccessToken::new("t"), "")
            .into_record(None, Utc::now());
        assert!(!record.is_expired());

        record.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(record.is_expired());

        record.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!record.is_expired());
    }

    #[test]
    fn test_summary_flags_expired_online_token() {
        let mut record = NewCredential::new(shop(), AccessToken::new("t"), "read_products")
            .into_record(None, Utc::now());
        assert!(!record.summary().expired);

        record.expires_at = Some(Utc::now() - Duration::minutes(5));
        let summary = record.summary();
        assert!(summary.expired);
        assert_eq!(summary.scope, "read_products");
    }
}
