//! Access scopes requested on install and granted by the platform.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A normalized set of access scopes.
///
/// Scopes are deduplicated and kept sorted, so [`Display`](fmt::Display)
/// output is stable and can be sent as the `scope` authorization parameter.
/// A `write_x` scope implies `read_x`, which matters when comparing what an
/// install requested against what the platform actually granted.
///
/// ```rust
/// use shopify_app_auth::AuthScopes;
///
/// let requested: AuthScopes = "write_orders, read_products".parse().unwrap();
/// assert_eq!(requested.to_string(), "read_orders,read_products,write_orders");
///
/// let granted: AuthScopes = "read_products".parse().unwrap();
/// assert_eq!(requested.missing_from(&granted), vec!["read_orders", "write_orders"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthScopes {
    scopes: BTreeSet<String>,
}

impl AuthScopes {
    /// Creates an empty scope set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no scope is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Returns `true` if every scope in `other` is also in `self`.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        other.scopes.is_subset(&self.scopes)
    }

    /// Scopes in `self` that `granted` lacks, in sorted order.
    #[must_use]
    pub fn missing_from<'a>(&'a self, granted: &Self) -> Vec<&'a str> {
        self.scopes
            .iter()
            .filter(|scope| !granted.scopes.contains(*scope))
            .map(String::as_str)
            .collect()
    }

    /// Iterates the scopes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }

    fn with_implied(mut scopes: BTreeSet<String>) -> Self {
        let implied: Vec<String> = scopes
            .iter()
            .filter_map(|scope| {
                scope
                    .strip_prefix("unauthenticated_write_")
                    .map(|rest| format!("unauthenticated_read_{rest}"))
                    .or_else(|| scope.strip_prefix("write_").map(|rest| format!("read_{rest}")))
            })
            .collect();
        scopes.extend(implied);
        Self { scopes }
    }
}

impl FromStr for AuthScopes {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scopes = BTreeSet::new();

        for scope in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scope.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ConfigError::InvalidScopes {
                    reason: format!("Invalid characters in scope: '{scope}'"),
                });
            }
            scopes.insert(scope.to_string());
        }

        Ok(Self::with_implied(scopes))
    }
}

impl fmt::Display for AuthScopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.iter().collect::<Vec<_>>().join(",");
        f.write_str(&joined)
    }
}

impl Serialize for AuthScopes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AuthScopes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
