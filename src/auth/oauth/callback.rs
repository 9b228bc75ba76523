//! Parameters the platform appends to the OAuth redirect.

use std::borrow::Cow;
use std::collections::HashMap;

/// The decoded query of an OAuth callback request.
///
/// All parameters are kept, in arrival order, because the signature covers
/// every one of them, not just the fields the flow reads.
///
/// ```rust
/// use shopify_app_auth::auth::oauth::CallbackParams;
///
/// let params = CallbackParams::from_query("code=abc&shop=acme.myshopify.com&state=xyz&hmac=00");
/// assert_eq!(params.code(), Some("abc"));
/// assert_eq!(params.shop(), Some("acme.myshopify.com"));
/// assert_eq!(params.get("timestamp"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    /// Wraps already-decoded pairs.
    #[must_use]
    pub const fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let pairs = query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    /// All parameters, in arrival order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First non-empty value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// The `shop` parameter.
    #[must_use]
    pub fn shop(&self) -> Option<&str> {
        self.get("shop")
    }

    /// The authorization `code`.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    /// The `state` nonce.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self::new(map.into_iter().collect())
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), Cow::into_owned)
}
