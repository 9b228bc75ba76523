//! Authorization code exchange.
//!
//! A verified callback's `code` is traded for an access token with a single
//! POST to `{origin}/admin/oauth/access_token`. The request is bounded by the
//! configured exchange timeout and is never retried: authorization codes are
//! single-use, so a retry after an ambiguous failure cannot succeed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::oauth::error::OAuthError;
use crate::auth::{AccessToken, NewCredential};
use crate::config::{AppConfig, ShopDomain};

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct AccessTokenResponse {
    /// The issued token.
    pub access_token: String,
    /// Comma-separated granted scopes.
    #[serde(default)]
    pub scope: String,
    /// Lifetime in seconds, present for per-user tokens only.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("access_token", &"*****")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl AccessTokenResponse {
    /// Converts the response into the fields stored for `shop`.
    #[must_use]
    pub fn into_credential(self, shop: ShopDomain, now: DateTime<Utc>) -> NewCredential {
        let expires_at = self
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .map(|lifetime| now + lifetime);

        NewCredential {
            shop,
            access_token: AccessToken::new(self.access_token),
            scope: self.scope,
            expires_at,
        }
    }
}

/// Exchanges an authorization `code` for `shop`'s access token.
///
/// # Errors
///
/// Returns [`OAuthError::ExchangeFailure`] on a network error, timeout,
/// non-success status, or a body without a usable token.
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &AppConfig,
    shop: &ShopDomain,
    code: &str,
) -> Result<AccessTokenResponse, OAuthError> {
    let token_url = format!("{}/admin/oauth/access_token", config.shop_origin(shop));

    let body = TokenExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let response = http
        .post(&token_url)
        .timeout(config.exchange_timeout())
        .json(&body)
        .send()
        .await
        .map_err(|e| OAuthError::ExchangeFailure {
            reason: if e.is_timeout() {
                format!("timed out after {:?}", config.exchange_timeout())
            } else {
                format!("network error: {e}")
            },
        })?;

    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(OAuthError::ExchangeFailure {
            reason: format!("token endpoint returned {}: {detail}", status.as_u16()),
        });
    }

    let token: AccessTokenResponse =
        response
            .json()
            .await
            .map_err(|e| OAuthError::ExchangeFailure {
                reason: format!("malformed token response: {e}"),
            })?;

    if token.access_token.trim().is_empty() {
        return Err(OAuthError::ExchangeFailure {
            reason: "token response carried an empty access_token".to_string(),
        });
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, HostUrl};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, timeout: std::time::Duration) -> AppConfig {
        AppConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("client-secret").unwrap())
            .host(HostUrl::new("https://app.example.com").unwrap())
            .api_host(HostUrl::new(server.uri()).unwrap())
            .exchange_timeout(timeout)
            .build()
            .unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("acme.myshopify.com").unwrap()
    }

    #[tokio::test]
    async fn test_exchange_posts_credentials_and_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json(serde_json::json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "code": "auth-code"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "shpat_abc",
                "scope": "read_products"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = config(&server, std::time::Duration::from_secs(5));
        let token = exchange_code(&reqwest::Client::new(), &config, &shop(), "auth-code")
            .await
            .unwrap();

        assert_eq!(token.access_token, "shpat_abc");
        assert_eq!(token.scope, "read_products");
        assert!(token.expires_in.is_none());
    }

    #[tokio::test]
    async fn test_exchange_maps_error_status_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid code"))
            .expect(1)
            .mount(&server)
            .await;

        let config = config(&server, std::time::Duration::from_secs(5));
        let result = exchange_code(&reqwest::Client::new(), &config, &shop(), "used").await;

        match result {
            Err(OAuthError::ExchangeFailure { reason }) => assert!(reason.contains("400")),
            other => panic!("expected ExchangeFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let config = config(&server, std::time::Duration::from_secs(5));
        let result = exchange_code(&reqwest::Client::new(), &config, &shop(), "c").await;

        assert!(matches!(result, Err(OAuthError::ExchangeFailure { .. })));
    }

    #[tokio::test]
    async fn test_exchange_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "late"}))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = config(&server, std::time::Duration::from_millis(200));
        let result = exchange_code(&reqwest::Client::new(), &config, &shop(), "c").await;

        match result {
            Err(OAuthError::ExchangeFailure { reason }) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_into_credential_computes_expiry() {
        let now = Utc::now();
        let response = AccessTokenResponse {
            access_token: "t".to_string(),
            scope: "read_orders".to_string(),
            expires_in: Some(3600),
        };

        let credential = response.into_credential(shop(), now);
        assert_eq!(credential.expires_at, Some(now + Duration::seconds(3600)));
        assert_eq!(credential.scope, "read_orders");
    }

    #[test]
    fn test_response_debug_masks_token() {
        let response = AccessTokenResponse {
            access_token: "shpat_secret".to_string(),
            scope: String::new(),
            expires_in: None,
        };
        assert!(!format!("{response:?}").contains("shpat_secret"));
    }
}
