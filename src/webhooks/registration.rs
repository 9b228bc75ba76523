//! Subscribing a freshly installed shop to `app/uninstalled`.

use serde::Serialize;

use crate::auth::AccessToken;
use crate::config::{AppConfig, ShopDomain};
use crate::webhooks::uninstall::APP_UNINSTALLED_TOPIC;
use crate::webhooks::RegistrationError;

/// Header carrying the shop's access token on Admin API calls.
pub const HEADER_ACCESS_TOKEN: &str = "X-Shopify-Access-Token";

/// Result of a registration attempt that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new subscription was created.
    Created,
    /// The shop already had a subscription for this topic and address.
    AlreadyRegistered,
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    webhook: WebhookSubscription<'a>,
}

#[derive(Serialize)]
struct WebhookSubscription<'a> {
    topic: &'a str,
    address: &'a str,
    format: &'a str,
}

/// Registers the uninstall webhook for `shop` using its new token.
///
/// Posts to `{origin}/admin/api/{version}/webhooks.json`. A `422` answer means
/// the address is already subscribed and counts as success, which makes this
/// safe to call on every re-install.
///
/// # Errors
///
/// Returns [`RegistrationError`] on transport failure or any other status.
pub async fn register_uninstall_webhook(
    http: &reqwest::Client,
    config: &AppConfig,
    shop: &ShopDomain,
    token: &AccessToken,
) -> Result<RegistrationOutcome, RegistrationError> {
    let url = format!(
        "{}/admin/api/{}/webhooks.json",
        config.shop_origin(shop),
        config.api_version()
    );
    let address = config.uninstall_webhook_address();
    let body = WebhookBody {
        webhook: WebhookSubscription {
            topic: APP_UNINSTALLED_TOPIC,
            address: &address,
            format: "json",
        },
    };

    let response = http
        .post(&url)
        .header(HEADER_ACCESS_TOKEN, token.expose())
        .timeout(config.exchange_timeout())
        .json(&body)
        .send()
        .await
        .map_err(|e| RegistrationError::Request {
            reason: e.to_string(),
        })?;

    match response.status().as_u16() {
        200..=299 => Ok(RegistrationOutcome::Created),
        422 => Ok(RegistrationOutcome::AlreadyRegistered),
        status => Err(RegistrationError::Rejected {
            status,
            body: response.text().await.unwrap_or_default(),
        }),
    }
}
