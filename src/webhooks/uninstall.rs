//! Revocation of a shop's credential when the app is uninstalled.

use std::sync::Arc;

use crate::config::{AppConfig, ShopDomain};
use crate::store::CredentialStore;
use crate::webhooks::verification::{verify_webhook_signature, WebhookRequest};
use crate::webhooks::WebhookError;

/// Topic the platform sends when a shop removes the app.
pub const APP_UNINSTALLED_TOPIC: &str = "app/uninstalled";

/// What an accepted delivery did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// A stored credential was deleted.
    Revoked {
        /// The uninstalled shop.
        shop: ShopDomain,
    },
    /// No credential existed; typically a redelivery.
    AlreadyRevoked {
        /// The uninstalled shop.
        shop: ShopDomain,
    },
    /// A verified delivery for another topic; acknowledged, nothing deleted.
    IgnoredTopic {
        /// The topic header value.
        topic: String,
    },
}

/// Handles `app/uninstalled` deliveries.
///
/// The shop is taken from the signed delivery's shop domain header, never from
/// the body. Deletion is idempotent so redeliveries succeed.
#[derive(Clone)]
pub struct UninstallHandler {
    config: Arc<AppConfig>,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for UninstallHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UninstallHandler").finish_non_exhaustive()
    }
}

impl UninstallHandler {
    /// Creates a handler over `store`.
    #[must_use]
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn CredentialStore>) -> Self {
        Self { config, store }
    }

    /// Verifies `request` and revokes the shop's credential.
    ///
    /// # Errors
    ///
    /// - [`WebhookError::InvalidHmac`] if the signature does not verify
    /// - [`WebhookError::MissingShopDomain`] / [`WebhookError::InvalidShopDomain`]
    ///   if the shop header is absent or malformed
    /// - [`WebhookError::Storage`] if the delete fails
    pub async fn handle(&self, request: &WebhookRequest) -> Result<UninstallOutcome, WebhookError> {
        if !verify_webhook_signature(request, &self.config) {
            tracing::warn!(
                shop = request.shop_domain().unwrap_or("<none>"),
                "Rejected uninstall webhook with invalid signature"
            );
            return Err(WebhookError::InvalidHmac);
        }

        let raw_shop = request
            .shop_domain()
            .filter(|s| !s.trim().is_empty())
            .ok_or(WebhookError::MissingShopDomain)?;
        let shop = ShopDomain::new(raw_shop).map_err(|_| WebhookError::InvalidShopDomain {
            domain: raw_shop.to_string(),
        })?;

        if let Some(topic) = request.topic() {
            if topic != APP_UNINSTALLED_TOPIC {
                tracing::info!(%shop, topic, "Acknowledged webhook for unhandled topic");
                return Ok(UninstallOutcome::IgnoredTopic {
                    topic: topic.to_string(),
                });
            }
        }

        let existed = self.store.delete(&shop).await.map_err(|e| {
            tracing::error!(%shop, error = %e, "Failed to revoke credential on uninstall");
            WebhookError::Storage(e)
        })?;

        if existed {
            tracing::info!(%shop, "App uninstalled; credential revoked");
            Ok(UninstallOutcome::Revoked { shop })
        } else {
            tracing::debug!(%shop, "Uninstall for shop with no stored credential");
            Ok(UninstallOutcome::AlreadyRevoked { shop })
        }
    }
}
