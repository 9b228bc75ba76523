//! The install handshake, from initiation to stored credential.
//!
//! ```text
//! Idle -> AuthRequested -> AwaitingCallback -> TokenExchanged -> Installed
//!   \____________\_______________\__________________\______> Failed
//! ```
//!
//! [`OAuthOrchestrator::begin_install`] covers the first two transitions and
//! returns the redirect to the platform. The platform owns the flow until it
//! redirects back, when [`OAuthOrchestrator::complete_install`] checks the
//! callback, exchanges the code, and persists the token.
//!
//! There is no lock around a handshake. Concurrent handshakes are kept apart
//! by single redemption of their nonces and by per-shop atomicity in the
//! credential store.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::auth::oauth::begin_auth::{authorization_url, BeginAuthResult};
use crate::auth::oauth::callback::CallbackParams;
use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::verify_query_signature;
use crate::auth::oauth::nonce::NonceRegistry;
use crate::auth::oauth::token_exchange::exchange_code;
use crate::auth::{AccessToken, AuthScopes, CredentialRecord, NewCredential};
use crate::config::{AppConfig, ShopDomain};
use crate::store::CredentialStore;
use crate::webhooks::{register_uninstall_webhook, RegistrationOutcome};

/// Where a handshake stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallState {
    /// Nothing has happened yet.
    Idle,
    /// The shop asked to install and a nonce was issued.
    AuthRequested,
    /// The merchant was redirected to the platform.
    AwaitingCallback,
    /// The callback verified and the code was exchanged.
    TokenExchanged,
    /// The credential is stored.
    Installed,
    /// The handshake ended in an error.
    Failed,
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::AuthRequested => "auth_requested",
            Self::AwaitingCallback => "awaiting_callback",
            Self::TokenExchanged => "token_exchanged",
            Self::Installed => "installed",
            Self::Failed => "failed",
        })
    }
}

/// A finished install.
#[derive(Clone, Debug)]
pub struct InstallResult {
    /// The installed shop.
    pub shop: ShopDomain,
    /// Scope the platform granted.
    pub scope: String,
    /// Where to send the merchant next.
    pub redirect_url: String,
}

/// Drives install handshakes against injected nonce and credential stores.
#[derive(Clone)]
pub struct OAuthOrchestrator {
    config: Arc<AppConfig>,
    nonces: Arc<dyn NonceRegistry>,
    store: Arc<dyn CredentialStore>,
    http: reqwest::Client,
}

impl fmt::Debug for OAuthOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn transition(shop: &str, from: InstallState, to: InstallState) {
    tracing::debug!(shop, %from, %to, "Install state transition");
}

impl OAuthOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        nonces: Arc<dyn NonceRegistry>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self::with_http_client(config, nonces, store, reqwest::Client::new())
    }

    /// Creates an orchestrator that sends outbound calls through `http`.
    #[must_use]
    pub fn with_http_client(
        config: Arc<AppConfig>,
        nonces: Arc<dyn NonceRegistry>,
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            nonces,
            store,
            http,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Starts an install for `shop` and returns the authorization redirect.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidShopDomain`] if `shop` is not a
    /// `<name>.myshopify.com` domain. No nonce is issued in that case.
    pub fn begin_install(&self, shop: &str) -> Result<BeginAuthResult, OAuthError> {
        let shop = ShopDomain::new(shop).map_err(|_| {
            transition(shop, InstallState::Idle, InstallState::Failed);
            tracing::warn!(shop, "Rejected install for invalid shop domain");
            OAuthError::InvalidShopDomain {
                domain: shop.to_string(),
            }
        })?;

        let state = self.nonces.issue();
        transition(shop.as_ref(), InstallState::Idle, InstallState::AuthRequested);

        let auth_url = authorization_url(&self.config, &shop, &state);
        transition(
            shop.as_ref(),
            InstallState::AuthRequested,
            InstallState::AwaitingCallback,
        );
        tracing::info!(%shop, "Redirecting shop to authorize install");

        Ok(BeginAuthResult { auth_url, state })
    }

    /// Finishes an install from the platform's callback.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// required parameters, shop domain, signature, nonce. Only then is the
    /// code exchanged (once, never retried) and the token persisted (retried
    /// once on a storage error).
    ///
    /// # Errors
    ///
    /// Any [`OAuthError`] variant; see its documentation for the mapping to
    /// HTTP statuses.
    pub async fn complete_install(
        &self,
        params: &CallbackParams,
    ) -> Result<InstallResult, OAuthError> {
        let shop_hint = params.shop().unwrap_or("<missing>");

        let result = self.run_callback(params).await;
        if let Err(error) = &result {
            transition(shop_hint, InstallState::AwaitingCallback, InstallState::Failed);
            if error.status_code() >= 500 {
                tracing::error!(shop = shop_hint, error = %error, "Install failed");
            } else {
                tracing::warn!(shop = shop_hint, error = %error, "Rejected install callback");
            }
        }
        result
    }

    async fn run_callback(&self, params: &CallbackParams) -> Result<InstallResult, OAuthError> {
        let raw_shop = params
            .shop()
            .ok_or(OAuthError::MissingParameters { parameter: "shop" })?;
        let code = params
            .code()
            .ok_or(OAuthError::MissingParameters { parameter: "code" })?;

        if !verify_query_signature(params.pairs(), &self.config) {
            return Err(OAuthError::AuthenticityFailure);
        }

        // Checked before the nonce is spent or any outbound call is built
        let shop = ShopDomain::new(raw_shop).map_err(|_| OAuthError::InvalidShopDomain {
            domain: raw_shop.to_string(),
        })?;

        let state = params.state().unwrap_or_default();
        if !self.nonces.redeem(state) {
            return Err(OAuthError::CsrfViolation);
        }

        let token = exchange_code(&self.http, &self.config, &shop, code).await?;
        transition(
            shop.as_ref(),
            InstallState::AwaitingCallback,
            InstallState::TokenExchanged,
        );
        self.warn_on_scope_shortfall(&shop, &token.scope);

        let credential = token.into_credential(shop.clone(), Utc::now());
        let record = self.persist(credential).await?;
        transition(
            shop.as_ref(),
            InstallState::TokenExchanged,
            InstallState::Installed,
        );
        tracing::info!(%shop, scope = %record.scope, "Shop installed");

        if self.config.register_uninstall_webhook() {
            self.register_uninstall(&shop, &record.access_token).await;
        }

        Ok(InstallResult {
            redirect_url: self.post_install_url(&shop),
            scope: record.scope,
            shop,
        })
    }

    async fn persist(&self, credential: NewCredential) -> Result<CredentialRecord, OAuthError> {
        match self.store.upsert(credential.clone()).await {
            Ok(record) => Ok(record),
            Err(first) => {
                tracing::warn!(
                    shop = %credential.shop,
                    error = %first,
                    "Credential write failed; retrying once"
                );
                self.store
                    .upsert(credential)
                    .await
                    .map_err(|e| OAuthError::StorageUnavailable {
                        reason: e.to_string(),
                    })
            }
        }
    }

    async fn register_uninstall(&self, shop: &ShopDomain, token: &AccessToken) {
        match register_uninstall_webhook(&self.http, &self.config, shop, token).await {
            Ok(RegistrationOutcome::Created) => {
                tracing::info!(%shop, "Registered app/uninstalled webhook");
            }
            Ok(RegistrationOutcome::AlreadyRegistered) => {
                tracing::debug!(%shop, "app/uninstalled webhook already registered");
            }
            Err(e) => {
                tracing::warn!(%shop, error = %e, "Failed to register app/uninstalled webhook");
            }
        }
    }

    fn warn_on_scope_shortfall(&self, shop: &ShopDomain, granted: &str) {
        let Ok(granted) = granted.parse::<AuthScopes>() else {
            return;
        };
        let missing = self.config.scopes().missing_from(&granted);
        if !missing.is_empty() {
            tracing::warn!(%shop, missing = ?missing, "Granted scope is narrower than requested");
        }
    }

    fn post_install_url(&self, shop: &ShopDomain) -> String {
        let target = self.config.post_install_redirect();
        let separator = if target.contains('?') { '&' } else { '?' };
        format!(
            "{target}{separator}shop={}",
            urlencoding::encode(shop.as_ref())
        )
    }
}

// Verify OAuthOrchestrator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthOrchestrator>();
};
