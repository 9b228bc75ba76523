//! HTTP surface: install initiation, OAuth callback, uninstall webhook.
//!
//! | Method | Path                          | Success               |
//! |--------|-------------------------------|-----------------------|
//! | GET    | `/auth?shop=…`                | 303 to the platform   |
//! | GET    | callback path                 | 303 to post-install   |
//! | POST   | uninstall webhook path        | 200                   |
//! | GET    | `/debug/shops`                | JSON shop summaries   |
//! | GET    | `/health`                     | `ok`                  |
//!
//! The callback and webhook paths come from [`AppConfig`]. Exactly one callback
//! route is registered.

mod error;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::auth::oauth::{CallbackParams, NonceRegistry, OAuthError, OAuthOrchestrator};
use crate::auth::CredentialSummary;
use crate::config::{AppConfig, BEGIN_INSTALL_PATH, DEBUG_SHOPS_PATH, HEALTH_PATH};
use crate::store::{CredentialStore, StoreError};
use crate::webhooks::{
    UninstallHandler, WebhookError, WebhookRequest, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC,
    HEADER_WEBHOOK_ID,
};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    orchestrator: OAuthOrchestrator,
    uninstall: UninstallHandler,
    store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Wires the orchestrator and uninstall handler over shared stores.
    #[must_use]
    pub fn new(
        config: Arc<AppConfig>,
        nonces: Arc<dyn NonceRegistry>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self::from_orchestrator(
            OAuthOrchestrator::new(Arc::clone(&config), nonces, Arc::clone(&store)),
            config,
            store,
        )
    }

    /// Like [`AppState::new`] with an explicit outbound HTTP client.
    #[must_use]
    pub fn with_http_client(
        config: Arc<AppConfig>,
        nonces: Arc<dyn NonceRegistry>,
        store: Arc<dyn CredentialStore>,
        http: reqwest::Client,
    ) -> Self {
        Self::from_orchestrator(
            OAuthOrchestrator::with_http_client(
                Arc::clone(&config),
                nonces,
                Arc::clone(&store),
                http,
            ),
            config,
            store,
        )
    }

    fn from_orchestrator(
        orchestrator: OAuthOrchestrator,
        config: Arc<AppConfig>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orchestrator,
                uninstall: UninstallHandler::new(config, Arc::clone(&store)),
                store,
            }),
        }
    }

    /// The install orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &OAuthOrchestrator {
        &self.inner.orchestrator
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        self.inner.orchestrator.config()
    }
}

/// Builds the router for `state`.
///
/// Route collisions are rejected when the [`AppConfig`] is built, so this
/// never registers the same path twice.
pub fn router(state: AppState) -> Router {
    let callback_path = state.config().callback_path().to_string();
    let webhook_path = state.config().uninstall_webhook_path().to_string();

    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(BEGIN_INSTALL_PATH, get(begin_install))
        .route(&callback_path, get(complete_install))
        .route(&webhook_path, post(app_uninstalled))
        .route(DEBUG_SHOPS_PATH, get(list_shops))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct BeginInstallQuery {
    shop: Option<String>,
}

/// Liveness check.
async fn health() -> &'static str {
    "ok"
}

async fn begin_install(
    State(state): State<AppState>,
    Query(query): Query<BeginInstallQuery>,
) -> Result<Redirect, OAuthError> {
    let shop = query
        .shop
        .filter(|s| !s.trim().is_empty())
        .ok_or(OAuthError::MissingParameters { parameter: "shop" })?;
    let begun = state.orchestrator().begin_install(&shop)?;
    Ok(Redirect::to(&begun.auth_url))
}

async fn complete_install(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Redirect, OAuthError> {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());
    let installed = state.orchestrator().complete_install(&params).await?;
    Ok(Redirect::to(&installed.redirect_url))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    if let Some(id) = header_value(&headers, HEADER_WEBHOOK_ID) {
        tracing::debug!(webhook_id = %id, "Received uninstall webhook");
    }

    let request = WebhookRequest::new(
        body.to_vec(),
        header_value(&headers, HEADER_HMAC).unwrap_or_default(),
        header_value(&headers, HEADER_TOPIC),
        header_value(&headers, HEADER_SHOP_DOMAIN),
    );
    state.inner.uninstall.handle(&request).await?;
    Ok(StatusCode::OK)
}

async fn list_shops(
    State(state): State<AppState>,
) -> Result<Json<Vec<CredentialSummary>>, StoreError> {
    state.inner.store.list().await.map(Json)
}
