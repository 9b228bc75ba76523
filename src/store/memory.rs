//! In-memory [`CredentialStore`] for tests and local development.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::auth::{CredentialRecord, CredentialSummary, NewCredential};
use crate::config::ShopDomain;
use crate::store::{CredentialStore, StoreFuture};

/// Process-local credential map. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<ShopDomain, CredentialRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installed shops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns `true` if no shop is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl CredentialStore for MemoryStore {
    fn upsert(&self, credential: NewCredential) -> StoreFuture<'_, CredentialRecord> {
        Box::pin(async move {
            let mut guard = self.inner.write();
            let existing = guard.get(&credential.shop);
            let record = credential.into_record(existing, Utc::now());
            guard.insert(record.shop.clone(), record.clone());

            Ok(record)
        })
    }

    fn get<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, Option<CredentialRecord>> {
        Box::pin(async move { Ok(self.inner.read().get(shop).cloned()) })
    }

    fn delete<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, bool> {
        Box::pin(async move { Ok(self.inner.write().remove(shop).is_some()) })
    }

    fn list(&self) -> StoreFuture<'_, Vec<CredentialSummary>> {
        Box::pin(async move {
            Ok(self
                .inner
                .read()
                .values()
                .map(CredentialRecord::summary)
                .collect())
        })
    }
}
