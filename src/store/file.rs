//! File-backed [`CredentialStore`] for single-node deployments.
//!
//! The whole credential map is kept in memory and written to a JSON snapshot
//! after every mutation. Writes go to a sibling temp file that is synced and
//! then renamed over the snapshot, so a crash leaves either the old or the new
//! file. In-memory state only changes once the snapshot is on disk.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::auth::{CredentialRecord, CredentialSummary, NewCredential};
use crate::config::ShopDomain;
use crate::store::{CredentialStore, StoreError, StoreFuture};

type Snapshot = BTreeMap<ShopDomain, CredentialRecord>;

/// Persists credentials to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Arc<RwLock<Snapshot>>,
    writer: Arc<Mutex<()>>,
}

impl FileStore {
    /// Opens (or creates) a store at `path`, loading any existing snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file or its directory cannot
    /// be accessed, and [`StoreError::Serialization`] if the snapshot is
    /// corrupt.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        ensure_parent_exists(&path)?;
        let snapshot = load_snapshot(&path)?;

        tracing::debug!(
            path = %path.display(),
            shops = snapshot.len(),
            "Opened credential snapshot"
        );

        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(snapshot)),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `mutate` to a copy of the map, persists it, then commits it.
    ///
    /// Writers are serialized; readers keep seeing the previous map until the
    /// snapshot is on disk. File I/O runs on the blocking pool.
    async fn commit<T>(&self, mutate: impl FnOnce(&mut Snapshot) -> T) -> Result<T, StoreError> {
        let _writer = self.writer.lock().await;

        let mut next = self.inner.read().clone();
        let output = mutate(&mut next);

        let path = self.path.clone();
        let next = tokio::task::spawn_blocking(move || persist(&path, &next).map(|()| next))
            .await
            .map_err(|e| StoreError::Unavailable {
                message: format!("Snapshot writer task failed: {e}"),
            })??;
        *self.inner.write() = next;

        Ok(output)
    }
}

fn persist(path: &Path, contents: &Snapshot) -> Result<(), StoreError> {
    ensure_parent_exists(path)?;

    let records: Vec<&CredentialRecord> = contents.values().collect();
    let serialized =
        serde_json::to_vec_pretty(&records).map_err(|e| StoreError::Serialization {
            message: format!("Failed to serialize credential snapshot: {e}"),
        })?;

    let mut tmp_path = path.to_path_buf();
    tmp_path.set_extension("tmp");

    {
        let mut file = File::create(&tmp_path).map_err(|e| StoreError::Unavailable {
            message: format!("Failed to create {}: {e}", tmp_path.display()),
        })?;
        file.write_all(&serialized)
            .map_err(|e| StoreError::Unavailable {
                message: format!("Failed to write {}: {e}", tmp_path.display()),
            })?;
        file.sync_all().map_err(|e| StoreError::Unavailable {
            message: format!("Failed to sync {}: {e}", tmp_path.display()),
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|e| StoreError::Unavailable {
        message: format!("Failed to replace {}: {e}", path.display()),
    })
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::Unavailable {
            message: format!("Failed to create store directory {}: {e}", parent.display()),
        })?;
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    if !path.exists() {
        return Ok(Snapshot::new());
    }

    let bytes = fs::read(path).map_err(|e| StoreError::Unavailable {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    if bytes.is_empty() {
        return Ok(Snapshot::new());
    }

    let records: Vec<CredentialRecord> =
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
            message: format!("Failed to parse {}: {e}", path.display()),
        })?;

    Ok(records
        .into_iter()
        .map(|record| (record.shop.clone(), record))
        .collect())
}

impl CredentialStore for FileStore {
    fn upsert(&self, credential: NewCredential) -> StoreFuture<'_, CredentialRecord> {
        Box::pin(async move {
            self.commit(|map| {
                let existing = map.get(&credential.shop);
                let record = credential.into_record(existing, Utc::now());
                map.insert(record.shop.clone(), record.clone());
                record
            })
            .await
        })
    }

    fn get<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, Option<CredentialRecord>> {
        Box::pin(async move { Ok(self.inner.read().get(shop).cloned()) })
    }

    fn delete<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, bool> {
        Box::pin(async move {
            if !self.inner.read().contains_key(shop) {
                return Ok(false);
            }
            self.commit(|map| map.remove(shop).is_some()).await
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AccessToken;
    use std::{env, process};

    fn temp_path(label: &str) -> PathBuf {
        let unique = format!(
            "shopify_app_auth_{label}_{}_{}.json",
            process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        );
        env::temp_dir().join(unique)
    }

    fn credential(token: &str) -> NewCredential {
        NewCredential::new(
            ShopDomain::new("acme.myshopify.com").unwrap(),
            AccessToken::new(token),
            "read_products,write_orders",
        )
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_path("reopen");
        let store = FileStore::open(&path).unwrap();
        let saved = store.upsert(credential("shpat_1")).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        let fetched = reopened
            .get(&saved.shop)
            .await
            .unwrap()
            .expect("record lost after reopen");

        assert_eq!(fetched, saved);
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_delete_persists_and_is_idempotent() {
        let path = temp_path("delete");
        let store = FileStore::open(&path).unwrap();
        let saved = store.upsert(credential("shpat_1")).await.unwrap();

        assert!(store.delete(&saved.shop).await.unwrap());
        assert!(!store.delete(&saved.shop).await.unwrap());

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.get(&saved.shop).await.unwrap().is_none());
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_partial_state() {
        // A directory squatting on the snapshot path makes the rename fail
        let path = temp_path("blocked");
        let store = FileStore::open(&path).unwrap();
        fs::create_dir_all(&path).unwrap();

        let result = store.upsert(credential("shpat_1")).await;

        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert!(store.list().await.unwrap().is_empty());

        fs::remove_dir_all(&path).unwrap();
        let mut tmp_path = path.clone();
        tmp_path.set_extension("tmp");
        let _ = fs::remove_file(tmp_path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_all_reach_disk() {
        let path = temp_path("concurrent");
        let store = FileStore::open(&path).unwrap();

        let writes = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let shop = ShopDomain::new(format!("shop-{i}.myshopify.com")).unwrap();
                store
                    .upsert(NewCredential::new(shop, AccessToken::new("t"), "read_products"))
                    .await
            })
        });
        for write in writes.collect::<Vec<_>>() {
            write.await.unwrap().unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.list().await.unwrap().len(), 8);
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_snapshot() {
        let path = temp_path("corrupt");
        fs::write(&path, b"{not json").unwrap();

        let result = FileStore::open(&path);

        assert!(matches!(result, Err(StoreError::Serialization { .. })));
        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_file_contains_token_for_reload() {
        let path = temp_path("contents");
        let store = FileStore::open(&path).unwrap();
        store.upsert(credential("shpat_on_disk")).await.unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("shpat_on_disk"));
        assert!(contents.contains("acme.myshopify.com"));
        fs::remove_file(&path).unwrap();
    }
}
