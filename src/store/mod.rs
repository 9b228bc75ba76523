//! Durable per-shop credential storage.
//!
//! The [`CredentialStore`] trait is the seam between the install flow and the
//! persistence backend. Two backends ship with the crate:
//!
//! - [`MemoryStore`]: process-local map, for tests and development
//! - [`FileStore`]: JSON snapshot on disk, replaced atomically on every write
//!
//! Backends must keep each shop's record atomic (last writer wins, no
//! interleaved fields) and must report failures as [`StoreError`] rather than
//! as a missing record.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::auth::{CredentialRecord, CredentialSummary, NewCredential};
use crate::config::ShopDomain;

/// Boxed future returned by [`CredentialStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persistence contract for installed-shop credentials.
pub trait CredentialStore: Send + Sync {
    /// Inserts or overwrites the record for `credential.shop`.
    ///
    /// An existing record keeps its `installed_at`; everything else is
    /// replaced and `updated_at` is refreshed.
    fn upsert(&self, credential: NewCredential) -> StoreFuture<'_, CredentialRecord>;

    /// Fetches the record for `shop`, if installed.
    fn get<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, Option<CredentialRecord>>;

    /// Removes the record for `shop`. Returns whether one existed.
    fn delete<'a>(&'a self, shop: &'a ShopDomain) -> StoreFuture<'a, bool>;

    /// Lists installed shops without their tokens.
    fn list(&self) -> StoreFuture<'_, Vec<CredentialSummary>>;
}

/// Errors produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("Credential store unavailable: {message}")]
    Unavailable {
        /// Backend detail.
        message: String,
    },

    /// A record or snapshot could not be encoded or decoded.
    #[error("Credential store serialization error: {message}")]
    Serialization {
        /// Encoder or decoder detail.
        message: String,
    },
}
