//! Single-use, short-lived nonces carried in the OAuth `state` parameter.
//!
//! A nonce is issued when an install begins and must be redeemed by the
//! callback that finishes it. Redemption removes the entry, so a replayed or
//! forged callback cannot reuse it. Entries older than the TTL are rejected on
//! redemption and purged by a periodic sweep.
//!
//! ```rust
//! use std::time::Duration;
//! use shopify_app_auth::auth::oauth::{MemoryNonceRegistry, NonceRegistry};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = MemoryNonceRegistry::new(Duration::from_secs(600));
//! let nonce = registry.issue();
//!
//! assert!(registry.redeem(nonce.as_ref()));
//! assert!(!registry.redeem(nonce.as_ref()));
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// An issued nonce value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Nonce(String);

impl Nonce {
    /// 32 alphanumeric characters, roughly 190 bits of entropy.
    pub const LENGTH: usize = 32;

    /// Draws a fresh nonce from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let value = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LENGTH)
            .map(char::from)
            .collect();
        Self(value)
    }
}

impl AsRef<str> for Nonce {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage for outstanding nonces.
///
/// Implementations must make [`redeem`](NonceRegistry::redeem) atomic: when
/// several callers redeem the same value concurrently, exactly one of them
/// observes `true`.
pub trait NonceRegistry: Send + Sync {
    /// Issues and records a fresh nonce.
    fn issue(&self) -> Nonce;

    /// Consumes `value`, returning `true` only if it was outstanding and
    /// younger than the TTL. The entry is gone afterwards either way.
    fn redeem(&self, value: &str) -> bool;

    /// Drops every expired entry and returns how many were removed.
    fn sweep(&self) -> usize;
}

/// In-process nonce registry backed by a sharded concurrent map.
#[derive(Debug)]
pub struct MemoryNonceRegistry {
    entries: DashMap<String, Instant>,
    ttl: Duration,
}

impl MemoryNonceRegistry {
    /// Creates an empty registry whose nonces live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Number of outstanding entries, expired ones included until swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NonceRegistry for MemoryNonceRegistry {
    fn issue(&self) -> Nonce {
        let nonce = Nonce::generate();
        self.entries.insert(nonce.0.clone(), Instant::now());
        nonce
    }

    fn redeem(&self, value: &str) -> bool {
        self.entries
            .remove(value)
            .is_some_and(|(_, issued_at)| issued_at.elapsed() < self.ttl)
    }

    fn sweep(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, issued_at| {
            let live = issued_at.elapsed() < self.ttl;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }
}

// Verify MemoryNonceRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemoryNonceRegistry>();
};

/// Runs [`NonceRegistry::sweep`] every `interval` on the current runtime.
///
/// The first sweep happens one full interval after spawning. Abort the
/// returned handle to stop the task.
pub fn spawn_sweeper(registry: Arc<dyn NonceRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = registry.sweep();
            if removed > 0 {
                tracing::debug!(removed, "Swept expired OAuth nonces");
            }
        }
    })
}
