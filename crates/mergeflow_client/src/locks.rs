//! Per-key async mutation locks.
//!
//! A mutation locks every cache key it touches before its optimistic update
//! and holds the guard until reconciliation finishes, so overlapping
//! mutations on one collection run one after another.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Registry of per-key async locks.
#[derive(Default)]
pub struct MutationLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held locks for one mutation; released on drop.
pub struct MutationGuard {
    keys: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl MutationGuard {
    /// Locked keys in acquisition order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        debug!(keys = ?self.keys, "released mutation locks");
    }
}

impl MutationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("mutation lock registry poisoned; continuing with inner state");
            poisoned.into_inner()
        })
    }

    fn handle(&self, key: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.registry().entry(key.to_string()).or_default())
    }

    /// Lock one key.
    pub async fn lock(&self, key: &str) -> MutationGuard {
        self.lock_all([key]).await
    }

    /// Lock several keys. Keys are deduplicated and taken in sorted order, so
    /// two batches sharing keys cannot deadlock.
    pub async fn lock_all<I>(&self, keys: I) -> MutationGuard
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let ordered: BTreeSet<String> = keys
            .into_iter()
            .map(|key| key.as_ref().to_string())
            .collect();
        let mut guards = Vec::with_capacity(ordered.len());
        for key in &ordered {
            guards.push(self.handle(key).lock_owned().await);
        }
        let keys: Vec<String> = ordered.into_iter().collect();
        debug!(keys = ?keys, "acquired mutation locks");
        MutationGuard {
            keys,
            _guards: guards,
        }
    }

    /// Whether `key` is currently held by a mutation.
    pub fn is_locked(&self, key: &str) -> bool {
        self.registry()
            .get(key)
            .is_some_and(|lock| lock.try_lock().is_err())
    }
}
