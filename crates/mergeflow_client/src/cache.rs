//! Keyed stale-while-revalidate cache for fetched collections.
//!
//! Each key remembers its fetcher, so any holder of the cache can revalidate
//! or invalidate it after a mutation. Every fetch and every local mutation
//! takes a new generation; a fetch result is stored only if no newer fetch or
//! mutation happened on the same key meanwhile.

use crate::error::ApiError;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Boxed future returned by a [`Fetcher`].
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'static>>;

/// Re-runnable loader for one key.
pub type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Cache key, e.g. `members?teamId=t1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Snapshot of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub is_error: bool,
}

impl<T> FetchState<T> {
    /// State for a suppressed (`None`) key.
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_error: false,
        }
    }
}

struct Entry<T> {
    data: Option<T>,
    is_error: bool,
    generation: u64,
    loading_generation: Option<u64>,
    fetcher: Option<Fetcher<T>>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_error: false,
            generation: 0,
            loading_generation: None,
            fetcher: None,
        }
    }
}

impl<T: Clone> Entry<T> {
    fn snapshot(&self) -> FetchState<T> {
        FetchState {
            data: self.data.clone(),
            is_loading: self.loading_generation.is_some(),
            is_error: self.is_error,
        }
    }
}

/// Shared cache of one record collection type.
pub struct QueryCache<T> {
    entries: Mutex<HashMap<CacheKey, Entry<T>>>,
    generations: AtomicU64,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }
}

impl<T> QueryCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry<T>>> {
        self.entries.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("query cache mutex poisoned; continuing with inner state");
            poisoned.into_inner()
        })
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current state without fetching.
    pub fn get(&self, key: Option<&CacheKey>) -> FetchState<T> {
        let Some(key) = key else {
            return FetchState::idle();
        };
        self.entries()
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_else(FetchState::idle)
    }

    /// Cached data for `key`, if any.
    pub fn data(&self, key: &CacheKey) -> Option<T> {
        self.entries().get(key).and_then(|entry| entry.data.clone())
    }

    /// Register `fetcher` for `key` and load it. A `None` key fetches nothing.
    pub async fn fetch(&self, key: Option<&CacheKey>, fetcher: Fetcher<T>) -> FetchState<T> {
        let Some(key) = key else {
            return FetchState::idle();
        };
        self.entries().entry(key.clone()).or_default().fetcher = Some(fetcher);
        self.revalidate(key).await
    }

    /// Re-run the registered fetcher for `key`.
    pub async fn revalidate(&self, key: &CacheKey) -> FetchState<T> {
        let generation = self.next_generation();
        let fetcher = {
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();
            let Some(fetcher) = entry.fetcher.clone() else {
                return entry.snapshot();
            };
            entry.generation = generation;
            entry.loading_generation = Some(generation);
            fetcher
        };

        debug!(key = %key, generation, "revalidating");
        let result = fetcher().await;

        let mut entries = self.entries();
        let entry = entries.entry(key.clone()).or_default();
        if entry.loading_generation == Some(generation) {
            entry.loading_generation = None;
        }
        if entry.generation != generation {
            debug!(key = %key, generation, latest = entry.generation, "discarding superseded fetch");
            return entry.snapshot();
        }
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.is_error = false;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "fetch failed");
                entry.is_error = true;
            }
        }
        entry.snapshot()
    }

    /// Replace the data for `key`, optionally revalidating afterwards.
    pub async fn mutate(&self, key: &CacheKey, data: T, revalidate: bool) -> FetchState<T> {
        let snapshot = {
            let generation = self.next_generation();
            let mut entries = self.entries();
            let entry = entries.entry(key.clone()).or_default();
            entry.data = Some(data);
            entry.is_error = false;
            entry.generation = generation;
            entry.snapshot()
        };
        if revalidate {
            self.revalidate(key).await
        } else {
            snapshot
        }
    }

    /// Edit cached data in place. Returns `false` when nothing is cached.
    pub fn update<F>(&self, key: &CacheKey, edit: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let generation = self.next_generation();
        let mut entries = self.entries();
        let Some(data) = entries
            .get_mut(key)
            .and_then(|entry| {
                entry.generation = generation;
                entry.data.as_mut()
            })
        else {
            return false;
        };
        edit(data);
        true
    }

    /// Mark `key` stale: refetch when a fetcher is registered, otherwise drop its data.
    pub async fn invalidate(&self, key: &CacheKey) -> FetchState<T> {
        let has_fetcher = self
            .entries()
            .get(key)
            .is_some_and(|entry| entry.fetcher.is_some());
        if has_fetcher {
            return self.revalidate(key).await;
        }
        self.entries().remove(key);
        FetchState::idle()
    }
}
