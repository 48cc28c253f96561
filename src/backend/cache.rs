//! Native dimension cache.
//!
//! Maps an image identifier to the dimensions the backend reported for it.
//! Entries are created on first use and never refreshed, so the cache lives
//! as long as the process. A capacity can be set to bound memory, in which
//! case least-recently-used identifiers are evicted.
//!
//! Concurrent lookups for the same cold identifier share one fetch. A failed
//! fetch is not cached; the next lookup tries again.

use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::debug;

use crate::iiif::NativeDimensions;

/// Read-through cache of native image dimensions.
pub struct DimensionCache {
    /// Described dimensions indexed by identifier
    entries: RwLock<LruCache<String, NativeDimensions>>,

    /// Fetches currently running, for single-flight
    in_flight: Mutex<HashMap<String, Arc<OnceCell<NativeDimensions>>>>,
}

impl DimensionCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::from_lru(LruCache::unbounded())
    }

    /// Create a cache holding at most `capacity` identifiers.
    ///
    /// A capacity of zero means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Self::from_lru(LruCache::new(capacity)),
            None => Self::new(),
        }
    }

    fn from_lru(entries: LruCache<String, NativeDimensions>) -> Self {
        Self {
            entries: RwLock::new(entries),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Look up cached dimensions, marking the entry as recently used.
    pub async fn get(&self, identifier: &str) -> Option<NativeDimensions> {
        let mut entries = self.entries.write().await;
        entries.get(identifier).copied()
    }

    /// Return cached dimensions, or run `fetch` and cache its result.
    ///
    /// Errors from `fetch` are returned as-is and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        identifier: &str,
        fetch: F,
    ) -> Result<NativeDimensions, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<NativeDimensions, E>>,
    {
        if let Some(dims) = self.get(identifier).await {
            debug!(identifier, "Dimension cache hit");
            return Ok(dims);
        }

        debug!(identifier, "Dimension cache miss");

        let cell = {
            let mut in_flight = self.in_flight.lock().await;

            // A fetch may have completed between the lookup above and taking the lock
            if let Some(dims) = self.get(identifier).await {
                return Ok(dims);
            }

            in_flight
                .entry(identifier.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell.get_or_try_init(fetch).await.copied();

        if let Ok(dims) = result {
            let mut entries = self.entries.write().await;
            entries.put(identifier.to_string(), dims);
        }

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(identifier)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(identifier);
            }
        }

        result
    }

    /// Number of cached identifiers.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for DimensionCache {
    fn default() -> Self {
        Self::new()
    }
}
