//! Time-based cache with refresh-ahead reloading.
//!
//! Entries expire after a hard TTL. A read that lands between the
//! refresh threshold and the TTL returns the held value immediately and
//! kicks off one background reload, so steady traffic never waits on a
//! provider round trip. Only a cold or fully expired read blocks its
//! caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::RwLock;

struct CacheEntry<T> {
    value: Arc<T>,
    loaded_at: Instant,
    /// Set while a background reload for this key is in flight, so
    /// overlapping reads trigger at most one reload.
    refreshing: bool,
}

/// Point-in-time counters for one cache.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Keyed cache of loaded values with TTL expiry and refresh-ahead.
pub struct TimedCache<T> {
    entries: Arc<RwLock<HashMap<String, CacheEntry<T>>>>,
    ttl: Duration,
    refresh_after: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Default + Send + Sync + 'static> TimedCache<T> {
    pub fn new(ttl: Duration, refresh_after: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            refresh_after,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Fetch the value for `key`, calling `load` when it is cold or expired.
    ///
    /// The loader returns `None` on failure. A failed cold load caches the
    /// empty default; a failed background reload keeps the previous value.
    pub async fn get<F, Fut>(&self, key: &str, load: F) -> Arc<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                let age = entry.loaded_at.elapsed();
                if age < self.ttl {
                    let value = Arc::clone(&entry.value);
                    let wants_refresh = age >= self.refresh_after && !entry.refreshing;
                    drop(entries);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    if wants_refresh {
                        self.spawn_reload(key.to_string(), load, false);
                    }
                    return value;
                }
            }
        }

        // Cold or expired: this caller blocks on the load.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(load().await.unwrap_or_default());
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::clone(&value),
                loaded_at: Instant::now(),
                refreshing: false,
            },
        );
        value
    }

    /// Reload `key` in the background regardless of its age, inserting
    /// the entry if it is not cached yet.
    pub fn refresh<F, Fut>(&self, key: &str, load: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        self.spawn_reload(key.to_string(), load, true);
    }

    fn spawn_reload<F, Fut>(&self, key: String, load: F, insert_if_absent: bool)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            {
                let mut map = entries.write().await;
                match map.get_mut(&key) {
                    Some(entry) if entry.refreshing => return,
                    Some(entry) => entry.refreshing = true,
                    None if insert_if_absent => {}
                    None => return,
                }
            }
            let loaded = load().await;
            let mut map = entries.write().await;
            match (map.get_mut(&key), loaded) {
                (Some(entry), Some(value)) => {
                    entry.value = Arc::new(value);
                    entry.loaded_at = Instant::now();
                    entry.refreshing = false;
                }
                (Some(entry), None) => {
                    // Keep serving the previous value.
                    entry.refreshing = false;
                }
                (None, Some(value)) => {
                    map.insert(
                        key,
                        CacheEntry {
                            value: Arc::new(value),
                            loaded_at: Instant::now(),
                            refreshing: false,
                        },
                    );
                }
                (None, None) => {}
            }
        });
    }

    /// Drop one entry. The next read for it blocks on a fresh load.
    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every entry.
    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
