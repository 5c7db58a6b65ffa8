//! Single-value cache keyed by key identity

use std::collections::HashMap;
use std::time::Duration;

use ahash::RandomState;
use parking_lot::RwLock;
use tierkey::{CacheValue, Key};
use tracing::debug;

use crate::config::CacheConfig;
use crate::stats::CacheStats;
use crate::traits::Sweepable;
use crate::tracker::{Entry, Tracker};

/// One value per key, with change tracking and TTL
///
/// Entries live in identity buckets. Keys that share an identity form a
/// collision chain inside the bucket and are told apart by `Eq`.
pub struct Cache<K, V> {
    /// Storage and bookkeeping behind one lock
    inner: RwLock<Inner<K, V>>,

    /// Cache statistics
    stats: CacheStats,
}

struct Inner<K, V> {
    buckets: HashMap<i64, Vec<Entry<K, V>>, RandomState>,
    tracker: Tracker<K>,
    len: usize,
}

impl<K: Key, V> Inner<K, V> {
    /// Remove the equal key and its tracking; siblings in the chain stay
    fn remove(&mut self, key: &K) -> bool {
        let id = key.identity();
        let mut removed = false;
        if let Some(chain) = self.buckets.get_mut(&id) {
            let before = chain.len();
            chain.retain(|e| e.key != *key);
            removed = chain.len() < before;
            if chain.is_empty() {
                self.buckets.remove(&id);
            }
        }

        if removed {
            self.len -= 1;
        }
        self.tracker.forget(key);
        removed
    }
}

impl<K: Key, V: CacheValue> Cache<K, V> {
    /// Create a new cache
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime since last write; `None` never expires
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                buckets: HashMap::default(),
                tracker: Tracker::new(ttl),
                len: 0,
            }),
            stats: CacheStats::new(),
        }
    }

    /// Create a cache from a configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl)
    }

    /// Store `value` under `key` and queue the key as changed
    pub fn set(&self, key: &K, value: V) {
        self.write(key, value, true);
    }

    /// Store `value` under `key` without change tracking
    ///
    /// Meant for bulk warm-loading that downstream change consumers should
    /// not see.
    pub fn set_quietly(&self, key: &K, value: V) {
        self.write(key, value, false);
    }

    fn write(&self, key: &K, value: V, notify: bool) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let chain = inner.buckets.entry(key.identity()).or_default();

        let inserted = match chain.iter_mut().find(|e| e.key == *key) {
            Some(entry) => {
                entry.value = value;
                false
            }
            None => {
                chain.push(Entry {
                    key: key.clone(),
                    value,
                });
                true
            }
        };

        inner.tracker.record_write(key, notify);
        if inserted {
            inner.len += 1;
            self.stats.record_writes(1);
        }
    }

    /// Get a copy of the value stored under `key`
    ///
    /// # Returns
    /// * `Option<V>` - `None` when no equal key is stored
    pub fn get(&self, key: &K) -> Option<V> {
        let inner = self.inner.read();
        let value = inner
            .buckets
            .get(&key.identity())
            .and_then(|chain| chain.iter().find(|e| e.key == *key))
            .map(|e| e.value.clone());

        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    /// Check whether `key` is stored, without touching statistics
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner
            .read()
            .buckets
            .get(&key.identity())
            .is_some_and(|chain| chain.iter().any(|e| e.key == *key))
    }

    /// Pending changed keys; does not clear them
    pub fn changes(&self) -> Vec<K> {
        self.inner.read().tracker.changes()
    }

    /// Remove the given keys from the pending changes
    pub fn acknowledge(&self, keys: &[K]) {
        self.inner.write().tracker.acknowledge(keys);
    }

    /// Return and clear the pending changes in one step
    pub fn take_changes(&self) -> Vec<K> {
        self.inner.write().tracker.take_changes()
    }

    /// Remove every entry and all bookkeeping
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.len;
        inner.buckets.clear();
        inner.tracker.clear();
        inner.len = 0;
        debug!(count, "cleared cache");
    }

    /// Remove the entry stored under `key`
    ///
    /// Other keys sharing the identity stay in place.
    ///
    /// # Returns
    /// * `bool` - true if an entry was removed
    pub fn drop_key(&self, key: &K) -> bool {
        let removed = self.inner.write().remove(key);
        if removed {
            self.stats.record_drop();
            debug!(%key, "dropped cache key");
        }
        removed
    }

    /// TTL predicate for `key`, or for the whole cache when `None`
    ///
    /// Always false without a TTL. With one, a key never written counts as
    /// outdated.
    pub fn outdated(&self, key: Option<&K>) -> bool {
        self.inner.read().tracker.outdated(key)
    }

    /// Configured TTL
    pub fn ttl(&self) -> Option<Duration> {
        self.inner.read().tracker.ttl()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K: Key, V: CacheValue> Sweepable for Cache<K, V> {
    type Key = K;

    fn sweep_candidates(&self) -> Vec<K> {
        self.inner.read().tracker.expired_keys()
    }

    fn evict_if_expired(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        if !inner.tracker.expired(key) {
            return false;
        }
        let removed = inner.remove(key);
        drop(inner);

        if removed {
            self.stats.record_expiration();
            debug!(%key, "expired cache key");
        }
        removed
    }
}
