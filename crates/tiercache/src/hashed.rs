//! Flat multi-value cache over flattened key hashes

use std::collections::HashMap;
use std::time::Duration;

use ahash::RandomState;
use parking_lot::RwLock;
use tierkey::{CacheValue, CompositeKey, FlatKey, FlattenStrategy};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::stats::CacheStats;
use crate::traits::{MultiCache, Sweepable};
use crate::tracker::{upsert, Entry, Tracker};

struct Inner<K, V> {
    buckets: HashMap<FlatKey, Vec<Entry<K, V>>, RandomState>,
    tracker: Tracker<K>,
}

impl<K: CompositeKey, V: CacheValue> Inner<K, V> {
    /// Remove the key's entries and its tracking; colliding keys stay
    fn remove(&mut self, flat: &FlatKey, key: &K) -> usize {
        self.tracker.forget(key);
        let Some(bucket) = self.buckets.get_mut(flat) else {
            return 0;
        };
        let before = bucket.len();
        bucket.retain(|e| e.key != *key);
        let removed = before - bucket.len();
        if bucket.is_empty() {
            self.buckets.remove(flat);
        }
        removed
    }
}

/// Multi-value cache with exact-match lookups
///
/// The whole identity sequence of a key is flattened into one hash, so
/// `[1, 2, 3]` and `[1, 2, 3, 4]` live in unrelated buckets. Keys whose
/// flattened hashes collide share a bucket and are told apart by `Eq`.
pub struct HashCache<K, V> {
    inner: RwLock<Inner<K, V>>,
    strategy: FlattenStrategy,
    stats: CacheStats,
}

impl<K: CompositeKey, V: CacheValue> HashCache<K, V> {
    /// Create a new hash cache
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime since last write; `None` never expires
    /// * `strategy` - How composite keys are flattened into bucket hashes
    pub fn new(ttl: Option<Duration>, strategy: FlattenStrategy) -> Self {
        Self {
            inner: RwLock::new(Inner {
                buckets: HashMap::default(),
                tracker: Tracker::new(ttl),
            }),
            strategy,
            stats: CacheStats::new(),
        }
    }

    /// Create a hash cache from a configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.flatten)
    }

    fn write<I>(&self, key: &K, values: I, replace: bool, notify: bool)
    where
        I: IntoIterator<Item = V>,
    {
        let values: Vec<V> = values.into_iter().collect();
        let flat = self.strategy.flatten(key.identities());
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if replace {
            inner.remove(&flat, key);
        }
        if values.is_empty() {
            if !replace {
                warn!(%key, "ignoring put without values");
            }
            return;
        }

        let bucket = inner.buckets.entry(flat).or_default();
        let mut added = 0;
        for value in values {
            if upsert(bucket, key, value) {
                added += 1;
            }
        }
        inner.tracker.record_write(key, notify);
        self.stats.record_writes(added);
    }

    /// Check if `key` has entries
    pub fn contains_key(&self, key: &K) -> bool {
        let flat = self.strategy.flatten(key.identities());
        self.inner
            .read()
            .buckets
            .get(&flat)
            .is_some_and(|b| b.iter().any(|e| e.key == *key))
    }

    /// Number of stored `(key, value)` pairs
    pub fn len(&self) -> usize {
        self.inner.read().buckets.values().map(Vec::len).sum()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().buckets.is_empty()
    }

    /// Flattening strategy in use
    pub fn strategy(&self) -> FlattenStrategy {
        self.strategy
    }

    /// Configured TTL
    pub fn ttl(&self) -> Option<Duration> {
        self.inner.read().tracker.ttl()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K: CompositeKey, V: CacheValue> MultiCache<K, V> for HashCache<K, V> {
    fn put<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        self.write(key, values, false, true);
    }

    fn set<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        self.write(key, values, true, true);
    }

    fn put_quietly<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        self.write(key, values, false, false);
    }

    fn set_quietly<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        self.write(key, values, true, false);
    }

    fn get(&self, key: &K) -> Vec<V> {
        let flat = self.strategy.flatten(key.identities());
        let values: Vec<V> = self
            .inner
            .read()
            .buckets
            .get(&flat)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter(|e| e.key == *key)
                    .map(|e| e.value.clone())
                    .collect()
            })
            .unwrap_or_default();

        if values.is_empty() {
            self.stats.record_miss();
        } else {
            self.stats.record_hit();
        }
        values
    }

    fn changes(&self) -> Vec<K> {
        self.inner.read().tracker.changes()
    }

    fn acknowledge(&self, keys: &[K]) {
        self.inner.write().tracker.acknowledge(keys);
    }

    fn take_changes(&self) -> Vec<K> {
        self.inner.write().tracker.take_changes()
    }

    fn clear(&self) {
        let mut inner = self.inner.write();
        let count = inner.buckets.len();
        inner.buckets.clear();
        inner.tracker.clear();
        debug!(buckets = count, "cleared hash cache");
    }

    fn drop_key(&self, key: &K) -> bool {
        let flat = self.strategy.flatten(key.identities());
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let removed = inner.remove(&flat, key);

        if removed > 0 {
            self.stats.record_drop();
            debug!(%key, %flat, removed, "dropped hash cache key");
        }
        removed > 0
    }

    fn outdated(&self, key: Option<&K>) -> bool {
        self.inner.read().tracker.outdated(key)
    }
}

impl<K: CompositeKey, V: CacheValue> Sweepable for HashCache<K, V> {
    type Key = K;

    fn sweep_candidates(&self) -> Vec<K> {
        self.inner.read().tracker.expired_keys()
    }

    fn evict_if_expired(&self, key: &K) -> bool {
        let flat = self.strategy.flatten(key.identities());
        let mut inner = self.inner.write();
        if !inner.tracker.expired(key) {
            return false;
        }
        let removed = inner.remove(&flat, key);
        drop(inner);

        if removed > 0 {
            self.stats.record_expiration();
            debug!(%key, removed, "expired hash cache key");
        }
        removed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use tierkey::{IntCompositeKey, StrCompositeKey};

    fn caches() -> Vec<HashCache<IntCompositeKey, &'static str>> {
        vec![
            HashCache::new(None, FlattenStrategy::Fast64),
            HashCache::new(None, FlattenStrategy::Sha256),
        ]
    }

    #[test]
    fn test_exact_match_only() {
        for cache in caches() {
            cache.put(&IntCompositeKey::new([1, 2, 3]), ["abc"]);
            cache.put(&IntCompositeKey::new([1, 2, 3, 4]), ["abcd"]);

            assert_eq!(cache.get(&IntCompositeKey::new([1, 2, 3])), vec!["abc"]);
            assert_eq!(cache.get(&IntCompositeKey::new([1, 2, 3, 4])), vec!["abcd"]);
            assert!(cache.get(&IntCompositeKey::new([1, 2])).is_empty());
        }
    }

    #[test]
    fn test_drop_is_not_hierarchical() {
        for cache in caches() {
            let short = IntCompositeKey::new([1, 2, 3]);
            let long = IntCompositeKey::new([1, 2, 3, 4]);
            cache.put(&short, ["abc"]);
            cache.put(&long, ["abcd"]);

            assert!(cache.drop_key(&short));
            assert!(cache.get(&short).is_empty());
            assert_eq!(cache.get(&long), vec!["abcd"]);
            assert_eq!(cache.changes(), vec![long]);
        }
    }

    #[test]
    fn test_put_upserts_by_value() {
        let cache = HashCache::new(None, FlattenStrategy::default());
        let k = StrCompositeKey::new(["a", "b"]);
        cache.put(&k, [1, 2]);
        cache.put(&k, [2, 3]);

        assert_eq!(cache.get(&k), vec![1, 2, 3]);
        assert_eq!(cache.len(), 3);
        assert!(cache.contains_key(&k));
    }

    #[test]
    fn test_set_replaces() {
        let cache = HashCache::new(None, FlattenStrategy::Sha256);
        let k = StrCompositeKey::new(["a"]);
        cache.put(&k, [1, 2]);
        cache.set(&k, [3]);
        assert_eq!(cache.get(&k), vec![3]);

        cache.set(&k, Vec::new());
        assert!(cache.get(&k).is_empty());
        assert!(!cache.contains_key(&k));
        assert!(cache.changes().is_empty());
    }

    #[test]
    fn test_quiet_writes() {
        let cache = HashCache::new(None, FlattenStrategy::Fast64);
        cache.put_quietly(&IntCompositeKey::new([1]), [1]);
        cache.set_quietly(&IntCompositeKey::new([2]), [2]);

        assert!(cache.changes().is_empty());
        assert_eq!(cache.get(&IntCompositeKey::new([2])), vec![2]);
    }

    #[test]
    fn test_acknowledge() {
        let cache = HashCache::new(None, FlattenStrategy::Fast64);
        let a = IntCompositeKey::new([1]);
        let b = IntCompositeKey::new([2]);
        cache.put(&a, [1]);
        cache.put(&b, [2]);

        cache.acknowledge(&[a.clone()]);
        assert_eq!(cache.changes(), vec![b.clone()]);
        assert_eq!(cache.take_changes(), vec![b]);
        assert!(cache.changes().is_empty());
        assert_eq!(cache.get(&a), vec![1]);
    }

    #[test]
    fn test_clear() {
        let cache = HashCache::new(None, FlattenStrategy::Fast64);
        cache.put(&IntCompositeKey::new([1]), [1]);
        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.changes().is_empty());
    }

    #[test]
    fn test_with_config() {
        let config = CacheConfig::builder()
            .ttl(Duration::from_secs(5))
            .flatten(FlattenStrategy::Sha256)
            .build();
        let cache: HashCache<IntCompositeKey, u8> = HashCache::with_config(&config);

        assert_eq!(cache.strategy(), FlattenStrategy::Sha256);
        assert_eq!(cache.ttl(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_ttl_and_sweep() {
        let cache = HashCache::new(Some(Duration::from_millis(30)), FlattenStrategy::Fast64);
        let old = IntCompositeKey::new([1]);
        let new = IntCompositeKey::new([2]);
        cache.put(&old, [1]);
        sleep(Duration::from_millis(50));
        cache.put(&new, [2]);

        assert!(cache.outdated(Some(&old)));
        assert!(!cache.outdated(None));
        assert_eq!(cache.sweep(), 1);
        assert!(cache.get(&old).is_empty());
        assert_eq!(cache.stats().expirations(), 1);
    }

    #[test]
    fn test_sweep_covers_quiet_and_acknowledged_keys() {
        let cache = HashCache::new(Some(Duration::from_millis(30)), FlattenStrategy::Fast64);
        cache.put_quietly(&IntCompositeKey::new([1]), [1]);
        cache.put(&IntCompositeKey::new([2]), [2]);
        cache.acknowledge(&[IntCompositeKey::new([2])]);
        sleep(Duration::from_millis(50));

        assert_eq!(cache.sweep(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_refreshed_key_survives_eviction() {
        let cache = HashCache::new(Some(Duration::from_millis(20)), FlattenStrategy::Sha256);
        let k = IntCompositeKey::new([1, 2]);
        cache.put(&k, [1]);
        sleep(Duration::from_millis(40));
        assert_eq!(cache.sweep_candidates(), vec![k.clone()]);

        cache.set(&k, [2]);
        assert!(!cache.evict_if_expired(&k));
        assert_eq!(cache.get(&k), vec![2]);
    }

    #[test]
    fn test_writes_count_new_entries() {
        let cache = HashCache::new(None, FlattenStrategy::Fast64);
        let k = IntCompositeKey::new([1]);
        cache.put(&k, [1, 2]);
        cache.put(&k, [2, 3]);
        assert_eq!(cache.stats().writes(), 3);
    }
}
