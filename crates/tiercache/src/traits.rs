//! Interfaces shared across cache kinds

use tierkey::{CacheValue, CompositeKey, Key};

/// A cache holding many values per composite key
///
/// Implemented by [`TreeCache`](crate::TreeCache), which answers broader-key
/// lookups from its hierarchy, and [`HashCache`](crate::HashCache), which only
/// matches exact keys.
pub trait MultiCache<K: CompositeKey, V: CacheValue>: Send + Sync {
    /// Upsert values under `key` and queue the key as changed
    fn put<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>;

    /// Replace everything stored under `key` and queue the key as changed
    fn set<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>;

    /// [`put`](Self::put) without change tracking
    fn put_quietly<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>;

    /// [`set`](Self::set) without change tracking
    fn set_quietly<I>(&self, key: &K, values: I)
    where
        I: IntoIterator<Item = V>;

    /// Copies of the values visible under `key`; empty on a miss
    fn get(&self, key: &K) -> Vec<V>;

    /// Pending changed keys; does not clear them
    fn changes(&self) -> Vec<K>;

    /// Remove the given keys from the pending changes
    fn acknowledge(&self, keys: &[K]);

    /// Return and clear the pending changes in one step
    fn take_changes(&self) -> Vec<K>;

    /// Remove every entry and all bookkeeping
    fn clear(&self);

    /// Remove `key` and stop tracking it; true if anything was stored
    fn drop_key(&self, key: &K) -> bool;

    /// TTL predicate for `key`, or for the whole cache when `None`
    fn outdated(&self, key: Option<&K>) -> bool;
}

/// A cache that a [`Managed`](crate::Managed) sweeper can evict from
pub trait Sweepable: Send + Sync + 'static {
    /// Key type of the cache
    type Key: Key;

    /// Every key whose last write is older than the TTL
    ///
    /// Covers quiet writes and acknowledged changes alike. Empty without a
    /// TTL.
    fn sweep_candidates(&self) -> Vec<Self::Key>;

    /// Remove `key` if it is still expired
    ///
    /// The TTL check and the removal happen under one lock, so a write that
    /// refreshed the key after [`sweep_candidates`](Self::sweep_candidates)
    /// keeps it alive.
    fn evict_if_expired(&self, key: &Self::Key) -> bool;

    /// Evict every expired candidate, returning how many were evicted
    fn sweep(&self) -> usize {
        self.sweep_candidates()
            .iter()
            .filter(|key| self.evict_if_expired(key))
            .count()
    }
}
