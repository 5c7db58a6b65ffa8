//! Change and TTL bookkeeping shared by every cache kind
//!
//! Storage and bookkeeping are two independent indices over the same keys.
//! Both are bucketed by identity and resolve collisions with `Eq`. Every
//! mutating cache operation updates both while holding the cache lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ahash::RandomState;
use tierkey::Key;

/// A stored `(key, value)` pair
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

/// Upsert by value equality: replace an equal value of the same key, or append
///
/// Returns true when a new entry was appended.
pub(crate) fn upsert<K, V>(bucket: &mut Vec<Entry<K, V>>, key: &K, value: V) -> bool
where
    K: Clone + PartialEq,
    V: PartialEq,
{
    match bucket
        .iter_mut()
        .find(|e| e.key == *key && e.value == value)
    {
        Some(entry) => {
            entry.value = value;
            false
        }
        None => {
            bucket.push(Entry {
                key: key.clone(),
                value,
            });
            true
        }
    }
}

/// Pending changes plus last-write instants
#[derive(Debug)]
pub(crate) struct Tracker<K> {
    ttl: Option<Duration>,
    /// Pending change list, unique by key equality, in first-write order
    changes: Vec<K>,
    /// Identity -> chain of (key, last write), loud and quiet writes alike
    written: HashMap<i64, Vec<(K, Instant)>, RandomState>,
    last_write: Option<Instant>,
}

impl<K: Key> Tracker<K> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            changes: Vec::new(),
            written: HashMap::default(),
            last_write: None,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Stamp a write; `notify` also queues the key as a pending change
    pub fn record_write(&mut self, key: &K, notify: bool) {
        let now = Instant::now();
        let chain = self.written.entry(key.identity()).or_default();
        match chain.iter_mut().find(|(k, _)| k == key) {
            Some((_, at)) => *at = now,
            None => chain.push((key.clone(), now)),
        }
        self.last_write = Some(now);

        if notify && !self.changes.contains(key) {
            self.changes.push(key.clone());
        }
    }

    /// Stop tracking one key
    pub fn forget(&mut self, key: &K) {
        self.changes.retain(|k| k != key);
        let id = key.identity();
        if let Some(chain) = self.written.get_mut(&id) {
            chain.retain(|(k, _)| k != key);
            if chain.is_empty() {
                self.written.remove(&id);
            }
        }
    }

    /// Stop tracking every key matching `pred`
    pub fn forget_where<F>(&mut self, pred: F)
    where
        F: Fn(&K) -> bool,
    {
        self.changes.retain(|k| !pred(k));
        self.written.retain(|_, chain| {
            chain.retain(|(k, _)| !pred(k));
            !chain.is_empty()
        });
    }

    pub fn clear(&mut self) {
        self.changes.clear();
        self.written.clear();
        self.last_write = None;
    }

    pub fn changes(&self) -> Vec<K> {
        self.changes.clone()
    }

    pub fn acknowledge(&mut self, keys: &[K]) {
        self.changes.retain(|k| !keys.contains(k));
    }

    pub fn take_changes(&mut self) -> Vec<K> {
        std::mem::take(&mut self.changes)
    }

    fn stamp(&self, key: &K) -> Option<Instant> {
        self.written
            .get(&key.identity())?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, at)| *at)
    }

    /// TTL predicate
    ///
    /// Without a TTL nothing is outdated. With one, a key (or the whole cache
    /// when `key` is `None`) that was never written counts as outdated.
    pub fn outdated(&self, key: Option<&K>) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        let stamp = match key {
            Some(k) => self.stamp(k),
            None => self.last_write,
        };

        match stamp {
            Some(at) => at.elapsed() > ttl,
            None => true,
        }
    }

    /// True only for a tracked key whose last write is older than the TTL
    pub fn expired(&self, key: &K) -> bool {
        match (self.ttl, self.stamp(key)) {
            (Some(ttl), Some(at)) => at.elapsed() > ttl,
            _ => false,
        }
    }

    /// Every tracked key past the TTL, whether or not it is a pending change
    pub fn expired_keys(&self) -> Vec<K> {
        let Some(ttl) = self.ttl else {
            return Vec::new();
        };
        self.written
            .values()
            .flatten()
            .filter(|(_, at)| at.elapsed() > ttl)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Number of tracked keys
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.written.values().map(Vec::len).sum()
    }
}
