//! Hierarchical multi-value cache
//!
//! Storage is a trie over identity sequences. Every node owns a flat bucket
//! of `(key, value)` pairs for keys that end at that depth. A node gains a
//! child map the first time some key continues past it, and keeps it from
//! then on.
//!
//! ```text
//! root
//!  ├── "category"      bucket: [category]            children: yes
//!  │    └── "kp_2"     bucket: [category, kp_2]      children: none
//!  └── "category2"     bucket: []                    children: yes
//!       └── "kp_2"     bucket: [category2, kp_2]     children: none
//! ```
//!
//! Lookups by a broader key flatten the whole subtree beneath it. A lookup
//! that is deeper than a node without children answers with that node's
//! bucket.

use std::collections::HashMap;
use std::time::Duration;

use ahash::RandomState;
use parking_lot::RwLock;
use tierkey::{CacheValue, CompositeKey};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::stats::CacheStats;
use crate::traits::{MultiCache, Sweepable};
use crate::tracker::{upsert, Entry, Tracker};

type Children<K, V> = HashMap<i64, Node<K, V>, RandomState>;

struct Node<K, V> {
    bucket: Vec<Entry<K, V>>,
    /// `None` until a key continues past this node
    children: Option<Children<K, V>>,
}

impl<K: CompositeKey, V: CacheValue> Node<K, V> {
    fn leaf() -> Self {
        Self {
            bucket: Vec::new(),
            children: None,
        }
    }

    fn root() -> Self {
        Self {
            bucket: Vec::new(),
            children: Some(Children::default()),
        }
    }

    /// Walk to the node at `path`, creating and upgrading nodes on the way
    fn descend_mut(&mut self, path: &[i64]) -> &mut Self {
        let mut node = self;
        for id in path {
            node = node
                .children
                .get_or_insert_with(Children::default)
                .entry(*id)
                .or_insert_with(Node::leaf);
        }
        node
    }

    fn lookup(&self, key: &K) -> Vec<V> {
        let mut node = self;
        for id in key.identities() {
            let Some(children) = &node.children else {
                // Query is deeper than anything stored along this path
                return node.bucket.iter().map(|e| e.value.clone()).collect();
            };
            match children.get(id) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }

        let mut out: Vec<V> = node
            .bucket
            .iter()
            .filter(|e| e.key == *key)
            .map(|e| e.value.clone())
            .collect();
        for child in node.children.iter().flat_map(|c| c.values()) {
            child.collect_into(&mut out);
        }
        out
    }

    fn contains(&self, key: &K) -> bool {
        let mut node = self;
        for id in key.identities() {
            match node.children.as_ref().and_then(|c| c.get(id)) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.bucket.iter().any(|e| e.key == *key)
    }

    fn collect_into(&self, out: &mut Vec<V>) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.extend(node.bucket.iter().map(|e| e.value.clone()));
            stack.extend(node.children.iter().flat_map(|c| c.values()));
        }
    }

    fn find_mut(&mut self, path: &[i64]) -> Option<&mut Self> {
        let mut node = self;
        for id in path {
            node = node.children.as_mut()?.get_mut(id)?;
        }
        Some(node)
    }

    /// Remove `key`'s own entries and every descendant below its path
    ///
    /// Entries of other keys that end on the same path are kept. Returns the
    /// number of removed entries.
    fn remove(&mut self, path: &[i64], key: &K) -> usize {
        let Some(target) = self.find_mut(path) else {
            return 0;
        };

        let before = target.bucket.len();
        target.bucket.retain(|e| e.key != *key);
        let mut removed = before - target.bucket.len();
        if let Some(children) = target.children.as_mut() {
            removed += children.values().map(Node::len).sum::<usize>();
            children.clear();
        }

        self.prune(path);
        removed
    }

    /// Unlink empty nodes along `path`, deepest first
    fn prune(&mut self, path: &[i64]) {
        for depth in (1..=path.len()).rev() {
            let id = &path[depth - 1];
            let Some(children) = self
                .find_mut(&path[..depth - 1])
                .and_then(|parent| parent.children.as_mut())
            else {
                return;
            };
            if !children.get(id).is_some_and(Node::is_empty) {
                return;
            }
            children.remove(id);
        }
    }

    /// Stored nodes are never empty, so one level decides
    fn is_empty(&self) -> bool {
        self.bucket.is_empty() && self.children.as_ref().map_or(true, |c| c.is_empty())
    }

    fn len(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += node.bucket.len();
            stack.extend(node.children.iter().flat_map(|c| c.values()));
        }
        total
    }
}

impl<K, V> Drop for Node<K, V> {
    // Unlink children onto a heap stack so deep paths drop without recursion
    fn drop(&mut self) {
        let Some(children) = self.children.take() else {
            return;
        };
        let mut stack: Vec<Node<K, V>> = children.into_values().collect();
        while let Some(mut node) = stack.pop() {
            if let Some(children) = node.children.take() {
                stack.extend(children.into_values());
            }
        }
    }
}

struct Inner<K, V> {
    root: Node<K, V>,
    tracker: Tracker<K>,
}

impl<K: CompositeKey, V: CacheValue> Inner<K, V> {
    /// Returns the number of new entries
    fn insert(&mut self, key: &K, values: Vec<V>, notify: bool) -> usize {
        let node = self.root.descend_mut(key.identities());
        let mut added = 0;
        for value in values {
            if upsert(&mut node.bucket, key, value) {
                added += 1;
            }
        }
        self.tracker.record_write(key, notify);
        added
    }

    fn remove_subtree(&mut self, key: &K) -> usize {
        let removed = self.root.remove(key.identities(), key);
        let depth = key.depth();
        self.tracker.forget_where(|k| {
            k == key || (k.depth() > depth && key.is_prefix_of(k))
        });
        removed
    }
}

/// Multi-value cache with hierarchical, broader-key lookups
///
/// ```
/// use tiercache::{MultiCache, TreeCache};
/// use tierkey::StrCompositeKey;
///
/// let cache = TreeCache::new(None);
/// cache.put(&StrCompositeKey::new(["category"]), ["all"]);
/// cache.put(&StrCompositeKey::new(["category", "kp_2"]), ["one"]);
///
/// let mut values = cache.get(&StrCompositeKey::new(["category"]));
/// values.sort();
/// assert_eq!(values, vec!["all", "one"]);
/// ```
pub struct TreeCache<K, V> {
    inner: RwLock<Inner<K, V>>,
    stats: CacheStats,
}

impl<K: CompositeKey, V: CacheValue> TreeCache<K, V> {
    /// Create a new tree cache
    ///
    /// # Arguments
    /// * `ttl` - Entry lifetime since last write; `None` never expires
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                root: Node::root(),
                tracker: Tracker::new(ttl),
            }),
            stats: CacheStats::new(),
        }
    }

    /// Create a tree cache from a configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl)
    }

    fn write<I>(&self, key: &K, values: I, replace: bool, notify: bool)
    where
        I: IntoIterator<Item = V>,
    {
        let values: Vec<V> = values.into_iter().collect();
        let mut inner = self.inner.write();

        if replace {
            inner.remove_subtree(key);
        }
        if values.is_empty() {
            if !replace {
                warn!(%key, "ignoring put without values");
            }
            return;
        }

        let added = inner.insert(key, values, notify);
        self.stats.record_writes(added as u64);
    }

    /// Check if `key` itself has entries, ignoring descendants
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().root.contains(key)
    }

    /// Number of stored `(key, value)` pairs
    pub fn len(&self) -> usize {
        self.inner.read().root.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().root.is_empty()
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

impl<K: CompositeKey, V: CacheValue> MultiCache<K, V> for TreeCache<K, V> {
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
        let values = self.inner.read().root.lookup(key);
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
        let count = inner.root.len();
        inner.root = Node::root();
        inner.tracker.clear();
        debug!(count, "cleared tree cache");
    }

    fn drop_key(&self, key: &K) -> bool {
        let removed = self.inner.write().remove_subtree(key);
        if removed > 0 {
            self.stats.record_drop();
            debug!(%key, removed, "dropped tree cache subtree");
        }
        removed > 0
    }

    fn outdated(&self, key: Option<&K>) -> bool {
        self.inner.read().tracker.outdated(key)
    }
}

impl<K: CompositeKey, V: CacheValue> Sweepable for TreeCache<K, V> {
    type Key = K;

    fn sweep_candidates(&self) -> Vec<K> {
        self.inner.read().tracker.expired_keys()
    }

    fn evict_if_expired(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        if !inner.tracker.expired(key) {
            return false;
        }
        let removed = inner.remove_subtree(key);
        drop(inner);

        if removed > 0 {
            self.stats.record_expiration();
            debug!(%key, removed, "expired tree cache subtree");
        }
        removed > 0
    }
}
