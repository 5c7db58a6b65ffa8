//! Content-hash keys
//!
//! Identity comes from hashing the wrapped value's content with the fixed-seed
//! fast hash. Content is always hashed, never addresses: two equal values held
//! behind different `Arc`s or boxes produce the same identity.

use std::fmt;
use std::hash::Hash;

use crate::hash::content_hash;
use crate::key::{fold_identities, CompositeKey, Key};

/// Single key identified by the content hash of any hashable value
///
/// Equality compares the wrapped values, so distinct values whose hashes
/// collide remain distinct keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKey<T> {
    value: T,
    id: i64,
}

impl<T> ContentKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Wrap a value
    pub fn new(value: T) -> Self {
        let id = content_hash(&value) as i64;
        Self { value, id }
    }

    /// The wrapped value
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Key for ContentKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn identity(&self) -> i64 {
        self.id
    }
}

impl<T> CompositeKey for ContentKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn identities(&self) -> &[i64] {
        std::slice::from_ref(&self.id)
    }
}

impl<T: fmt::Debug> fmt::Display for ContentKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

/// Composite key whose parts are identified by their content hashes
///
/// The parts are kept alongside their hashes and equality compares the parts,
/// so two paths whose hashes collide stay distinct keys. Mix part types with
/// an enum or [`Component`](crate::Component).
///
/// ```
/// use tierkey::{CompositeKey, ContentCompositeKey};
///
/// let key = ContentCompositeKey::new([("tenant", 7), ("region", 2)]);
/// assert_eq!(key.depth(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ContentCompositeKey<T> {
    parts: Vec<T>,
    ids: Vec<i64>,
}

impl<T> ContentCompositeKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Build a key from its parts, broadest first
    pub fn new<I: IntoIterator<Item = T>>(parts: I) -> Self {
        let parts: Vec<T> = parts.into_iter().collect();
        let ids = parts.iter().map(|p| content_hash(p) as i64).collect();
        Self { parts, ids }
    }

    /// Parts of the key
    pub fn parts(&self) -> &[T] {
        &self.parts
    }

    /// Key extended by one part
    pub fn child(&self, part: T) -> Self {
        let mut key = self.clone();
        key.ids.push(content_hash(&part) as i64);
        key.parts.push(part);
        key
    }
}

impl<T: PartialEq> PartialEq for ContentCompositeKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids && self.parts == other.parts
    }
}

impl<T: Eq> Eq for ContentCompositeKey<T> {}

impl<T> Key for ContentCompositeKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn identity(&self) -> i64 {
        fold_identities(&self.ids)
    }
}

impl<T> CompositeKey for ContentCompositeKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn identities(&self) -> &[i64] {
        &self.ids
    }
}

impl<T: fmt::Debug> fmt::Display for ContentCompositeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.parts)
    }
}

impl<T> FromIterator<T> for ContentCompositeKey<T>
where
    T: Hash + Eq + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Order {
        id: u32,
        region: String,
    }

    #[test]
    fn test_content_key_by_content() {
        let a = ContentKey::new(Order {
            id: 1,
            region: "eu".into(),
        });
        let b = ContentKey::new(Order {
            id: 1,
            region: "eu".into(),
        });
        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.value().id, 1);
    }

    #[test]
    fn test_content_key_ignores_pointer_identity() {
        let a = ContentKey::new(Arc::new("shared".to_string()));
        let b = ContentKey::new(Arc::new("shared".to_string()));
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a, b);
    }

    /// Hashes only the shard, so distinct names collide
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Shard {
        shard: u8,
        name: &'static str,
    }

    impl Hash for Shard {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.shard.hash(state);
        }
    }

    #[test]
    fn test_content_composite() {
        let a = ContentCompositeKey::new(["orders", "7"]);
        let b = ContentCompositeKey::new(["orders"]).child("7");
        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.depth(), 2);
        assert_eq!(a.parts(), &["orders", "7"]);
        assert!(ContentCompositeKey::new(["orders"]).is_prefix_of(&a));
        assert_eq!(a.to_string(), r#"["orders", "7"]"#);
    }

    #[test]
    fn test_content_composite_collision_stays_distinct() {
        let a = ContentCompositeKey::new([Shard { shard: 1, name: "a" }]);
        let b: ContentCompositeKey<Shard> =
            std::iter::once(Shard { shard: 1, name: "b" }).collect();

        assert_eq!(a.identities(), b.identities());
        assert_ne!(a, b);
    }
}
