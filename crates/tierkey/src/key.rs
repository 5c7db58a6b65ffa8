//! Key contracts and the single-identity key types

use std::fmt;

use crate::hash::{polynomial, str_identity};

/// A cache key: equality plus a 64-bit numeric identity
///
/// The identity is a storage index, not a unique id. Two unequal keys may
/// share one, and caches fall back to `Eq` to tell them apart. `Display` is
/// the canonical string form used in logs.
pub trait Key: Clone + Eq + fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Numeric identity of the whole key
    fn identity(&self) -> i64;
}

/// A key made of an ordered sequence of identities
///
/// The first identity is the broadest scope. A key whose sequence is a strict
/// prefix of another's is that key's ancestor in the tree cache.
pub trait CompositeKey: Key {
    /// Identity sequence, broadest first
    fn identities(&self) -> &[i64];

    /// Number of identities in the key
    fn depth(&self) -> usize {
        self.identities().len()
    }

    /// True when `self` is an ancestor of, or equal to, `other` by identity
    fn is_prefix_of<O: CompositeKey>(&self, other: &O) -> bool {
        other.identities().starts_with(self.identities())
    }
}

/// Identity of a composite key seen as a single key
pub(crate) fn fold_identities(ids: &[i64]) -> i64 {
    polynomial(ids.iter().copied())
}

/// Signed integer key; the identity is the value itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntKey(pub i64);

impl Key for IntKey {
    fn identity(&self) -> i64 {
        self.0
    }
}

impl CompositeKey for IntKey {
    fn identities(&self) -> &[i64] {
        std::slice::from_ref(&self.0)
    }
}

impl fmt::Display for IntKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IntKey {
    fn from(v: i64) -> Self {
        IntKey(v)
    }
}

/// Unsigned integer key; the identity reinterprets the bits as `i64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UintKey {
    value: u64,
    id: i64,
}

impl UintKey {
    /// Create a key from an unsigned value
    pub fn new(value: u64) -> Self {
        Self {
            value,
            id: value as i64,
        }
    }

    /// The wrapped value
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl Key for UintKey {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl CompositeKey for UintKey {
    fn identities(&self) -> &[i64] {
        std::slice::from_ref(&self.id)
    }
}

impl fmt::Display for UintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<u64> for UintKey {
    fn from(v: u64) -> Self {
        UintKey::new(v)
    }
}

/// String key with a polynomial identity over its bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrKey {
    value: String,
    id: i64,
}

impl StrKey {
    /// Create a key from a string
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let id = str_identity(&value);
        Self { value, id }
    }

    /// The wrapped string
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Key for StrKey {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl CompositeKey for StrKey {
    fn identities(&self) -> &[i64] {
        std::slice::from_ref(&self.id)
    }
}

impl fmt::Display for StrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl From<&str> for StrKey {
    fn from(v: &str) -> Self {
        StrKey::new(v)
    }
}

impl From<String> for StrKey {
    fn from(v: String) -> Self {
        StrKey::new(v)
    }
}
