//! Typed composite keys
//!
//! Each key keeps its components alongside the precomputed identity sequence,
//! so `identities()` is a plain slice borrow and never recomputed.

use std::fmt;

use crate::hash::str_identity;
use crate::key::{fold_identities, CompositeKey, Key};

/// Composite key of signed integers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntCompositeKey {
    parts: Vec<i64>,
}

impl IntCompositeKey {
    /// Create a key from components, broadest first
    pub fn new<I: IntoIterator<Item = i64>>(parts: I) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }

    /// Components of the key
    pub fn parts(&self) -> &[i64] {
        &self.parts
    }

    /// Key one level deeper
    pub fn child(&self, part: i64) -> Self {
        let mut parts = self.parts.clone();
        parts.push(part);
        Self { parts }
    }

    /// Key one level broader, `None` for the empty key
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.parts.split_last()?;
        Some(Self {
            parts: rest.to_vec(),
        })
    }
}

impl Key for IntCompositeKey {
    fn identity(&self) -> i64 {
        fold_identities(&self.parts)
    }
}

impl CompositeKey for IntCompositeKey {
    fn identities(&self) -> &[i64] {
        &self.parts
    }
}

impl fmt::Display for IntCompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.parts)
    }
}

impl FromIterator<i64> for IntCompositeKey {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Composite key of unsigned integers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UintCompositeKey {
    parts: Vec<u64>,
    ids: Vec<i64>,
}

impl UintCompositeKey {
    /// Create a key from components, broadest first
    pub fn new<I: IntoIterator<Item = u64>>(parts: I) -> Self {
        let parts: Vec<u64> = parts.into_iter().collect();
        let ids = parts.iter().map(|&p| p as i64).collect();
        Self { parts, ids }
    }

    /// Components of the key
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Key one level deeper
    pub fn child(&self, part: u64) -> Self {
        Self::new(self.parts.iter().copied().chain(std::iter::once(part)))
    }
}

impl Key for UintCompositeKey {
    fn identity(&self) -> i64 {
        fold_identities(&self.ids)
    }
}

impl CompositeKey for UintCompositeKey {
    fn identities(&self) -> &[i64] {
        &self.ids
    }
}

impl fmt::Display for UintCompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.parts)
    }
}

impl FromIterator<u64> for UintCompositeKey {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Composite key of strings
///
/// ```
/// use tierkey::{CompositeKey, StrCompositeKey};
///
/// let broad = StrCompositeKey::new(["category"]);
/// let narrow = StrCompositeKey::new(["category", "kp_2"]);
/// assert!(broad.is_prefix_of(&narrow));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrCompositeKey {
    parts: Vec<String>,
    ids: Vec<i64>,
}

impl StrCompositeKey {
    /// Create a key from components, broadest first
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        let ids = parts.iter().map(|p| str_identity(p)).collect();
        Self { parts, ids }
    }

    /// Components of the key
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Key one level deeper
    pub fn child(&self, part: impl Into<String>) -> Self {
        let part = part.into();
        let mut ids = self.ids.clone();
        ids.push(str_identity(&part));
        let mut parts = self.parts.clone();
        parts.push(part);
        Self { parts, ids }
    }

    /// Key one level broader, `None` for the empty key
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.parts.split_last()?;
        Some(Self::new(rest.iter().cloned()))
    }
}

impl Key for StrCompositeKey {
    fn identity(&self) -> i64 {
        fold_identities(&self.ids)
    }
}

impl CompositeKey for StrCompositeKey {
    fn identities(&self) -> &[i64] {
        &self.ids
    }
}

impl fmt::Display for StrCompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.parts)
    }
}

impl<S: Into<String>> FromIterator<S> for StrCompositeKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_composite() {
        let key = IntCompositeKey::new([1, 2, 3]);
        assert_eq!(key.identities(), &[1, 2, 3]);
        assert_eq!(key.identity(), (31 + 2) * 31 + 3);
        assert_eq!(key.to_string(), "[1, 2, 3]");
        assert_eq!(key.child(4).identities(), &[1, 2, 3, 4]);
        assert_eq!(key.parent(), Some(IntCompositeKey::new([1, 2])));
        assert_eq!(IntCompositeKey::new(Vec::new()).parent(), None);
    }

    #[test]
    fn test_uint_composite() {
        let key: UintCompositeKey = [1u64, u64::MAX].into_iter().collect();
        assert_eq!(key.identities(), &[1, -1]);
        assert_eq!(key.parts(), &[1, u64::MAX]);
        assert_eq!(key.child(5).depth(), 3);
    }

    #[test]
    fn test_str_composite() {
        let key = StrCompositeKey::new(["category", "kp_2"]);
        assert_eq!(
            key.identities(),
            &[str_identity("category"), str_identity("kp_2")]
        );
        assert_eq!(key.to_string(), r#"["category", "kp_2"]"#);
        assert_eq!(key.parent(), Some(StrCompositeKey::new(["category"])));
        assert_eq!(key, StrCompositeKey::new(["category"]).child("kp_2"));
    }

    #[test]
    fn test_canonical_form_is_unambiguous() {
        let joined = StrCompositeKey::new(["a/b"]);
        let split = StrCompositeKey::new(["a", "b"]);
        assert_ne!(joined.to_string(), split.to_string());
    }

    #[test]
    fn test_prefix_relation() {
        let broad = StrCompositeKey::new(["category"]);
        let narrow = StrCompositeKey::new(["category", "kp_2"]);
        let other = StrCompositeKey::new(["category2", "kp_2"]);
        assert!(broad.is_prefix_of(&narrow));
        assert!(!narrow.is_prefix_of(&broad));
        assert!(!broad.is_prefix_of(&other));
    }
}
