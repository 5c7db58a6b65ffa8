//! Keys over arbitrary comparable primitives
//!
//! [`Comparable`] is a compile-time table from a primitive type to its hash
//! contribution. Types without an entry (slices, maps, closures, structs
//! holding them) cannot form a key at all. [`Component`] is the dynamic
//! counterpart for keys whose parts are only known at runtime.

use std::fmt;

use serde_json::Value;

use crate::error::{KeyError, Result};
use crate::hash::{polynomial, str_identity};
use crate::key::{fold_identities, CompositeKey, Key};

/// A primitive that can contribute to a key identity
pub trait Comparable: Clone + Eq + fmt::Debug + Send + Sync + 'static {
    /// Contribution of this value to a polynomial identity
    fn component_hash(&self) -> i64;
}

macro_rules! comparable_int {
    ($($t:ty),*) => {
        $(
            impl Comparable for $t {
                fn component_hash(&self) -> i64 {
                    *self as i64
                }
            }
        )*
    };
}

comparable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Comparable for bool {
    fn component_hash(&self) -> i64 {
        i64::from(*self)
    }
}

impl Comparable for char {
    fn component_hash(&self) -> i64 {
        i64::from(u32::from(*self))
    }
}

impl Comparable for String {
    fn component_hash(&self) -> i64 {
        str_identity(self)
    }
}

impl Comparable for &'static str {
    fn component_hash(&self) -> i64 {
        str_identity(self)
    }
}

macro_rules! comparable_tuple {
    ($($name:ident $var:ident),+) => {
        impl<$($name: Comparable),+> Comparable for ($($name,)+) {
            fn component_hash(&self) -> i64 {
                let ($($var,)+) = self;
                polynomial([$($var.component_hash()),+])
            }
        }
    };
}

comparable_tuple!(A a, B b);
comparable_tuple!(A a, B b, C c);
comparable_tuple!(A a, B b, C c, D d);

/// Single key wrapping any [`Comparable`] value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparableKey<T: Comparable> {
    value: T,
    id: i64,
}

impl<T: Comparable> ComparableKey<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        let id = value.component_hash();
        Self { value, id }
    }

    /// The wrapped value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Comparable> Key for ComparableKey<T> {
    fn identity(&self) -> i64 {
        self.id
    }
}

impl<T: Comparable> CompositeKey for ComparableKey<T> {
    fn identities(&self) -> &[i64] {
        std::slice::from_ref(&self.id)
    }
}

impl<T: Comparable> fmt::Display for ComparableKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

/// A comparable primitive chosen at runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    Uint(u64),
    /// Float, compared and hashed by bit pattern
    Float(u64),
    /// Boolean
    Bool(bool),
    /// Character
    Char(char),
    /// String
    Str(String),
}

impl Component {
    /// Float component from a value
    pub fn float(v: f64) -> Self {
        Component::Float(v.to_bits())
    }

    /// Float value, if this is a float component
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Component::Float(bits) => Some(f64::from_bits(*bits)),
            _ => None,
        }
    }

    /// Short name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Int(_) => "int",
            Component::Uint(_) => "uint",
            Component::Float(_) => "float",
            Component::Bool(_) => "bool",
            Component::Char(_) => "char",
            Component::Str(_) => "str",
        }
    }

    fn from_json(index: usize, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Component::Bool(*b)),
            Value::String(s) => Ok(Component::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Component::Int(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Component::Uint(u))
                } else {
                    n.as_f64()
                        .map(Component::float)
                        .ok_or(KeyError::UnsupportedComponent {
                            index,
                            kind: "number",
                        })
                }
            }
            Value::Null => Err(KeyError::UnsupportedComponent { index, kind: "null" }),
            Value::Array(_) => Err(KeyError::UnsupportedComponent {
                index,
                kind: "array",
            }),
            Value::Object(_) => Err(KeyError::UnsupportedComponent {
                index,
                kind: "object",
            }),
        }
    }
}

impl Comparable for Component {
    fn component_hash(&self) -> i64 {
        match self {
            Component::Int(i) => *i,
            Component::Uint(u) => *u as i64,
            Component::Float(bits) => *bits as i64,
            Component::Bool(b) => b.component_hash(),
            Component::Char(c) => c.component_hash(),
            Component::Str(s) => str_identity(s),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Int(i) => write!(f, "{}", i),
            Component::Uint(u) => write!(f, "{}u", u),
            Component::Float(bits) => write!(f, "{:?}f", f64::from_bits(*bits)),
            Component::Bool(b) => write!(f, "{}", b),
            Component::Char(c) => write!(f, "{:?}", c),
            Component::Str(s) => write!(f, "{:?}", s),
        }
    }
}

macro_rules! component_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Component {
                fn from(v: $t) -> Self {
                    Component::$variant(v as $target)
                }
            }
        )*
    };
}

component_from!(Int as i64: i8, i16, i32, i64, isize);
component_from!(Uint as u64: u8, u16, u32, u64, usize);

impl From<f32> for Component {
    fn from(v: f32) -> Self {
        Component::float(f64::from(v))
    }
}

impl From<f64> for Component {
    fn from(v: f64) -> Self {
        Component::float(v)
    }
}

impl From<bool> for Component {
    fn from(v: bool) -> Self {
        Component::Bool(v)
    }
}

impl From<char> for Component {
    fn from(v: char) -> Self {
        Component::Char(v)
    }
}

impl From<&str> for Component {
    fn from(v: &str) -> Self {
        Component::Str(v.to_string())
    }
}

impl From<String> for Component {
    fn from(v: String) -> Self {
        Component::Str(v)
    }
}

/// Composite key over mixed comparable primitives
///
/// ```
/// use tierkey::{generic_key, CompositeKey};
///
/// let key = generic_key!("tenant", 42, true);
/// assert_eq!(key.depth(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericCompositeKey {
    components: Vec<Component>,
    ids: Vec<i64>,
}

impl GenericCompositeKey {
    /// Create a key from components of one type
    pub fn new<I, C>(parts: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        Self::from_components(parts.into_iter().map(Into::into).collect())
    }

    /// Create a key from already converted components
    pub fn from_components(components: Vec<Component>) -> Self {
        let ids = components.iter().map(Component::component_hash).collect();
        Self { components, ids }
    }

    /// Build a key from a JSON array of primitives
    ///
    /// Arrays, objects and nulls are not comparable and are rejected.
    pub fn try_from_json(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return Err(KeyError::NotAnArray("null")),
            Value::Bool(_) => return Err(KeyError::NotAnArray("bool")),
            Value::Number(_) => return Err(KeyError::NotAnArray("number")),
            Value::String(_) => return Err(KeyError::NotAnArray("string")),
            Value::Object(_) => return Err(KeyError::NotAnArray("object")),
        };
        let components = items
            .iter()
            .enumerate()
            .map(|(index, item)| Component::from_json(index, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_components(components))
    }

    /// Build a key from a JSON array of primitives
    ///
    /// # Panics
    ///
    /// Panics when any component is not a comparable primitive. Key shape is
    /// a programming invariant; use [`try_from_json`](Self::try_from_json)
    /// for untrusted input.
    pub fn from_json(value: &Value) -> Self {
        match Self::try_from_json(value) {
            Ok(key) => key,
            Err(e) => panic!("invalid generic composite key: {}", e),
        }
    }

    /// Components of the key
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}

impl Key for GenericCompositeKey {
    fn identity(&self) -> i64 {
        fold_identities(&self.ids)
    }
}

impl CompositeKey for GenericCompositeKey {
    fn identities(&self) -> &[i64] {
        &self.ids
    }
}

impl fmt::Display for GenericCompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("]")
    }
}

/// Build a [`GenericCompositeKey`] from heterogeneous primitives
#[macro_export]
macro_rules! generic_key {
    ($($part:expr),* $(,)?) => {
        $crate::GenericCompositeKey::from_components(
            ::std::vec![$($crate::Component::from($part)),*]
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comparable_primitives() {
        assert_eq!(5i32.component_hash(), 5);
        assert_eq!(5u8.component_hash(), 5);
        assert_eq!(true.component_hash(), 1);
        assert_eq!('a'.component_hash(), 97);
        assert_eq!("ab".component_hash(), 31 * 97 + 98);
        assert_eq!("ab".to_string().component_hash(), 31 * 97 + 98);
    }

    #[test]
    fn test_comparable_tuple_uses_recurrence() {
        assert_eq!((1, 2).component_hash(), 31 + 2);
        assert_eq!((1, 2, 3).component_hash(), (31 + 2) * 31 + 3);
    }

    #[test]
    fn test_comparable_key() {
        let key = ComparableKey::new(("user", 7u32));
        assert_eq!(key.identity(), ("user", 7u32).component_hash());
        assert_eq!(key.value(), &("user", 7u32));
        assert_eq!(key.to_string(), "(\"user\", 7)");
        assert_ne!(key, ComparableKey::new(("user", 8u32)));
    }

    #[test]
    fn test_component_conversions() {
        assert_eq!(Component::from(3i16), Component::Int(3));
        assert_eq!(Component::from(3usize), Component::Uint(3));
        assert_eq!(Component::from(1.5f64).as_f64(), Some(1.5));
        assert_eq!(Component::from("x").kind(), "str");
        assert_eq!(Component::from('x').to_string(), "'x'");
    }

    #[test]
    fn test_generic_key_macro() {
        let key = generic_key!("tenant", 42, true);
        assert_eq!(
            key.identities(),
            &[str_identity("tenant"), 42, 1]
        );
        assert_eq!(key.to_string(), r#"["tenant", 42, true]"#);
        assert_eq!(generic_key!().depth(), 0);
    }

    #[test]
    fn test_generic_key_new() {
        let key = GenericCompositeKey::new([1u64, 2, 3]);
        assert_eq!(key.identities(), &[1, 2, 3]);
        assert_eq!(key.components()[0], Component::Uint(1));
    }

    #[test]
    fn test_generic_key_from_json() {
        let key = GenericCompositeKey::from_json(&json!(["a", 1, -2, true, 2.5]));
        assert_eq!(key, generic_key!("a", 1, -2, true, 2.5));
    }

    #[test]
    fn test_generic_key_rejects_nested() {
        let err = GenericCompositeKey::try_from_json(&json!(["a", [1, 2]])).unwrap_err();
        assert_eq!(
            err,
            KeyError::UnsupportedComponent {
                index: 1,
                kind: "array"
            }
        );

        let err = GenericCompositeKey::try_from_json(&json!({"a": 1})).unwrap_err();
        assert_eq!(err, KeyError::NotAnArray("object"));

        let err = GenericCompositeKey::try_from_json(&json!([null])).unwrap_err();
        assert!(matches!(err, KeyError::UnsupportedComponent { kind: "null", .. }));
    }

    #[test]
    #[should_panic(expected = "invalid generic composite key")]
    fn test_generic_key_from_json_panics() {
        GenericCompositeKey::from_json(&json!([{"nested": true}]));
    }

    #[test]
    fn test_mixed_types_differ() {
        assert_ne!(generic_key!(1), generic_key!(1u64));
        assert_eq!(generic_key!(1).identities(), generic_key!(1u64).identities());
    }
}
