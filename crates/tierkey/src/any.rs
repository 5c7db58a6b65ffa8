//! Closed sum types over the key variants
//!
//! A cache that must hold keys of several variants at once uses these. The
//! derived equality compares the variant first, so keys of different variants
//! are never equal even when their identities match.

use std::fmt;

use crate::comparable::{Component, ComparableKey, GenericCompositeKey};
use crate::composite::{IntCompositeKey, StrCompositeKey, UintCompositeKey};
use crate::content::ContentCompositeKey;
use crate::key::{CompositeKey, IntKey, Key, StrKey, UintKey};

/// Any single-identity key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyKey {
    /// Signed integer key
    Int(IntKey),
    /// Unsigned integer key
    Uint(UintKey),
    /// String key
    Str(StrKey),
    /// Runtime comparable primitive
    Component(ComparableKey<Component>),
}

impl AnyKey {
    /// Name of the variant, used as the canonical prefix
    pub fn kind(&self) -> &'static str {
        match self {
            AnyKey::Int(_) => "int",
            AnyKey::Uint(_) => "uint",
            AnyKey::Str(_) => "str",
            AnyKey::Component(_) => "component",
        }
    }
}

impl Key for AnyKey {
    fn identity(&self) -> i64 {
        match self {
            AnyKey::Int(k) => k.identity(),
            AnyKey::Uint(k) => k.identity(),
            AnyKey::Str(k) => k.identity(),
            AnyKey::Component(k) => k.identity(),
        }
    }
}

impl CompositeKey for AnyKey {
    fn identities(&self) -> &[i64] {
        match self {
            AnyKey::Int(k) => k.identities(),
            AnyKey::Uint(k) => k.identities(),
            AnyKey::Str(k) => k.identities(),
            AnyKey::Component(k) => k.identities(),
        }
    }
}

impl fmt::Display for AnyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyKey::Int(k) => write!(f, "int:{}", k),
            AnyKey::Uint(k) => write!(f, "uint:{}", k),
            AnyKey::Str(k) => write!(f, "str:{}", k),
            AnyKey::Component(k) => write!(f, "component:{}", k.value()),
        }
    }
}

impl From<IntKey> for AnyKey {
    fn from(k: IntKey) -> Self {
        AnyKey::Int(k)
    }
}

impl From<UintKey> for AnyKey {
    fn from(k: UintKey) -> Self {
        AnyKey::Uint(k)
    }
}

impl From<StrKey> for AnyKey {
    fn from(k: StrKey) -> Self {
        AnyKey::Str(k)
    }
}

impl From<Component> for AnyKey {
    fn from(c: Component) -> Self {
        AnyKey::Component(ComparableKey::new(c))
    }
}

/// Any composite key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyCompositeKey {
    /// Signed integer components
    Int(IntCompositeKey),
    /// Unsigned integer components
    Uint(UintCompositeKey),
    /// String components
    Str(StrCompositeKey),
    /// Mixed primitive components
    Generic(GenericCompositeKey),
    /// Content-hashed components
    Content(ContentCompositeKey<Component>),
}

impl AnyCompositeKey {
    /// Name of the variant, used as the canonical prefix
    pub fn kind(&self) -> &'static str {
        match self {
            AnyCompositeKey::Int(_) => "int",
            AnyCompositeKey::Uint(_) => "uint",
            AnyCompositeKey::Str(_) => "str",
            AnyCompositeKey::Generic(_) => "generic",
            AnyCompositeKey::Content(_) => "content",
        }
    }
}

impl Key for AnyCompositeKey {
    fn identity(&self) -> i64 {
        match self {
            AnyCompositeKey::Int(k) => k.identity(),
            AnyCompositeKey::Uint(k) => k.identity(),
            AnyCompositeKey::Str(k) => k.identity(),
            AnyCompositeKey::Generic(k) => k.identity(),
            AnyCompositeKey::Content(k) => k.identity(),
        }
    }
}

impl CompositeKey for AnyCompositeKey {
    fn identities(&self) -> &[i64] {
        match self {
            AnyCompositeKey::Int(k) => k.identities(),
            AnyCompositeKey::Uint(k) => k.identities(),
            AnyCompositeKey::Str(k) => k.identities(),
            AnyCompositeKey::Generic(k) => k.identities(),
            AnyCompositeKey::Content(k) => k.identities(),
        }
    }
}

impl fmt::Display for AnyCompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyCompositeKey::Int(k) => write!(f, "int:{}", k),
            AnyCompositeKey::Uint(k) => write!(f, "uint:{}", k),
            AnyCompositeKey::Str(k) => write!(f, "str:{}", k),
            AnyCompositeKey::Generic(k) => write!(f, "generic:{}", k),
            AnyCompositeKey::Content(k) => write!(f, "content:{}", k),
        }
    }
}

impl From<IntCompositeKey> for AnyCompositeKey {
    fn from(k: IntCompositeKey) -> Self {
        AnyCompositeKey::Int(k)
    }
}

impl From<UintCompositeKey> for AnyCompositeKey {
    fn from(k: UintCompositeKey) -> Self {
        AnyCompositeKey::Uint(k)
    }
}

impl From<StrCompositeKey> for AnyCompositeKey {
    fn from(k: StrCompositeKey) -> Self {
        AnyCompositeKey::Str(k)
    }
}

impl From<GenericCompositeKey> for AnyCompositeKey {
    fn from(k: GenericCompositeKey) -> Self {
        AnyCompositeKey::Generic(k)
    }
}

impl From<ContentCompositeKey<Component>> for AnyCompositeKey {
    fn from(k: ContentCompositeKey<Component>) -> Self {
        AnyCompositeKey::Content(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_variant_never_equal() {
        let int = AnyKey::from(IntKey(1));
        let uint = AnyKey::from(UintKey::new(1));
        assert_eq!(int.identity(), uint.identity());
        assert_ne!(int, uint);
        assert_ne!(int.to_string(), uint.to_string());
    }

    #[test]
    fn test_composite_variants() {
        let int: AnyCompositeKey = IntCompositeKey::new([1, 2]).into();
        let generic: AnyCompositeKey = GenericCompositeKey::new([1i64, 2]).into();
        assert_eq!(int.identities(), generic.identities());
        assert_ne!(int, generic);
        assert_eq!(int.kind(), "int");
        assert_eq!(generic.to_string(), "generic:[1, 2]");
    }

    #[test]
    fn test_component_key() {
        let key = AnyKey::from(Component::from("tenant"));
        assert_eq!(key.kind(), "component");
        assert_eq!(key.to_string(), "component:\"tenant\"");
        assert_eq!(key, AnyKey::from(Component::Str("tenant".into())));
    }
}
