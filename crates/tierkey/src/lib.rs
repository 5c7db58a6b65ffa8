//! # tierkey
//!
//! Keys for the tiercache engine.
//!
//! ## Model
//! - **Identity**: every key exposes a 64-bit numeric identity used as a
//!   storage index. Identities may collide; caches compare keys with `Eq`.
//! - **Composite keys**: an ordered identity sequence, broadest first. A key
//!   whose sequence prefixes another's is its ancestor.
//! - **Flattening**: a whole sequence collapsed into one map key, with a fast
//!   64-bit hash or a SHA-256 digest.
//!
//! ## Variants
//! - Integer, unsigned and string keys, single or composite
//! - [`ComparableKey`] and [`GenericCompositeKey`] over comparable primitives
//! - [`ContentKey`] and [`ContentCompositeKey`] identified by content hash
//! - [`AnyKey`] and [`AnyCompositeKey`] to mix variants in one cache

#![warn(missing_docs)]

mod any;
mod comparable;
mod composite;
mod content;
mod error;
pub mod hash;
mod key;
mod value;

pub use any::{AnyCompositeKey, AnyKey};
pub use comparable::{Comparable, ComparableKey, Component, GenericCompositeKey};
pub use composite::{IntCompositeKey, StrCompositeKey, UintCompositeKey};
pub use content::{ContentCompositeKey, ContentKey};
pub use error::{KeyError, Result};
pub use hash::{FlatKey, FlattenStrategy};
pub use key::{CompositeKey, IntKey, Key, StrKey, UintKey};
pub use value::CacheValue;
