//! Error types for tierkey

use thiserror::Error;

/// Result type alias for key construction
pub type Result<T> = std::result::Result<T, KeyError>;

/// Errors raised while building keys from runtime data
///
/// Keys built from statically typed components never fail; these only
/// surface when components arrive as untyped JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// A component is not a comparable primitive
    #[error("unsupported key component at position {index}: {kind}")]
    UnsupportedComponent {
        /// Position of the offending component
        index: usize,
        /// JSON kind that was rejected
        kind: &'static str,
    },

    /// The input was not a list of components
    #[error("expected an array of key components, got {0}")]
    NotAnArray(&'static str),
}
