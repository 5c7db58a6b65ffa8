//! Error types for tiercache
//!
//! Cache operations themselves never fail: misses are empty results. Errors
//! only come from configuration and from starting a sweeper.

use thiserror::Error;

/// Result type alias for tiercache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache setup
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sweeper was started outside a tokio runtime
    #[error("cache sweeper requires a running tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfig("ttl must be greater than zero".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: ttl must be greater than zero"
        );
        assert!(Error::NoRuntime.to_string().contains("tokio runtime"));
    }
}
