//! Configuration shared by every cache kind

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tierkey::FlattenStrategy;

use crate::error::{Error, Result};

/// Cache configuration
///
/// Every field has a default, so a partial document deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of an entry since its last write; `None` never expires
    pub ttl: Option<Duration>,

    /// How the flat hash cache collapses composite keys
    pub flatten: FlattenStrategy,

    /// Tick of a managed sweeper
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            flatten: FlattenStrategy::Fast64,
            sweep_interval: Duration::from_secs(1),
        }
    }
}

impl CacheConfig {
    /// Create a new builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(Error::InvalidConfig(
                "ttl must be greater than zero".to_string(),
            ));
        }

        if self.sweep_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CacheConfig`]
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    ttl: Option<Duration>,
    flatten: Option<FlattenStrategy>,
    sweep_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Expire entries this long after their last write
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the flattening strategy of the hash cache
    pub fn flatten(mut self, strategy: FlattenStrategy) -> Self {
        self.flatten = Some(strategy);
        self
    }

    /// Set the sweeper tick
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            ttl: self.ttl.or(defaults.ttl),
            flatten: self.flatten.unwrap_or(defaults.flatten),
            sweep_interval: self.sweep_interval.unwrap_or(defaults.sweep_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, None);
        assert_eq!(config.flatten, FlattenStrategy::Fast64);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .ttl(Duration::from_secs(30))
            .flatten(FlattenStrategy::Sha256)
            .sweep_interval(Duration::from_millis(250))
            .build();

        assert_eq!(config.ttl, Some(Duration::from_secs(30)));
        assert_eq!(config.flatten, FlattenStrategy::Sha256);
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_config_validation() {
        let config = CacheConfig::builder().ttl(Duration::ZERO).build();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = CacheConfig::builder()
            .sweep_interval(Duration::ZERO)
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_partial_document() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"ttl": {"secs": 5, "nanos": 0}, "flatten": "sha256"}"#)
                .unwrap();
        assert_eq!(config.ttl, Some(Duration::from_secs(5)));
        assert_eq!(config.flatten, FlattenStrategy::Sha256);
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }
}
