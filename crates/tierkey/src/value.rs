//! Value contract for cached data

/// Anything a cache can store
///
/// Multi-value caches upsert by value equality, so `PartialEq` decides
/// whether a write replaces an existing value or appends a new one.
pub trait CacheValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + PartialEq + Send + Sync + 'static {}
