//! # tiercache
//!
//! In-memory caches over composite keys with change tracking and TTL.
//!
//! ## Architecture
//! - **[`Cache`]**: one value per key, identity buckets with collision chains
//! - **[`TreeCache`]**: many values per key in a trie of identities; a broad
//!   key reads every value stored beneath it
//! - **[`HashCache`]**: many values per key under one flattened hash,
//!   exact-match lookups only
//! - **[`Managed`]**: a tokio task that evicts keys past their TTL
//!
//! Every cache keeps its storage and bookkeeping behind one
//! `parking_lot::RwLock`, so each operation is atomic with respect to the
//! others on the same instance.
//!
//! ## Change tracking
//! Writes queue their key as a pending change. [`MultiCache::changes`] peeks
//! at the queue; [`MultiCache::acknowledge`] and [`MultiCache::take_changes`]
//! remove from it. Quiet writes store without queueing.

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod hashed;
mod managed;
mod stats;
mod tracker;
mod traits;
mod tree;

pub use cache::Cache;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::{Error, Result};
pub use hashed::HashCache;
pub use managed::Managed;
pub use stats::CacheStats;
pub use traits::{MultiCache, Sweepable};
pub use tree::TreeCache;

pub use tierkey;
