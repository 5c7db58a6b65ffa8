//! Background TTL sweeping
//!
//! A [`Managed`] cache owns one tokio task that wakes on a fixed tick and
//! evicts every key, loud or quiet, that has outlived the TTL. All other
//! operations go straight to the wrapped cache through `Deref`.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::traits::Sweepable;

/// A cache plus the sweeper task that expires its entries
///
/// ```no_run
/// use std::time::Duration;
/// use tiercache::{Cache, Managed};
/// use tierkey::IntKey;
///
/// # async fn run() -> tiercache::Result<()> {
/// let cache: Cache<IntKey, String> = Cache::new(Some(Duration::from_secs(30)));
/// let managed = Managed::start(cache, Duration::from_secs(1))?;
///
/// managed.set(&IntKey(1), "one".to_string());
/// managed.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Managed<C: Sweepable> {
    cache: Arc<C>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<C: Sweepable> Managed<C> {
    /// Wrap `cache` and start sweeping it every `every`
    ///
    /// # Arguments
    /// * `cache` - Cache to sweep
    /// * `every` - Tick between sweeps
    ///
    /// # Returns
    /// `Error::InvalidConfig` for a zero tick, `Error::NoRuntime` when called
    /// outside a tokio runtime
    pub fn start(cache: C, every: Duration) -> Result<Self> {
        Self::start_shared(Arc::new(cache), every)
    }

    /// Start sweeping a cache that is already shared
    pub fn start_shared(cache: Arc<C>, every: Duration) -> Result<Self> {
        if every.is_zero() {
            return Err(Error::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;

        let (tx, rx) = oneshot::channel();
        let task = handle.spawn(sweep_loop(Arc::clone(&cache), every, rx));
        info!(interval_ms = every.as_millis() as u64, "cache sweeper started");

        Ok(Self {
            cache,
            shutdown: Some(tx),
            task: Some(task),
        })
    }

    /// Start sweeping with the tick from `config`
    pub fn from_config(cache: C, config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::start(cache, config.sweep_interval)
    }

    /// Stop the sweeper and wait for it to exit
    ///
    /// No sweep runs after this returns.
    pub async fn stop(mut self) {
        self.signal();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "cache sweeper exited abnormally");
            }
        }
        info!("cache sweeper stopped");
    }

    /// Check if the sweeper task is still alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Shared handle to the wrapped cache
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    fn signal(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

impl<C: Sweepable> Deref for Managed<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.cache
    }
}

impl<C: Sweepable> Drop for Managed<C> {
    fn drop(&mut self) {
        self.signal();
    }
}

async fn sweep_loop<C: Sweepable>(
    cache: Arc<C>,
    every: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let evicted = cache.sweep();
                if evicted > 0 {
                    debug!(evicted, "swept expired cache keys");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use tierkey::IntKey;

    #[test]
    fn test_start_without_runtime() {
        let cache: Cache<IntKey, u8> = Cache::new(None);
        let err = Managed::start(cache, Duration::from_millis(10)).err();
        assert!(matches!(err, Some(Error::NoRuntime)));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let cache: Cache<IntKey, u8> = Cache::new(None);
        let err = Managed::start(cache, Duration::ZERO).err();
        assert!(matches!(err, Some(Error::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let cache: Cache<IntKey, u8> = Cache::new(None);
        let managed = Managed::start(cache, Duration::from_millis(5)).unwrap();
        assert!(managed.is_running());

        managed.set(&IntKey(1), 1);
        assert_eq!(managed.get(&IntKey(1)), Some(1));
        managed.stop().await;
    }
}
