//! Background Expiry Sweeper
//!
//! Values in an expiring store decide for themselves when they are stale, through
//! the [`Expirable`] capability. A background task wakes up on a fixed interval,
//! takes the store's write lock, asks every value whether it has expired and
//! deletes those that have. Deletion goes through the regular delete-by-key path,
//! so their index associations are cleaned up like any explicit removal.
//!
//! ## Design
//!
//! The sweeper runs as a Tokio task and:
//! 1. Sleeps for the configured interval
//! 2. Wakes up and scans every stored value under the write lock
//! 3. Removes any expired entries found
//! 4. Logs statistics about the cleanup
//!
//! The task is owned by an [`ExpirySweeper`] handle and stops when the handle is
//! stopped or dropped.

use crate::error::{StoreError, StoreResult};
use crate::storage::engine::IndexedMap;
use crate::storage::store::{IndexedStore, Store};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

/// Shortest interval the sweeper will sleep between sweeps.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// The capability every value in an expiring store must have.
pub trait Expirable {
    /// Returns true once the value should be removed from the store.
    fn is_expired(&self) -> bool;
}

impl<T: Expirable + ?Sized> Expirable for Arc<T> {
    fn is_expired(&self) -> bool {
        (**self).is_expired()
    }
}

impl<T: Expirable + ?Sized> Expirable for Box<T> {
    fn is_expired(&self) -> bool {
        (**self).is_expired()
    }
}

/// Asks a value whether it has expired, if it can answer at all.
///
/// Every [`Expirable`] type answers `Some`. Dynamic [`Value`](crate::value::Value)s
/// answer `Some` only for objects registered with the capability.
pub trait ExpiryProbe {
    /// Returns `None` if the value lacks the expiry capability.
    fn probe_expired(&self) -> Option<bool>;
}

impl<T: Expirable> ExpiryProbe for T {
    fn probe_expired(&self) -> Option<bool> {
        Some(self.is_expired())
    }
}

/// Configuration for the expiry sweeper.
///
/// # Example
///
/// ```
/// use indexkv::ExpiryConfig;
/// use std::time::Duration;
///
/// let config = ExpiryConfig::new().with_interval(Duration::from_millis(250));
/// assert!(config.is_enabled());
///
/// // Non-positive intervals disable the sweeper
/// assert!(!ExpiryConfig::from_millis(0).is_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryConfig {
    /// Interval between sweeps (default: 100ms). Zero disables sweeping.
    pub interval: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl ExpiryConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a millisecond interval.
    ///
    /// Zero or negative intervals produce a disabled configuration.
    pub fn from_millis(interval_ms: i64) -> Self {
        let interval = u64::try_from(interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);

        Self { interval }
    }

    /// Sets the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns true if a sweeper should run with this configuration.
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }
}

/// A handle to a running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    /// Total entries removed by this sweeper
    expired: Arc<AtomicU64>,
}

impl ExpirySweeper {
    /// Starts sweeping `store` as a background task on the current Tokio runtime.
    ///
    /// Values that lack the expiry capability are never removed. A disabled
    /// configuration sweeps at the minimum interval of 1ms.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RuntimeUnavailable`] when called outside a Tokio
    /// runtime.
    pub fn start<K, V, I>(store: &Store<K, V, I>, config: ExpiryConfig) -> StoreResult<Self>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: ExpiryProbe + Send + Sync + 'static,
        I: Eq + Hash + Clone + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| StoreError::RuntimeUnavailable)?;
        let interval = config.interval.max(MIN_INTERVAL);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let expired = Arc::new(AtomicU64::new(0));

        let handle = runtime.spawn(sweeper_loop(
            Arc::clone(store.shared()),
            interval,
            Arc::clone(&expired),
            shutdown_rx,
        ));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Ok(Self {
            shutdown_tx,
            handle,
            expired,
        })
    }

    /// Stops the expiry sweeper. Calling it again has no effect.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!("Background expiry sweeper stopped");
        }
    }

    /// Returns false once a stop was requested or the task has exited.
    pub fn is_running(&self) -> bool {
        !*self.shutdown_tx.borrow() && !self.handle.is_finished()
    }

    /// Returns the number of entries this sweeper has removed.
    pub fn expired_count(&self) -> u64 {
        self.expired.load(Ordering::Relaxed)
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<K, V, I>(
    shared: Arc<RwLock<IndexedMap<K, V, I>>>,
    interval: Duration,
    expired: Arc<AtomicU64>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    K: Eq + Hash + Clone,
    V: ExpiryProbe,
    I: Eq + Hash + Clone,
{
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let (removed, remaining) = sweep(&shared);

        if removed > 0 {
            expired.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(
                expired = removed,
                keys_remaining = remaining,
                "Expired entries cleaned up"
            );
        } else {
            trace!(keys = remaining, "No expired entries");
        }
    }
}

/// One pass over the store under the write lock.
///
/// # Returns
///
/// The number of removed entries and the number of keys left.
fn sweep<K, V, I>(shared: &RwLock<IndexedMap<K, V, I>>) -> (usize, usize)
where
    K: Eq + Hash + Clone,
    V: ExpiryProbe,
    I: Eq + Hash + Clone,
{
    let mut map = shared.write();
    let removed = map.remove_where(|_, value| value.probe_expired().unwrap_or(false));

    (removed, map.key_num())
}

/// Starts an expiry sweeper on `store` with the default configuration.
///
/// This is a convenience function for simple use cases.
pub fn start_expiry_sweeper<K, V, I>(store: &Store<K, V, I>) -> StoreResult<ExpirySweeper>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: ExpiryProbe + Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    ExpirySweeper::start(store, ExpiryConfig::default())
}

/// A thread-safe store whose values remove themselves once expired.
///
/// While the sweeper runs, inserting a value that cannot report expiry fails
/// with [`StoreError::CapabilityMissing`]. With a non-positive interval no
/// sweeper runs, no capability is required and the store behaves exactly like
/// [`Store`].
///
/// # Example
///
/// ```
/// use indexkv::{Expirable, ExpiringStore, IndexedStore};
/// use std::time::{Duration, Instant};
///
/// #[derive(Clone)]
/// struct Session {
///     deadline: Instant,
/// }
///
/// impl Expirable for Session {
///     fn is_expired(&self) -> bool {
///         Instant::now() >= self.deadline
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let store = ExpiringStore::new(10).unwrap();
///     let session = Session { deadline: Instant::now() + Duration::from_millis(20) };
///     store.insert("s1", session, ["user:1"]).unwrap();
///
///     tokio::time::sleep(Duration::from_millis(100)).await;
///     assert!(!store.has_key(&"s1"));
///     assert!(!store.has_index(&"user:1"));
/// }
/// ```
#[derive(Debug)]
pub struct ExpiringStore<K, V, I> {
    store: Store<K, V, I>,
    sweeper: Option<ExpirySweeper>,
}

impl<K, V, I> ExpiringStore<K, V, I>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: ExpiryProbe + Send + Sync + 'static,
    I: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates a store swept every `interval_ms` milliseconds.
    pub fn new(interval_ms: i64) -> StoreResult<Self> {
        Self::with_config(ExpiryConfig::from_millis(interval_ms))
    }

    /// Creates a store with a custom sweeper configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RuntimeUnavailable`] if sweeping is enabled and no
    /// Tokio runtime is running.
    pub fn with_config(config: ExpiryConfig) -> StoreResult<Self> {
        let store = Store::new();

        let sweeper = if config.is_enabled() {
            Some(ExpirySweeper::start(&store, config)?)
        } else {
            debug!("Expiry interval not positive, sweeper not started");
            None
        };

        Ok(Self { store, sweeper })
    }
}

impl<K, V, I> ExpiringStore<K, V, I> {
    /// Stops the background sweeper. The store stays usable, but expired
    /// values are no longer removed.
    pub fn close(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(ExpirySweeper::is_running)
    }

    /// Returns the number of entries removed by the sweeper so far.
    pub fn expired_count(&self) -> u64 {
        self.sweeper.as_ref().map_or(0, ExpirySweeper::expired_count)
    }
}

impl<K, V, I> IndexedStore<K, V, I> for ExpiringStore<K, V, I>
where
    K: Eq + Hash + Clone,
    V: ExpiryProbe + Clone,
    I: Eq + Hash + Clone,
{
    fn insert(&self, key: K, value: V, indices: impl IntoIterator<Item = I>) -> StoreResult<()> {
        // Without a sweeper the store behaves like a plain one
        if self.sweeper.is_some() && value.probe_expired().is_none() {
            return Err(StoreError::CapabilityMissing);
        }
        self.store.insert(key, value, indices)
    }

    fn fetch_by_key(&self, key: &K) -> StoreResult<V> {
        self.store.fetch_by_key(key)
    }

    fn fetch_by_index(&self, index: &I) -> StoreResult<Vec<V>> {
        self.store.fetch_by_index(index)
    }

    fn delete_by_key(&self, key: &K) -> StoreResult<()> {
        self.store.delete_by_key(key)
    }

    fn delete_by_index(&self, index: &I) -> StoreResult<()> {
        self.store.delete_by_index(index)
    }

    fn add_index(&self, key: &K, index: I) -> StoreResult<()> {
        self.store.add_index(key, index)
    }

    fn remove_index(&self, key: &K, index: &I) -> StoreResult<()> {
        self.store.remove_index(key, index)
    }

    fn key_num(&self) -> usize {
        self.store.key_num()
    }

    fn index_num(&self) -> usize {
        self.store.index_num()
    }

    fn key_num_of_index(&self, index: &I) -> usize {
        self.store.key_num_of_index(index)
    }

    fn index_num_of_key(&self, key: &K) -> usize {
        self.store.index_num_of_key(key)
    }

    fn has_key(&self, key: &K) -> bool {
        self.store.has_key(key)
    }

    fn has_index(&self, index: &I) -> bool {
        self.store.has_index(index)
    }

    fn transform<U, E, F>(&self, f: F) -> Result<HashMap<K, U>, E>
    where
        F: FnMut(&K, &V) -> Result<U, E>,
    {
        self.store.transform(f)
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        self.store.for_each(f);
    }
}
