//! Thread-Safe Indexed Store
//!
//! [`Store`] puts an [`IndexedMap`] behind a single reader/writer lock:
//!
//! - `insert`, `delete_by_key`, `delete_by_index`, `add_index` and `remove_index`
//!   take the lock exclusively
//! - fetches, counts, `transform` and `for_each` share it
//!
//! The lock is held for the whole operation and released before returning, so
//! fetched values are a snapshot: another thread (or the expiry sweeper) may
//! remove the entry right after. Values are returned by clone; store `Arc<T>`
//! payloads to hand out views of the same data.
//!
//! [`IndexedStore`] is the operation set shared by every thread-safe variant,
//! so callers can be written once against any of them.

use crate::error::StoreResult;
use crate::storage::engine::IndexedMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// The operation set of a thread-safe indexed store.
///
/// Implemented by [`Store`], [`ExpiringStore`](super::ExpiringStore) and
/// [`StrictStore`](super::StrictStore). All methods take `&self`; wrap the store in
/// an `Arc` to share it between threads.
pub trait IndexedStore<K, V, I> {
    /// Inserts a value under a new key, attached to the given indices.
    fn insert(&self, key: K, value: V, indices: impl IntoIterator<Item = I>) -> StoreResult<()>;

    /// Returns the value stored under `key`.
    fn fetch_by_key(&self, key: &K) -> StoreResult<V>;

    /// Returns the values of every key carrying `index`, in association order.
    fn fetch_by_index(&self, index: &I) -> StoreResult<Vec<V>>;

    /// Removes a key with all of its index associations.
    fn delete_by_key(&self, key: &K) -> StoreResult<()>;

    /// Removes every key carrying `index`.
    fn delete_by_index(&self, index: &I) -> StoreResult<()>;

    /// Attaches `index` to an existing key.
    fn add_index(&self, key: &K, index: I) -> StoreResult<()>;

    /// Detaches `index` from a key.
    fn remove_index(&self, key: &K, index: &I) -> StoreResult<()>;

    /// Returns the number of stored keys.
    fn key_num(&self) -> usize;

    /// Returns the number of distinct indices.
    fn index_num(&self) -> usize;

    /// Returns how many keys carry `index`.
    fn key_num_of_index(&self, index: &I) -> usize;

    /// Returns how many indices `key` carries.
    fn index_num_of_key(&self, key: &K) -> usize;

    /// Returns true if `key` is stored.
    fn has_key(&self, key: &K) -> bool;

    /// Returns true if at least one key carries `index`.
    fn has_index(&self, index: &I) -> bool;

    /// Maps every value through `f`; the first error aborts and discards the pass.
    fn transform<U, E, F>(&self, f: F) -> Result<HashMap<K, U>, E>
    where
        F: FnMut(&K, &V) -> Result<U, E>;

    /// Calls `f` on every entry. Cannot be interrupted.
    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V);
}

/// A thread-safe indexed store guarded by one reader/writer lock.
///
/// # Example
///
/// ```
/// use indexkv::{IndexedStore, Store};
/// use std::sync::Arc;
/// use std::thread;
///
/// let store = Arc::new(Store::new());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let store = Arc::clone(&store);
///         thread::spawn(move || {
///             for i in 0..10 {
///                 store.insert(t * 100 + i, i, [t]).unwrap();
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(store.key_num(), 40);
/// assert_eq!(store.key_num_of_index(&2), 10);
/// ```
pub struct Store<K, V, I> {
    inner: Arc<RwLock<IndexedMap<K, V, I>>>,
}

impl<K, V, I> Store<K, V, I>
where
    K: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::from(IndexedMap::new())
    }

    /// Calls `f` on every entry with mutable access to the value.
    ///
    /// Unlike [`for_each`](IndexedStore::for_each) this takes the lock exclusively.
    pub fn for_each_mut<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V),
    {
        self.inner.write().for_each_mut(f);
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// The lock-guarded engine, shared with the expiry sweeper.
    pub(crate) fn shared(&self) -> &Arc<RwLock<IndexedMap<K, V, I>>> {
        &self.inner
    }
}

impl<K, V, I> Default for Store<K, V, I>
where
    K: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, I> From<IndexedMap<K, V, I>> for Store<K, V, I> {
    fn from(map: IndexedMap<K, V, I>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }
}

impl<K, V, I> std::fmt::Debug for Store<K, V, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl<K, V, I> IndexedStore<K, V, I> for Store<K, V, I>
where
    K: Eq + Hash + Clone,
    V: Clone,
    I: Eq + Hash + Clone,
{
    fn insert(&self, key: K, value: V, indices: impl IntoIterator<Item = I>) -> StoreResult<()> {
        self.inner.write().insert(key, value, indices)
    }

    fn fetch_by_key(&self, key: &K) -> StoreResult<V> {
        self.inner.read().fetch_by_key(key).cloned()
    }

    fn fetch_by_index(&self, index: &I) -> StoreResult<Vec<V>> {
        let map = self.inner.read();
        let values = map.fetch_by_index(index)?;

        Ok(values.into_iter().cloned().collect())
    }

    fn delete_by_key(&self, key: &K) -> StoreResult<()> {
        self.inner.write().delete_by_key(key)
    }

    fn delete_by_index(&self, index: &I) -> StoreResult<()> {
        self.inner.write().delete_by_index(index)
    }

    fn add_index(&self, key: &K, index: I) -> StoreResult<()> {
        self.inner.write().add_index(key, index)
    }

    fn remove_index(&self, key: &K, index: &I) -> StoreResult<()> {
        self.inner.write().remove_index(key, index)
    }

    fn key_num(&self) -> usize {
        self.inner.read().key_num()
    }

    fn index_num(&self) -> usize {
        self.inner.read().index_num()
    }

    fn key_num_of_index(&self, index: &I) -> usize {
        self.inner.read().key_num_of_index(index)
    }

    fn index_num_of_key(&self, key: &K) -> usize {
        self.inner.read().index_num_of_key(key)
    }

    fn has_key(&self, key: &K) -> bool {
        self.inner.read().has_key(key)
    }

    fn has_index(&self, index: &I) -> bool {
        self.inner.read().has_index(index)
    }

    fn transform<U, E, F>(&self, f: F) -> Result<HashMap<K, U>, E>
    where
        F: FnMut(&K, &V) -> Result<U, E>,
    {
        self.inner.read().transform(f)
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&K, &V),
    {
        self.inner.read().for_each(f);
    }
}
