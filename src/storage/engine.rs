//! Indexed Map Engine
//!
//! This module implements the core algorithms of the store: a unique-key map
//! whose entries can additionally be tagged with any number of secondary indices.
//! An index is an N:M relation: a key can carry many indices and many keys can
//! share one index.
//!
//! ## Layout
//!
//! ```text
//! ┌───────────────────────┐   ┌─────────────────────────┐   ┌─────────────────────────┐
//! │ values                │   │ keys                    │   │ indices                 │
//! │ key ──> value         │   │ key ──> [index, ...]    │   │ index ──> [key, ...]    │
//! └───────────────────────┘   └─────────────────────────┘   └─────────────────────────┘
//! ```
//!
//! The three maps are one logical structure. After every completed operation:
//!
//! 1. `values` and `keys` have identical key sets.
//! 2. Every index listed under a key lists that key exactly once.
//! 3. Every key listed under an index lists that index exactly once.
//! 4. No index entry exists with an empty key list.
//!
//! Lists keep insertion order, so [`IndexedMap::fetch_by_index`] returns values in
//! the order their keys were associated with the index.
//!
//! ## Concurrency
//!
//! `IndexedMap` holds no lock. Mutations take `&mut self`, so sharing it across
//! threads requires external synchronization; [`Store`](super::Store) provides it.

use crate::error::{StoreError, StoreResult};
use std::collections::HashMap;
use std::hash::Hash;

/// A map with unique keys and N:M secondary indices.
///
/// This is also the unsynchronized variant of the store, for single-threaded
/// callers that want to skip locking entirely.
///
/// # Example
///
/// ```
/// use indexkv::IndexedMap;
///
/// let mut map = IndexedMap::new();
/// map.insert("alice", 30, ["admins", "staff"]).unwrap();
/// map.insert("bob", 25, ["staff"]).unwrap();
///
/// assert_eq!(map.fetch_by_key(&"alice"), Ok(&30));
/// assert_eq!(map.fetch_by_index(&"staff").unwrap(), vec![&30, &25]);
///
/// map.delete_by_index(&"admins").unwrap();
/// assert!(!map.has_key(&"alice"));
/// assert_eq!(map.key_num_of_index(&"staff"), 1);
/// ```
#[derive(Debug, Clone)]
pub struct IndexedMap<K, V, I> {
    /// key -> value
    values: HashMap<K, V>,
    /// key -> indices attached to it
    keys: HashMap<K, Vec<I>>,
    /// index -> keys carrying it
    indices: HashMap<I, Vec<K>>,
}

impl<K, V, I> Default for IndexedMap<K, V, I> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            keys: HashMap::new(),
            indices: HashMap::new(),
        }
    }
}

impl<K, V, I> IndexedMap<K, V, I>
where
    K: Eq + Hash + Clone,
    I: Eq + Hash + Clone,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty map with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
            keys: HashMap::with_capacity(capacity),
            indices: HashMap::new(),
        }
    }

    /// Inserts a value under a new key, attached to the given indices.
    ///
    /// An index repeated in `indices` is attached once; the key's index list
    /// keeps the position of its last occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if the key is already present. The map
    /// is left untouched in that case.
    pub fn insert<It>(&mut self, key: K, value: V, indices: It) -> StoreResult<()>
    where
        It: IntoIterator<Item = I>,
    {
        if self.keys.contains_key(&key) {
            return Err(StoreError::DuplicateKey);
        }

        let mut attached: Vec<I> = Vec::new();
        for index in indices {
            if let Some(pos) = attached.iter().position(|i| *i == index) {
                attached.remove(pos);
            }
            attached.push(index);
        }

        for index in &attached {
            self.indices
                .entry(index.clone())
                .or_default()
                .push(key.clone());
        }
        self.keys.insert(key.clone(), attached);
        self.values.insert(key, value);

        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn fetch_by_key(&self, key: &K) -> StoreResult<&V> {
        self.values.get(key).ok_or(StoreError::KeyNotFound)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn fetch_by_key_mut(&mut self, key: &K) -> StoreResult<&mut V> {
        self.values.get_mut(key).ok_or(StoreError::KeyNotFound)
    }

    /// Returns the values of every key carrying `index`, in association order.
    pub fn fetch_by_index(&self, index: &I) -> StoreResult<Vec<&V>> {
        let keys = self.indices.get(index).ok_or(StoreError::IndexNotFound)?;

        Ok(keys.iter().filter_map(|key| self.values.get(key)).collect())
    }

    /// Removes a key, its value and all of its index associations.
    pub fn delete_by_key(&mut self, key: &K) -> StoreResult<()> {
        self.remove(key).map(drop)
    }

    /// Like [`delete_by_key`](Self::delete_by_key), but hands back the removed value.
    pub fn remove(&mut self, key: &K) -> StoreResult<V> {
        let attached = self.keys.remove(key).ok_or(StoreError::KeyNotFound)?;

        for index in &attached {
            self.detach(index, key);
        }

        self.values.remove(key).ok_or(StoreError::KeyNotFound)
    }

    /// Removes every key carrying `index`.
    ///
    /// Each key is removed completely, including its other indices.
    pub fn delete_by_index(&mut self, index: &I) -> StoreResult<()> {
        // The cascade shrinks this list, so walk a snapshot of it.
        let keys = self
            .indices
            .get(index)
            .ok_or(StoreError::IndexNotFound)?
            .clone();

        for key in &keys {
            self.remove(key)?;
        }

        Ok(())
    }

    /// Attaches `index` to an existing key.
    ///
    /// # Errors
    ///
    /// - [`StoreError::KeyNotFound`] if the key is absent
    /// - [`StoreError::DuplicateIndex`] if the key already carries the index
    pub fn add_index(&mut self, key: &K, index: I) -> StoreResult<()> {
        let attached = self.keys.get_mut(key).ok_or(StoreError::KeyNotFound)?;

        if attached.contains(&index) {
            return Err(StoreError::DuplicateIndex);
        }
        attached.push(index.clone());

        self.indices.entry(index).or_default().push(key.clone());

        Ok(())
    }

    /// Detaches `index` from a key, dropping the index entirely if no other key
    /// carries it.
    ///
    /// The key is checked first: a missing key reports
    /// [`StoreError::KeyNotFound`] even if the index is missing too. An index
    /// that exists but is not attached to this key reports
    /// [`StoreError::IndexNotFound`].
    pub fn remove_index(&mut self, key: &K, index: &I) -> StoreResult<()> {
        let attached = self.keys.get_mut(key).ok_or(StoreError::KeyNotFound)?;
        let pos = attached
            .iter()
            .position(|i| i == index)
            .ok_or(StoreError::IndexNotFound)?;
        attached.remove(pos);

        self.detach(index, key);

        Ok(())
    }

    /// Removes `key` from the key list of `index`, deleting emptied entries.
    fn detach(&mut self, index: &I, key: &K) {
        if let Some(keys) = self.indices.get_mut(index) {
            if let Some(pos) = keys.iter().position(|k| k == key) {
                keys.remove(pos);
            }
            if keys.is_empty() {
                self.indices.remove(index);
            }
        }
    }

    /// Returns the number of stored keys.
    pub fn key_num(&self) -> usize {
        self.values.len()
    }

    /// Returns the number of distinct indices.
    pub fn index_num(&self) -> usize {
        self.indices.len()
    }

    /// Returns how many keys carry `index` (0 if absent).
    pub fn key_num_of_index(&self, index: &I) -> usize {
        self.indices.get(index).map_or(0, Vec::len)
    }

    /// Returns how many indices `key` carries (0 if absent).
    pub fn index_num_of_key(&self, key: &K) -> usize {
        self.keys.get(key).map_or(0, Vec::len)
    }

    /// Returns true if `key` is stored.
    pub fn has_key(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Returns true if at least one key carries `index`.
    pub fn has_index(&self, index: &I) -> bool {
        self.indices.contains_key(index)
    }

    /// Returns true if the map holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the indices attached to `key`, in attachment order.
    pub fn indices_of(&self, key: &K) -> Option<&[I]> {
        self.keys.get(key).map(Vec::as_slice)
    }

    /// Returns the keys carrying `index`, in association order.
    pub fn keys_of(&self, index: &I) -> Option<&[K]> {
        self.indices.get(index).map(Vec::as_slice)
    }

    /// Maps every stored value through `f` into a fresh map.
    ///
    /// The first error returned by `f` aborts the pass; no partial result is
    /// returned. Iteration order is unspecified.
    pub fn transform<U, E, F>(&self, mut f: F) -> Result<HashMap<K, U>, E>
    where
        F: FnMut(&K, &V) -> Result<U, E>,
    {
        let mut out = HashMap::with_capacity(self.values.len());
        for (key, value) in &self.values {
            out.insert(key.clone(), f(key, value)?);
        }
        Ok(out)
    }

    /// Calls `f` on every stored entry. Iteration order is unspecified.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in &self.values {
            f(key, value);
        }
    }

    /// Calls `f` on every stored entry with mutable access to the value.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V),
    {
        for (key, value) in self.values.iter_mut() {
            f(key, value);
        }
    }

    /// Deletes every entry for which `pred` returns true, through the same path
    /// as [`delete_by_key`](Self::delete_by_key).
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub fn remove_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let doomed: Vec<K> = self
            .values
            .iter()
            .filter(|&(key, value)| pred(key, value))
            .map(|(key, _)| key.clone())
            .collect();

        let mut removed = 0;
        for key in &doomed {
            if self.delete_by_key(key).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Verifies the four structural invariants, describing the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.values.len() != self.keys.len()
            || self.values.keys().any(|key| !self.keys.contains_key(key))
        {
            return Err("values and key->indices have different key sets".to_string());
        }

        for (key, attached) in &self.keys {
            for index in attached {
                let seen = self
                    .indices
                    .get(index)
                    .map_or(0, |keys| keys.iter().filter(|k| *k == key).count());
                if seen != 1 {
                    return Err(format!("key listed {} times under its index", seen));
                }
            }
        }

        for (index, keys) in &self.indices {
            if keys.is_empty() {
                return Err("index entry with no keys".to_string());
            }
            for key in keys {
                let seen = self
                    .keys
                    .get(key)
                    .map_or(0, |attached| attached.iter().filter(|i| *i == index).count());
                if seen != 1 {
                    return Err(format!("index listed {} times under its key", seen));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> IndexedMap<&'static str, i32, &'static str> {
        let mut map = IndexedMap::new();
        map.insert("k1", 1, ["red", "big"]).unwrap();
        map.insert("k2", 2, ["red"]).unwrap();
        map.insert("k3", 3, []).unwrap();
        map
    }

    #[test]
    fn test_insert_and_fetch() {
        let map = sample();

        assert_eq!(map.fetch_by_key(&"k1"), Ok(&1));
        assert_eq!(map.fetch_by_index(&"red").unwrap(), vec![&1, &2]);
        assert_eq!(map.fetch_by_index(&"big").unwrap(), vec![&1]);
        assert_eq!(map.key_num(), 3);
        assert_eq!(map.index_num(), 2);
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_fetch_missing() {
        let map = sample();

        assert_eq!(map.fetch_by_key(&"nope"), Err(StoreError::KeyNotFound));
        assert_eq!(map.fetch_by_index(&"nope"), Err(StoreError::IndexNotFound));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut map = sample();

        assert_eq!(map.insert("k1", 99, ["new"]), Err(StoreError::DuplicateKey));
        assert_eq!(map.key_num(), 3);
        assert_eq!(map.fetch_by_key(&"k1"), Ok(&1));
        assert!(!map.has_index(&"new"));
    }

    #[test]
    fn test_repeated_indices_in_one_insert() {
        let mut map = IndexedMap::new();
        map.insert("k", 0, ["a", "b", "a"]).unwrap();

        assert_eq!(map.indices_of(&"k"), Some(&["b", "a"][..]));
        assert_eq!(map.key_num_of_index(&"a"), 1);
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_delete_by_key() {
        let mut map = sample();

        map.delete_by_key(&"k1").unwrap();
        assert!(!map.has_key(&"k1"));
        assert!(!map.has_index(&"big"));
        assert_eq!(map.keys_of(&"red"), Some(&["k2"][..]));
        assert_eq!(map.delete_by_key(&"k1"), Err(StoreError::KeyNotFound));
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_remove_returns_value() {
        let mut map = sample();

        assert_eq!(map.remove(&"k2"), Ok(2));
        assert_eq!(map.remove(&"k2"), Err(StoreError::KeyNotFound));
    }

    #[test]
    fn test_delete_by_index_cascades() {
        let mut map = sample();

        map.delete_by_index(&"red").unwrap();
        assert!(!map.has_key(&"k1"));
        assert!(!map.has_key(&"k2"));
        assert!(map.has_key(&"k3"));
        // k1's other index goes with it
        assert!(!map.has_index(&"big"));
        assert_eq!(map.index_num(), 0);
        assert_eq!(map.delete_by_index(&"red"), Err(StoreError::IndexNotFound));
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_add_index() {
        let mut map = sample();

        map.add_index(&"k3", "red").unwrap();
        assert_eq!(map.fetch_by_index(&"red").unwrap(), vec![&1, &2, &3]);
        assert_eq!(map.add_index(&"k3", "red"), Err(StoreError::DuplicateIndex));
        assert_eq!(map.add_index(&"nope", "red"), Err(StoreError::KeyNotFound));

        map.add_index(&"k3", "fresh").unwrap();
        assert!(map.has_index(&"fresh"));
        assert_eq!(map.index_num_of_key(&"k3"), 2);
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_remove_index_drops_orphans() {
        let mut map = sample();
        let before = map.index_num();

        map.remove_index(&"k1", &"big").unwrap();
        assert!(!map.has_index(&"big"));
        assert_eq!(map.index_num(), before - 1);
        assert!(map.has_key(&"k1"));

        map.remove_index(&"k1", &"red").unwrap();
        assert_eq!(map.keys_of(&"red"), Some(&["k2"][..]));
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[test]
    fn test_remove_index_errors() {
        let mut map = sample();

        // Key is checked before index
        assert_eq!(
            map.remove_index(&"nope", &"nope"),
            Err(StoreError::KeyNotFound)
        );
        assert_eq!(
            map.remove_index(&"k1", &"nope"),
            Err(StoreError::IndexNotFound)
        );
        // Index exists, but not on this key
        assert_eq!(
            map.remove_index(&"k3", &"red"),
            Err(StoreError::IndexNotFound)
        );
        assert_eq!(map.key_num_of_index(&"red"), 2);
    }

    #[test]
    fn test_absent_counts_are_zero() {
        let map = sample();

        assert_eq!(map.key_num_of_index(&"nope"), 0);
        assert_eq!(map.index_num_of_key(&"nope"), 0);
        assert!(!map.has_key(&"nope"));
        assert!(!map.has_index(&"nope"));
    }

    #[test]
    fn test_transform() {
        let map = sample();

        let doubled: HashMap<_, _> = map.transform(|_, v| Ok::<_, ()>(v * 2)).unwrap();
        assert_eq!(doubled.len(), 3);
        assert_eq!(doubled[&"k3"], 6);
    }

    #[test]
    fn test_transform_is_all_or_nothing() {
        let map = sample();

        let result = map.transform(|k, v| if *k == "k2" { Err("boom") } else { Ok(*v) });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_for_each() {
        let mut map = sample();

        let mut sum = 0;
        map.for_each(|_, v| sum += v);
        assert_eq!(sum, 6);

        map.for_each_mut(|_, v| *v += 10);
        assert_eq!(map.fetch_by_key(&"k2"), Ok(&12));

        *map.fetch_by_key_mut(&"k3").unwrap() = 0;
        assert_eq!(map.fetch_by_key(&"k3"), Ok(&0));
    }

    #[test]
    fn test_remove_where() {
        let mut map = sample();

        assert_eq!(map.remove_where(|_, v| *v >= 2), 2);
        assert_eq!(map.key_num(), 1);
        assert_eq!(map.keys_of(&"red"), Some(&["k1"][..]));
        assert_eq!(map.check_invariants(), Ok(()));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8, u16, Vec<u8>),
        DeleteByKey(u8),
        DeleteByIndex(u8),
        AddIndex(u8, u8),
        RemoveIndex(u8, u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16, any::<u16>(), prop::collection::vec(0u8..8, 0..4))
                .prop_map(|(k, v, ix)| Op::Insert(k, v, ix)),
            (0u8..16).prop_map(Op::DeleteByKey),
            (0u8..8).prop_map(Op::DeleteByIndex),
            (0u8..16, 0u8..8).prop_map(|(k, i)| Op::AddIndex(k, i)),
            (0u8..16, 0u8..8).prop_map(|(k, i)| Op::RemoveIndex(k, i)),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let mut map: IndexedMap<u8, u16, u8> = IndexedMap::new();

            for op in ops {
                let _ = match op {
                    Op::Insert(k, v, ix) => map.insert(k, v, ix),
                    Op::DeleteByKey(k) => map.delete_by_key(&k),
                    Op::DeleteByIndex(i) => map.delete_by_index(&i),
                    Op::AddIndex(k, i) => map.add_index(&k, i),
                    Op::RemoveIndex(k, i) => map.remove_index(&k, &i),
                };
                prop_assert_eq!(map.check_invariants(), Ok(()));
            }
        }

        #[test]
        fn prop_fetch_by_index_matches_counts(ops in prop::collection::vec(op_strategy(), 1..64)) {
            let mut map: IndexedMap<u8, u16, u8> = IndexedMap::new();

            for op in ops {
                if let Op::Insert(k, v, ix) = op {
                    let _ = map.insert(k, v, ix);
                }
            }
            for index in 0u8..8 {
                let fetched = map.fetch_by_index(&index).map_or(0, |values| values.len());
                prop_assert_eq!(fetched, map.key_num_of_index(&index));
            }
        }
    }
}
