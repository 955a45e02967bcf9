//! Type-Checked Store
//!
//! [`StrictStore`] stores dynamic [`Value`]s but pins the kind of keys, indices and
//! values at construction time, from one sample of each. Every later argument is
//! checked against those kinds before the call reaches the wrapped store.
//!
//! Presence checks and counts answer "not found" for an argument of the wrong
//! kind, since such a key or index can never be stored. Fetches, deletes and
//! index edits report the mismatch as [`StoreError::WrongType`].

use crate::error::{StoreError, StoreResult};
use crate::storage::store::{IndexedStore, Store};
use crate::value::{Kind, Role, Value};
use std::collections::HashMap;
use tracing::debug;

/// The kinds a [`StrictStore`] accepts, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub key: Kind,
    pub value: Kind,
    pub index: Kind,
    /// Type name values must carry when `value` is [`Kind::Struct`]
    pub value_struct: Option<&'static str>,
}

impl Signature {
    /// Records the kinds of the samples. Only their kinds matter, not their contents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedType`] if the key or index sample is not a
    /// scalar kind.
    pub fn from_samples(key: &Value, value: &Value, index: &Value) -> StoreResult<Self> {
        let key_kind = scalar(Role::Key, key)?;
        let index_kind = scalar(Role::Index, index)?;

        Ok(Self {
            key: key_kind,
            value: value.kind(),
            index: index_kind,
            value_struct: value.struct_name(),
        })
    }

    pub fn check_key(&self, key: &Value) -> StoreResult<()> {
        expect(Role::Key, self.key, key)
    }

    pub fn check_index(&self, index: &Value) -> StoreResult<()> {
        expect(Role::Index, self.index, index)
    }

    /// Checks the value kind and, for structured values, the type name.
    pub fn check_value(&self, value: &Value) -> StoreResult<()> {
        expect(Role::Value, self.value, value)?;

        if let Some(expected) = self.value_struct {
            let found = value.struct_name().unwrap_or_default();
            if found != expected {
                return Err(StoreError::WrongStructType {
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn scalar(role: Role, sample: &Value) -> StoreResult<Kind> {
    let kind = sample.kind();
    if kind.is_scalar() {
        Ok(kind)
    } else {
        Err(StoreError::UnsupportedType { role, kind })
    }
}

fn expect(role: Role, expected: Kind, arg: &Value) -> StoreResult<()> {
    let found = arg.kind();
    if found == expected {
        Ok(())
    } else {
        Err(StoreError::WrongType {
            role,
            expected,
            found,
        })
    }
}

/// A store of dynamic values whose key, value and index kinds are fixed.
///
/// By default it wraps a plain [`Store`]; [`StrictStore::wrap`] puts the same
/// checks in front of any other [`IndexedStore`] over [`Value`]s, such as an
/// [`ExpiringStore`](super::ExpiringStore).
///
/// # Example
///
/// ```
/// use indexkv::{IndexedStore, StoreError, StrictStore, Value};
///
/// let store = StrictStore::new("sample", 0.0, 0).unwrap();
/// store
///     .insert(Value::from("pi"), Value::from(2.5), [Value::from(1)])
///     .unwrap();
///
/// let err = store
///     .insert(Value::from(42), Value::from(1.0), [Value::from(1)])
///     .unwrap_err();
/// assert!(matches!(err, StoreError::WrongType { .. }));
///
/// // Presence checks never fail, they just answer no
/// assert!(!store.has_key(&Value::from(42)));
/// ```
#[derive(Debug)]
pub struct StrictStore<S = Store<Value, Value, Value>> {
    inner: S,
    signature: Signature,
}

impl StrictStore {
    /// Creates a type-checked store over a plain [`Store`].
    pub fn new(
        key_sample: impl Into<Value>,
        value_sample: impl Into<Value>,
        index_sample: impl Into<Value>,
    ) -> StoreResult<Self> {
        Self::wrap(Store::new(), key_sample, value_sample, index_sample)
    }
}

impl<S> StrictStore<S>
where
    S: IndexedStore<Value, Value, Value>,
{
    /// Puts type checks in front of `inner`, which should be empty.
    pub fn wrap(
        inner: S,
        key_sample: impl Into<Value>,
        value_sample: impl Into<Value>,
        index_sample: impl Into<Value>,
    ) -> StoreResult<Self> {
        let signature = Signature::from_samples(
            &key_sample.into(),
            &value_sample.into(),
            &index_sample.into(),
        )?;

        debug!(
            key = %signature.key,
            value = %signature.value,
            index = %signature.index,
            value_struct = signature.value_struct.unwrap_or("-"),
            "Type-checked store created"
        );

        Ok(Self { inner, signature })
    }

    /// Returns the kinds fixed at construction.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the wrapped store. Calls made on it bypass the type checks.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S> IndexedStore<Value, Value, Value> for StrictStore<S>
where
    S: IndexedStore<Value, Value, Value>,
{
    fn insert(
        &self,
        key: Value,
        value: Value,
        indices: impl IntoIterator<Item = Value>,
    ) -> StoreResult<()> {
        self.signature.check_key(&key)?;
        let indices: Vec<Value> = indices.into_iter().collect();
        for index in &indices {
            self.signature.check_index(index)?;
        }
        self.signature.check_value(&value)?;

        self.inner.insert(key, value, indices)
    }

    fn fetch_by_key(&self, key: &Value) -> StoreResult<Value> {
        self.signature.check_key(key)?;
        self.inner.fetch_by_key(key)
    }

    fn fetch_by_index(&self, index: &Value) -> StoreResult<Vec<Value>> {
        self.signature.check_index(index)?;
        self.inner.fetch_by_index(index)
    }

    fn delete_by_key(&self, key: &Value) -> StoreResult<()> {
        self.signature.check_key(key)?;
        self.inner.delete_by_key(key)
    }

    fn delete_by_index(&self, index: &Value) -> StoreResult<()> {
        self.signature.check_index(index)?;
        self.inner.delete_by_index(index)
    }

    fn add_index(&self, key: &Value, index: Value) -> StoreResult<()> {
        self.signature.check_key(key)?;
        self.signature.check_index(&index)?;
        self.inner.add_index(key, index)
    }

    fn remove_index(&self, key: &Value, index: &Value) -> StoreResult<()> {
        self.signature.check_key(key)?;
        self.signature.check_index(index)?;
        self.inner.remove_index(key, index)
    }

    fn key_num(&self) -> usize {
        self.inner.key_num()
    }

    fn index_num(&self) -> usize {
        self.inner.index_num()
    }

    fn key_num_of_index(&self, index: &Value) -> usize {
        match self.signature.check_index(index) {
            Ok(()) => self.inner.key_num_of_index(index),
            Err(_) => 0,
        }
    }

    fn index_num_of_key(&self, key: &Value) -> usize {
        match self.signature.check_key(key) {
            Ok(()) => self.inner.index_num_of_key(key),
            Err(_) => 0,
        }
    }

    fn has_key(&self, key: &Value) -> bool {
        self.signature.check_key(key).is_ok() && self.inner.has_key(key)
    }

    fn has_index(&self, index: &Value) -> bool {
        self.signature.check_index(index).is_ok() && self.inner.has_index(index)
    }

    fn transform<U, E, F>(&self, f: F) -> Result<HashMap<Value, U>, E>
    where
        F: FnMut(&Value, &Value) -> Result<U, E>,
    {
        self.inner.transform(f)
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnMut(&Value, &Value),
    {
        self.inner.for_each(f);
    }
}
