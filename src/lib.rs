//! # indexkv - An In-Memory Store with N:M Secondary Indices
//!
//! indexkv is a key-value store where every value has one unique key and any
//! number of secondary indices. An index can be shared by many keys, so values can
//! be looked up or deleted as a group, and both directions stay consistent.
//!
//! ## Features
//!
//! - **N:M Indexing**: Fetch or delete every value carrying an index
//! - **Thread Safety**: A reader/writer lock guards the whole index structure
//! - **Type Checking**: Optional runtime kind checks for dynamically typed values
//! - **Self-Expiring Values**: A background Tokio task removes values that report
//!   themselves expired
//! - **Lock-Free Variant**: The bare engine for single-threaded callers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              indexkv                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────────────────┐  │
//! │  │ StrictStore │───>│   Store /   │───>│         IndexedMap          │  │
//! │  │ (kind check)│    │ExpiringStore│    │  key ──> value              │  │
//! │  └─────────────┘    │  (RwLock)   │    │  key ──> [index]            │  │
//! │                     └─────────────┘    │  index ──> [key]            │  │
//! │                                        └─────────────────────────────┘  │
//! │                                                       ▲                 │
//! │                     ┌─────────────────────────────────┴───────────────┐ │
//! │                     │           ExpirySweeper                         │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use indexkv::{IndexedMap, IndexedStore, Store, StrictStore, Value};
//!
//! // Thread-safe store with static types
//! let store = Store::new();
//! store.insert(1, "alice", ["admin", "eu"]).unwrap();
//! store.insert(2, "bob", ["eu"]).unwrap();
//! assert_eq!(store.fetch_by_index(&"eu").unwrap(), vec!["alice", "bob"]);
//!
//! // Single-threaded, no locking
//! let mut map = IndexedMap::new();
//! map.insert(1, "alice", ["admin"]).unwrap();
//! assert_eq!(map.fetch_by_key(&1), Ok(&"alice"));
//!
//! // Dynamic values with kinds fixed from samples
//! let strict = StrictStore::new("key", 0, "index").unwrap();
//! assert!(strict.insert(Value::from(1), Value::from(1), []).is_err());
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The engine and its store variants
//! - [`value`]: Dynamic values used by the type-checked store
//! - [`error`]: The error taxonomy shared by every operation
//!
//! ## Design Highlights
//!
//! ### One Engine
//!
//! All variants run the same algorithms in [`IndexedMap`]. Locking, kind checks
//! and expiry are layers around it rather than separate implementations.
//!
//! ### Errors, Not Panics
//!
//! Every failure is a [`StoreError`] returned to the caller. Nothing is retried
//! and a failed operation leaves the store unchanged.
//!
//! ### Stoppable Expiry
//!
//! The sweeper belongs to its store. It stops when the store is closed or
//! dropped, so no background task outlives its owner.

pub mod error;
pub mod storage;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{StoreError, StoreResult};
pub use storage::{
    start_expiry_sweeper, Expirable, ExpiringStore, ExpiryConfig, ExpiryProbe, ExpirySweeper,
    IndexedMap, IndexedStore, Signature, Store, StrictStore,
};
pub use value::{Kind, Object, Role, Value};

/// Version of indexkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
