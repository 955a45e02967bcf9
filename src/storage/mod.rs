//! Storage Module
//!
//! This module provides the indexed store in its four variants:
//!
//! | Variant          | Locking        | Checks                        |
//! |------------------|----------------|-------------------------------|
//! | [`IndexedMap`]   | none (`&mut`)  | none                          |
//! | [`Store`]        | one `RwLock`   | none                          |
//! | [`ExpiringStore`]| one `RwLock`   | expiry capability on insert   |
//! | [`StrictStore`]  | inner store's  | key / value / index kinds     |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  StrictStore (kind checks)                                   │
//! │   └── Store / ExpiringStore ──────────────┐                  │
//! │        ┌───────────────────────────────┐  │                  │
//! │        │ RwLock<IndexedMap>            │<─┼── ExpirySweeper  │
//! │        │  values / keys / indices      │  │  (Tokio task)    │
//! │        └───────────────────────────────┘  │                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use indexkv::storage::{IndexedStore, Store};
//!
//! let store = Store::new();
//! store.insert("order:1", 250, ["customer:7", "status:open"]).unwrap();
//! store.insert("order:2", 90, ["customer:7"]).unwrap();
//!
//! assert_eq!(store.fetch_by_index(&"customer:7").unwrap(), vec![250, 90]);
//!
//! store.delete_by_index(&"status:open").unwrap();
//! assert_eq!(store.key_num(), 1);
//! ```

pub mod engine;
pub mod expiry;
pub mod store;
pub mod strict;

// Re-export commonly used types
pub use engine::IndexedMap;
pub use expiry::{
    start_expiry_sweeper, Expirable, ExpiringStore, ExpiryConfig, ExpiryProbe, ExpirySweeper,
};
pub use store::{IndexedStore, Store};
pub use strict::{Signature, StrictStore};
