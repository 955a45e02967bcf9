//! Dynamic Values
//!
//! The type-checked store works on runtime-tagged values rather than static
//! generic parameters. This module defines that value model.
//!
//! ## Modules
//!
//! - `types`: the `Value` enum and the structured `Object` payload
//! - `kind`: the coarse `Kind` classification and the argument `Role`
//!
//! ## Example
//!
//! ```
//! use indexkv::value::{Kind, Value};
//!
//! let key = Value::from("user:1");
//! assert_eq!(key.kind(), Kind::Str);
//! assert!(key.kind().is_scalar());
//!
//! let tags = Value::from(vec![Value::from(1), Value::from(2)]);
//! assert_eq!(tags.kind(), Kind::List);
//! ```

pub mod kind;
pub mod types;

// Re-export commonly used types for convenience
pub use kind::{Kind, Role};
pub use types::{Object, Value};
