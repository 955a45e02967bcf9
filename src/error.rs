//! Store Errors
//!
//! Every fallible operation in this crate returns a [`StoreResult`]. Errors are
//! ordinary values: nothing is retried internally and nothing is logged by the
//! engine itself.

use crate::value::{Kind, Role};
use thiserror::Error;

/// Errors returned by the indexed store and its variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Insert with a key that is already present
    #[error("duplicate key")]
    DuplicateKey,

    /// The referenced key is not stored
    #[error("key not found")]
    KeyNotFound,

    /// The referenced index is not stored, or not attached to the given key
    #[error("index not found")]
    IndexNotFound,

    /// The index is already attached to the key
    #[error("duplicate index")]
    DuplicateIndex,

    /// An argument's kind differs from the kind fixed at construction
    #[error("wrong {role} type: expected {expected}, found {found}")]
    WrongType {
        role: Role,
        expected: Kind,
        found: Kind,
    },

    /// A structured value's type name differs from the sample's
    #[error("wrong struct type: expected {expected}, found {found}")]
    WrongStructType { expected: String, found: String },

    /// The value does not expose the expiry capability
    #[error("value does not implement the expiry capability")]
    CapabilityMissing,

    /// The sample kind cannot be used for the key or index role
    #[error("unsupported {role} type: {kind}")]
    UnsupportedType { role: Role, kind: Kind },

    /// The expiry sweeper needs a Tokio runtime to run on
    #[error("expiry sweeper requires a running Tokio runtime")]
    RuntimeUnavailable,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(StoreError::DuplicateKey.to_string(), "duplicate key");
        assert_eq!(
            StoreError::WrongType {
                role: Role::Key,
                expected: Kind::Str,
                found: Kind::Int,
            }
            .to_string(),
            "wrong key type: expected string, found int"
        );
        assert_eq!(
            StoreError::UnsupportedType {
                role: Role::Index,
                kind: Kind::List,
            }
            .to_string(),
            "unsupported index type: list"
        );
    }
}
