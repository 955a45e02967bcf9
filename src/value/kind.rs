//! Value Kinds
//!
//! A [`Kind`] is the coarse classification of a [`Value`](super::Value) that the
//! type guard records at construction and compares on every call.

use std::fmt;

/// The coarse type classification of a dynamic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Bytes,
    List,
    /// A named, structured payload (see [`Object`](super::Object))
    Struct,
}

impl Kind {
    /// Returns true if values of this kind can discriminate map entries,
    /// i.e. can serve as a key or an index.
    ///
    /// Composite and reference-bearing kinds are excluded. `Bool` is accepted,
    /// unlike stores that only allow numeric and string keys.
    pub fn is_scalar(self) -> bool {
        !matches!(self, Kind::List | Kind::Struct)
    }

    /// Returns the lowercase name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::Str => "string",
            Kind::Bytes => "bytes",
            Kind::List => "list",
            Kind::Struct => "struct",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which argument of an operation a type check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Key,
    Value,
    Index,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Key => f.write_str("key"),
            Role::Value => f.write_str("value"),
            Role::Index => f.write_str("index"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kinds() {
        for kind in [
            Kind::Bool,
            Kind::Int,
            Kind::Uint,
            Kind::Float,
            Kind::Str,
            Kind::Bytes,
        ] {
            assert!(kind.is_scalar(), "{} should be scalar", kind);
        }
        assert!(!Kind::List.is_scalar());
        assert!(!Kind::Struct.is_scalar());
    }

    #[test]
    fn test_display() {
        assert_eq!(Kind::Str.to_string(), "string");
        assert_eq!(Kind::Struct.to_string(), "struct");
        assert_eq!(Role::Index.to_string(), "index");
    }
}
