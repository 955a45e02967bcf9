//! Dynamic Value Types
//!
//! [`Value`] covers the scalar kinds that can act as keys and indices, plus lists
//! and structured objects that can only be stored as values.
//!
//! Values are compared and hashed by content, with two exceptions:
//! - floats compare by bit pattern, so `NaN` equals itself and `0.0 != -0.0`
//! - objects compare by identity of their shared payload

use crate::storage::expiry::{Expirable, ExpiryProbe};
use bytes::Bytes;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::kind::Kind;

type Payload = dyn Any + Send + Sync + 'static;

/// A named, shared payload of an arbitrary Rust type.
///
/// The struct name of an object is the Rust type name of its payload, which is
/// what the type guard compares against its sample. Cloning an object clones
/// the handle, not the payload.
///
/// # Example
///
/// ```
/// use indexkv::value::Object;
///
/// #[derive(Debug)]
/// struct Session {
///     user: String,
/// }
///
/// let obj = Object::new(Session { user: "ariz".into() });
/// assert!(obj.type_name().ends_with("Session"));
/// assert_eq!(obj.downcast_ref::<Session>().unwrap().user, "ariz");
/// ```
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    payload: Arc<Payload>,
    /// Registered expiry capability, if the payload has one
    expiry: Option<fn(&Payload) -> bool>,
}

fn probe_payload<T: Expirable + Any>(payload: &Payload) -> bool {
    payload
        .downcast_ref::<T>()
        .is_some_and(|value| value.is_expired())
}

impl Object {
    /// Wraps a payload without any capability.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self::from_arc(Arc::new(payload))
    }

    /// Wraps an already shared payload without any capability.
    pub fn from_arc<T: Any + Send + Sync>(payload: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            payload,
            expiry: None,
        }
    }

    /// Wraps a payload and registers its expiry capability.
    ///
    /// Only objects built this way can be inserted into an expiring store.
    pub fn expirable<T: Expirable + Any + Send + Sync>(payload: T) -> Self {
        Self::expirable_arc(Arc::new(payload))
    }

    /// Wraps an already shared payload and registers its expiry capability.
    pub fn expirable_arc<T: Expirable + Any + Send + Sync>(payload: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            payload,
            expiry: Some(probe_payload::<T>),
        }
    }

    /// Returns the Rust type name of the payload.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if the expiry capability was registered.
    pub fn is_expirable(&self) -> bool {
        self.expiry.is_some()
    }

    /// Borrows the payload as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.payload).downcast_ref::<T>()
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.payload) as *const ()
    }
}

impl ExpiryProbe for Object {
    fn probe_expired(&self) -> Option<bool> {
        self.expiry.map(|probe| probe(&*self.payload))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("expirable", &self.is_expirable())
            .finish_non_exhaustive()
    }
}

/// A runtime-tagged value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),

    /// Signed integers of any width
    Int(i64),

    /// Unsigned integers of any width
    Uint(u64),

    /// Floating point numbers of any width
    Float(f64),

    Str(String),

    /// Binary-safe byte strings
    Bytes(Bytes),

    /// Ordered collection of values (never a valid key or index)
    List(Vec<Value>),

    /// Structured payload (never a valid key or index)
    Object(Object),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::List(_) => Kind::List,
            Value::Object(_) => Kind::Struct,
        }
    }

    /// Returns the struct name if this is an object.
    pub fn struct_name(&self) -> Option<&'static str> {
        match self {
            Value::Object(obj) => Some(obj.type_name()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract the inner string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract the inner bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Attempts to extract the inner list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrows an object's payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(|obj| obj.downcast_ref::<T>())
    }
}

impl ExpiryProbe for Value {
    fn probe_expired(&self) -> Option<bool> {
        match self {
            Value::Object(obj) => obj.probe_expired(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Uint(n) => n.hash(state),
            Value::Float(n) => n.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::List(values) => values.hash(state),
            Value::Object(obj) => obj.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bytes(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "b\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            Value::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(Uint as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct Ticket {
        expired: AtomicBool,
    }

    impl Expirable for Ticket {
        fn is_expired(&self) -> bool {
            self.expired.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::from(true).kind(), Kind::Bool);
        assert_eq!(Value::from(7u8).kind(), Kind::Uint);
        assert_eq!(Value::from(-7i32).kind(), Kind::Int);
        assert_eq!(Value::from(1.5f32).kind(), Kind::Float);
        assert_eq!(Value::from("x").kind(), Kind::Str);
        assert_eq!(Value::from(Bytes::from("x")).kind(), Kind::Bytes);
        assert_eq!(Value::from(vec![]).kind(), Kind::List);
        assert_eq!(Value::from(Object::new(1u32)).kind(), Kind::Struct);
    }

    #[test]
    fn test_int_widths_share_a_kind() {
        assert_eq!(Value::from(5i8), Value::from(5i64));
        assert_ne!(Value::from(5i64), Value::from(5u64));
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(0.0), Value::from(-0.0));
    }

    #[test]
    fn test_values_as_set_members() {
        let mut set = HashSet::new();
        set.insert(Value::from("a"));
        set.insert(Value::from("a"));
        set.insert(Value::from(1));
        set.insert(Value::from(1.0));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_object_identity() {
        let a = Object::new(String::from("payload"));
        let b = a.clone();
        let c = Object::new(String::from("payload"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.type_name(), c.type_name());
        assert_eq!(b.downcast_ref::<String>().map(String::as_str), Some("payload"));
        assert!(a.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_expiry_probe() {
        let ticket = Arc::new(Ticket {
            expired: AtomicBool::new(false),
        });
        let value = Value::from(Object::expirable_arc(Arc::clone(&ticket)));
        assert_eq!(value.probe_expired(), Some(false));

        ticket.expired.store(true, Ordering::Relaxed);
        assert_eq!(value.probe_expired(), Some(true));

        assert_eq!(Value::from(Object::new(1u8)).probe_expired(), None);
        assert_eq!(Value::from("plain").probe_expired(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::from(false)]).to_string(),
            "[1, false]"
        );
        assert_eq!(Value::from(Bytes::from_static(b"ab")).to_string(), "b\"ab\"");
    }
}
