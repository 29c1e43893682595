//! The value model stored in node slots.
//!
//! A [`Value`] is a tagged union over scalars, strings, and two kinds of node
//! reference:
//!
//! - [`Value::Node`] is an *owning* reference. It participates in the
//!   single-parent bookkeeping: storing it in a slot makes the holder the
//!   node's parent.
//! - [`Value::Alias`] is a read-only, non-owning link. Any number of slots may
//!   hold an alias to the same node without affecting its parent.
//!
//! Values are cheap to clone: strings are shared `Arc<str>` buffers and node
//! references are `Arc` handles.
//!
//! # Comparisons
//!
//! Integer kinds compare numerically with each other, strings compare by
//! content, and node references (owning or alias) compare by identity. Every
//! other cross-kind comparison falls back to the fixed variant order
//! `Empty < Null < Bool < Int < UInt < Double < Str < Alias < Node`.
//!
//! ```
//! use arbor::Value;
//! use std::cmp::Ordering;
//!
//! assert_eq!(Value::from(5i64), Value::from(5u64));
//! assert_ne!(Value::from(5i64), Value::from(5.0));
//! assert_eq!(Value::from("abc").compare(&Value::from("abd")), Ordering::Less);
//! assert_eq!(Value::Null.compare(&Value::from(false)), Ordering::Less);
//! ```

mod convert;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::node::{NodeKind, NodeRef, NodeView};

pub(crate) use convert::{parse_f64_prefix, parse_i64_prefix, parse_u64_prefix};

/// A slot value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value. Converts to `false` via [`Value::is_set`].
    #[default]
    Empty,
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(Arc<str>),
    /// Read-only, non-owning node link.
    Alias(NodeView),
    /// Owning node reference.
    Node(NodeRef),
}

/// Discriminant of a [`Value`], ordered like the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Empty,
    Null,
    Bool,
    Int,
    UInt,
    Double,
    Str,
    Alias,
    Node,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Double(_) => ValueKind::Double,
            Value::Str(_) => ValueKind::Str,
            Value::Alias(_) => ValueKind::Alias,
            Value::Node(_) => ValueKind::Node,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int64",
            Value::UInt(_) => "uint64",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Alias(view) => match view.kind() {
                NodeKind::Map => "const map",
                NodeKind::Array => "const array",
            },
            Value::Node(node) => match node.kind() {
                NodeKind::Map => "map",
                NodeKind::Array => "array",
            },
        }
    }

    /// Anything but [`Value::Empty`].
    pub fn is_set(&self) -> bool {
        !matches!(self, Value::Empty)
    }

    /// `Empty`, `Null`, or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty | Value::Null => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Owning reference or alias.
    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_) | Value::Alias(_))
    }

    /// Bool, integer, double or string.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Double(_) | Value::Str(_)
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_))
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v as i128),
            Value::UInt(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Numbers are true when positive; strings when they read `"true"` or
    /// start with a positive number.
    pub fn as_bool(&self, default: bool) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(v) => *v > 0,
            Value::UInt(v) => *v > 0,
            Value::Double(v) => *v > 0.0,
            Value::Str(s) => &**s == "true" || parse_f64_prefix(s).is_some_and(|v| v > 0.0),
            _ => default,
        }
    }

    /// Unsigned values clamp to `i64::MAX`, doubles round half away from zero,
    /// strings parse their numeric prefix (`0x` hex and leading-zero octal
    /// included).
    pub fn as_i64(&self, default: i64) -> i64 {
        match self {
            Value::Bool(b) => *b as i64,
            Value::Int(v) => *v,
            Value::UInt(v) => (*v).min(i64::MAX as u64) as i64,
            Value::Double(v) => v.round() as i64,
            Value::Str(s) => parse_i64_prefix(s).unwrap_or(default),
            _ => default,
        }
    }

    /// Like [`Value::as_i64`] but returns `negative` for values below zero.
    pub fn as_u64(&self, default: u64, negative: u64) -> u64 {
        match self {
            Value::Bool(b) => *b as u64,
            Value::UInt(v) => *v,
            Value::Int(v) => u64::try_from(*v).unwrap_or(negative),
            Value::Double(v) => {
                let rounded = v.round() as i64;
                u64::try_from(rounded).unwrap_or(negative)
            }
            Value::Str(s) => {
                if s.starts_with('-') {
                    match parse_i64_prefix(s) {
                        Some(v) => u64::try_from(v).unwrap_or(negative),
                        None => default,
                    }
                } else {
                    parse_u64_prefix(s).unwrap_or(default)
                }
            }
            _ => default,
        }
    }

    pub fn as_i32(&self, default: i32) -> i32 {
        self.as_i64(default as i64)
            .clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn as_u32(&self, default: u32, negative: u32) -> u32 {
        self.as_u64(default as u64, negative as u64)
            .min(u32::MAX as u64) as u32
    }

    pub fn as_f64(&self, default: f64) -> f64 {
        match self {
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Int(v) => *v as f64,
            Value::UInt(v) => *v as f64,
            Value::Double(v) => *v,
            Value::Str(s) => parse_f64_prefix(s).unwrap_or(default),
            _ => default,
        }
    }

    /// Textual form of a scalar; `default` for everything else.
    pub fn to_string_or(&self, default: &str) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Double(v) => format!("{v:.6}"),
            Value::Str(s) => s.to_string(),
            _ => default.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The owning reference, if this is one.
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// A read-only view of either node reference kind.
    pub fn as_node_view(&self) -> Option<NodeView> {
        match self {
            Value::Node(node) => Some(NodeView::new(node.clone())),
            Value::Alias(view) => Some(view.clone()),
            _ => None,
        }
    }

    /// Owning references become aliases; everything else is unchanged.
    pub fn to_read_only(&self) -> Value {
        match self {
            Value::Node(node) => Value::Alias(NodeView::new(node.clone())),
            other => other.clone(),
        }
    }

    pub(crate) fn node_ptr(&self) -> Option<*const crate::node::Node> {
        match self {
            Value::Node(node) => Some(Arc::as_ptr(node)),
            Value::Alias(view) => Some(view.as_ptr()),
            _ => None,
        }
    }

    /// True if `self` is an owning reference to the same node as `node`.
    pub fn owns(&self, node: &NodeRef) -> bool {
        matches!(self, Value::Node(held) if Arc::ptr_eq(held, node))
    }

    /// Total order used for sorting and structural comparison.
    pub fn compare(&self, other: &Value) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        if let (Some(a), Some(b)) = (self.integer(), other.integer()) {
            return a.cmp(&b);
        }
        if let (Value::Str(a), Value::Str(b)) = (self, other) {
            return a.cmp(b);
        }
        if let (Some(a), Some(b)) = (self.node_ptr(), other.node_ptr()) {
            return (a as usize).cmp(&(b as usize));
        }
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Empty, Value::Empty) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => {
                if let (Some(a), Some(b)) = (self.integer(), other.integer()) {
                    return a == b;
                }
                match (self.node_ptr(), other.node_ptr()) {
                    (Some(a), Some(b)) => std::ptr::eq(a, b),
                    _ => false,
                }
            }
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Alias(view) => write!(f, "<{} #{}>", self.type_name(), view.uid()),
            Value::Node(node) => write!(f, "<{} #{}>", self.type_name(), node.uid()),
        }
    }
}

// Convenient From implementations for common types
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::UInt(value as u64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<NodeRef> for Value {
    fn from(node: NodeRef) -> Self {
        Value::Node(node)
    }
}

impl From<&NodeRef> for Value {
    fn from(node: &NodeRef) -> Self {
        Value::Node(node.clone())
    }
}

impl From<NodeView> for Value {
    fn from(view: NodeView) -> Self {
        Value::Alias(view)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

impl AsRef<Value> for Value {
    fn as_ref(&self) -> &Value {
        self
    }
}

/// `PartialEq` between a value-like type and a primitive, in both directions.
macro_rules! impl_primitive_eq {
    ($target:ty) => {
        impl_primitive_eq!(@one $target, bool);
        impl_primitive_eq!(@one $target, i32);
        impl_primitive_eq!(@one $target, i64);
        impl_primitive_eq!(@one $target, u32);
        impl_primitive_eq!(@one $target, u64);
        impl_primitive_eq!(@one $target, f64);

        impl PartialEq<str> for $target {
            fn eq(&self, other: &str) -> bool {
                AsRef::<$crate::Value>::as_ref(self).as_str() == Some(other)
            }
        }

        impl PartialEq<&str> for $target {
            fn eq(&self, other: &&str) -> bool {
                self == *other
            }
        }

        impl PartialEq<String> for $target {
            fn eq(&self, other: &String) -> bool {
                self == other.as_str()
            }
        }

        impl PartialEq<$target> for &str {
            fn eq(&self, other: &$target) -> bool {
                other == self
            }
        }
    };
    (@one $target:ty, $prim:ty) => {
        impl PartialEq<$prim> for $target {
            fn eq(&self, other: &$prim) -> bool {
                *AsRef::<$crate::Value>::as_ref(self) == $crate::Value::from(*other)
            }
        }

        impl PartialEq<$target> for $prim {
            fn eq(&self, other: &$target) -> bool {
                other == self
            }
        }
    };
}

pub(crate) use impl_primitive_eq;

impl_primitive_eq!(Value);
