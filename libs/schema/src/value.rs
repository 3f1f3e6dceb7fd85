//! Native in-process representation of field values
//!
//! [`Value`] is a closed set of host representations. Several kinds share a
//! representation: integer, decimal and enum values are [`Value::String`],
//! address values are [`Value::Bytes`]. The kind declared by the field, not
//! the variant, decides how a value is validated and encoded.
//!
//! Floats compare and hash by bit pattern so that `Value` can be `Eq + Hash`
//! and serve as part of an object identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeDelta, Utc};

/// A single field value in native form
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Bytes(Vec<u8>),
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Duration(TimeDelta),
    /// Raw JSON text, not necessarily well formed until validated
    Json(String),
}

impl Value {
    /// Rust type name of the native representation, for diagnostics
    pub fn native_type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Bytes(_) => "Vec<u8>",
            Value::Int8(_) => "i8",
            Value::Uint8(_) => "u8",
            Value::Int16(_) => "i16",
            Value::Uint16(_) => "u16",
            Value::Int32(_) => "i32",
            Value::Uint32(_) => "u32",
            Value::Int64(_) => "i64",
            Value::Uint64(_) => "u64",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Time(_) => "DateTime<Utc>",
            Value::Duration(_) => "TimeDelta",
            Value::Json(_) => "Json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Build a JSON value from text without checking it
    pub fn json(text: impl Into<String>) -> Self {
        Value::Json(text.into())
    }

    fn discriminant(&self) -> u8 {
        match self {
            Value::String(_) => 0,
            Value::Bytes(_) => 1,
            Value::Int8(_) => 2,
            Value::Uint8(_) => 3,
            Value::Int16(_) => 4,
            Value::Uint16(_) => 5,
            Value::Int32(_) => 6,
            Value::Uint32(_) => 7,
            Value::Int64(_) => 8,
            Value::Uint64(_) => 9,
            Value::Float32(_) => 10,
            Value::Float64(_) => 11,
            Value::Bool(_) => 12,
            Value::Time(_) => 13,
            Value::Duration(_) => 14,
            Value::Json(_) => 15,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Uint8(a), Value::Uint8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Uint16(a), Value::Uint16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Uint32(a), Value::Uint32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Uint64(a), Value::Uint64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminant().hash(state);
        match self {
            Value::String(v) | Value::Json(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Int8(v) => v.hash(state),
            Value::Uint8(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Uint16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Uint32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Uint64(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Time(v) => v.hash(state),
            Value::Duration(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Uint8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Uint16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Uint32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Duration(v) => write!(f, "{v}"),
            Value::Json(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_native! {
    String => String,
    Vec<u8> => Bytes,
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    DateTime<Utc> => Time,
    TimeDelta => Duration,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}
