//! # Kind Registry
//!
//! ## Purpose
//!
//! Enumerates the value kinds a schema field can declare. Every kind defines
//! four encodings (native, JSON, binary key, binary value) and one validity
//! predicate; the encodings themselves live in the `codec` crate, the
//! predicates in [`crate::validation`].
//!
//! ## Identifier Layout
//!
//! ```text
//!  0        1 .. 20                       21 .. 255
//!  Invalid  implemented kinds (1:1 names)  unimplemented, rejected
//! ```
//!
//! Identifier `0` is reserved as invalid and [`MAX_VALID_KIND`] bounds the
//! implemented range. Every implemented identifier has exactly one lowercase
//! name. The reverse table used by [`Kind::parse`] is built once from
//! [`Kind::ALL`] on first use and never mutated afterwards, so adding a kind
//! means adding the variant, its entry in `ALL` and its arm in
//! [`Kind::as_str`] in the same change.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ValidationError, ValidationResult};
use crate::value::Value;

/// Basic type of a field in an object
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, TryFromPrimitive, IntoPrimitive,
)]
#[repr(u8)]
pub enum Kind {
    /// Reserved, never valid
    Invalid = 0,
    /// UTF-8 string with no NUL characters
    String = 1,
    /// Raw byte array
    Bytes = 2,
    Int8 = 3,
    Uint8 = 4,
    Int16 = 5,
    Uint16 = 6,
    Int32 = 7,
    Uint32 = 8,
    Int64 = 9,
    Uint64 = 10,
    /// Arbitrary precision integer carried as a base-10 string
    IntegerString = 11,
    /// Arbitrary precision decimal carried as a base-10 string
    DecimalString = 12,
    Bool = 13,
    /// Nanosecond precision UTC timestamp
    Time = 14,
    /// Signed nanosecond precision duration
    Duration = 15,
    Float32 = 16,
    Float64 = 17,
    /// Account address, at most [`MAX_ADDRESS_LENGTH`] bytes
    Address = 18,
    /// Value of an enum type, carried as the value's name
    Enum = 19,
    /// Arbitrary JSON text
    Json = 20,
}

/// Highest implemented kind
pub const MAX_VALID_KIND: Kind = Kind::Json;

/// Longest supported address in bytes
pub const MAX_ADDRESS_LENGTH: usize = 63;

static KIND_BY_NAME: Lazy<HashMap<&'static str, Kind>> = Lazy::new(|| {
    let table: HashMap<_, _> = Kind::ALL.iter().map(|k| (k.as_str(), *k)).collect();
    debug_assert_eq!(table.len(), Kind::ALL.len(), "kind names must be unique");
    table
});

impl Kind {
    /// Every implemented kind in identifier order
    pub const ALL: [Kind; MAX_VALID_KIND as usize] = [
        Kind::String,
        Kind::Bytes,
        Kind::Int8,
        Kind::Uint8,
        Kind::Int16,
        Kind::Uint16,
        Kind::Int32,
        Kind::Uint32,
        Kind::Int64,
        Kind::Uint64,
        Kind::IntegerString,
        Kind::DecimalString,
        Kind::Bool,
        Kind::Time,
        Kind::Duration,
        Kind::Float32,
        Kind::Float64,
        Kind::Address,
        Kind::Enum,
        Kind::Json,
    ];

    /// Numeric identifier of this kind
    pub fn id(self) -> u8 {
        self.into()
    }

    /// Resolve and validate a raw identifier
    pub fn from_id(id: u8) -> ValidationResult<Kind> {
        Self::validate_id(id)?;
        Kind::try_from(id).map_err(|_| ValidationError::unimplemented_kind(id))
    }

    /// Fails when `id` is 0 or above [`MAX_VALID_KIND`]
    pub fn validate_id(id: u8) -> ValidationResult<()> {
        if id == Kind::Invalid as u8 {
            return Err(ValidationError::reserved_kind());
        }
        if id > MAX_VALID_KIND as u8 {
            return Err(ValidationError::unimplemented_kind(id));
        }
        Ok(())
    }

    /// Fails for [`Kind::Invalid`]
    pub fn validate(self) -> ValidationResult<()> {
        Self::validate_id(self.id())
    }

    /// Canonical lowercase name, `"invalid"` for [`Kind::Invalid`]
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Int8 => "int8",
            Kind::Uint8 => "uint8",
            Kind::Int16 => "int16",
            Kind::Uint16 => "uint16",
            Kind::Int32 => "int32",
            Kind::Uint32 => "uint32",
            Kind::Int64 => "int64",
            Kind::Uint64 => "uint64",
            Kind::IntegerString => "integer",
            Kind::DecimalString => "decimal",
            Kind::Bool => "bool",
            Kind::Time => "time",
            Kind::Duration => "duration",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Address => "address",
            Kind::Enum => "enum",
            Kind::Json => "json",
        }
    }

    /// Render any raw identifier; unknown identifiers become `invalid(N)`
    pub fn name_of(id: u8) -> String {
        match Kind::from_id(id) {
            Ok(kind) => kind.as_str().to_string(),
            Err(_) => format!("invalid({id})"),
        }
    }

    /// Inverse of [`Kind::as_str`] over implemented kinds
    pub fn parse(name: &str) -> ValidationResult<Kind> {
        KIND_BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| ValidationError::UnknownKindName(name.to_string()))
    }

    /// False for kinds without a total, deterministic equality: floats and raw JSON
    pub fn is_valid_key_kind(self) -> bool {
        !matches!(self, Kind::Float32 | Kind::Float64 | Kind::Json)
    }

    /// Simplest kind with a unique native representation for `value`
    ///
    /// Never returns the string-backed kinds (integer, decimal, enum) or
    /// address, which share their native form with string and bytes; callers
    /// must name those explicitly.
    pub fn for_value(value: &Value) -> Kind {
        match value {
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::Int8(_) => Kind::Int8,
            Value::Uint8(_) => Kind::Uint8,
            Value::Int16(_) => Kind::Int16,
            Value::Uint16(_) => Kind::Uint16,
            Value::Int32(_) => Kind::Int32,
            Value::Uint32(_) => Kind::Uint32,
            Value::Int64(_) => Kind::Int64,
            Value::Uint64(_) => Kind::Uint64,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Bool(_) => Kind::Bool,
            Value::Time(_) => Kind::Time,
            Value::Duration(_) => Kind::Duration,
            Value::Json(_) => Kind::Json,
        }
    }

    /// Fixed byte width of the numeric encodings, if the kind has one
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Kind::Int8 | Kind::Uint8 | Kind::Bool => Some(1),
            Kind::Int16 | Kind::Uint16 => Some(2),
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => Some(4),
            Kind::Int64 | Kind::Uint64 | Kind::Float64 | Kind::Time | Kind::Duration => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Invalid => write!(f, "invalid({})", self.id()),
            kind => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::parse(s)
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.validate().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Kind::parse(&name).map_err(serde::de::Error::custom)
    }
}
