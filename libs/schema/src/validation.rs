//! Native-form and deep value validation per kind
//!
//! [`Kind::validate_value_type`] is purely structural: it checks that the
//! [`Value`] variant is the native representation of the kind and never
//! inspects content. [`Kind::validate_value`] additionally checks the
//! content of format-sensitive kinds. Enum membership needs the enum
//! definition and is checked by [`crate::Field::validate_value`] instead.

use crate::error::{ValidationError, ValidationResult};
use crate::format::{is_decimal, is_integer};
use crate::kind::Kind;
use crate::value::Value;

impl Kind {
    /// Rust type name of the native representation expected by this kind
    pub fn native_type_name(self) -> &'static str {
        match self {
            Kind::String | Kind::IntegerString | Kind::DecimalString | Kind::Enum => "String",
            Kind::Bytes | Kind::Address => "Vec<u8>",
            Kind::Int8 => "i8",
            Kind::Uint8 => "u8",
            Kind::Int16 => "i16",
            Kind::Uint16 => "u16",
            Kind::Int32 => "i32",
            Kind::Uint32 => "u32",
            Kind::Int64 => "i64",
            Kind::Uint64 => "u64",
            Kind::Float32 => "f32",
            Kind::Float64 => "f64",
            Kind::Bool => "bool",
            Kind::Time => "DateTime<Utc>",
            Kind::Duration => "TimeDelta",
            Kind::Json => "Json",
            Kind::Invalid => "nothing",
        }
    }

    /// Check that `value` uses the native representation of this kind
    pub fn validate_value_type(self, value: &Value) -> ValidationResult<()> {
        self.validate()?;

        let matches = matches!(
            (self, value),
            (
                Kind::String | Kind::IntegerString | Kind::DecimalString | Kind::Enum,
                Value::String(_)
            ) | (Kind::Bytes | Kind::Address, Value::Bytes(_))
                | (Kind::Int8, Value::Int8(_))
                | (Kind::Uint8, Value::Uint8(_))
                | (Kind::Int16, Value::Int16(_))
                | (Kind::Uint16, Value::Uint16(_))
                | (Kind::Int32, Value::Int32(_))
                | (Kind::Uint32, Value::Uint32(_))
                | (Kind::Int64, Value::Int64(_))
                | (Kind::Uint64, Value::Uint64(_))
                | (Kind::Float32, Value::Float32(_))
                | (Kind::Float64, Value::Float64(_))
                | (Kind::Bool, Value::Bool(_))
                | (Kind::Time, Value::Time(_))
                | (Kind::Duration, Value::Duration(_))
                | (Kind::Json, Value::Json(_))
        );

        if matches {
            Ok(())
        } else {
            Err(ValidationError::TypeMismatch {
                kind: self,
                expected: self.native_type_name(),
                got: value.native_type_name(),
            })
        }
    }

    /// Check representation and, for format-sensitive kinds, content
    pub fn validate_value(self, value: &Value) -> ValidationResult<()> {
        self.validate_value_type(value)?;

        match (self, value) {
            (Kind::String, Value::String(s)) => {
                if s.contains('\0') {
                    return Err(ValidationError::invalid_format(
                        self,
                        s.escape_default().to_string(),
                        "string must not contain NUL characters",
                    ));
                }
            }
            (Kind::IntegerString, Value::String(s)) => {
                if !is_integer(s) {
                    return Err(ValidationError::invalid_format(
                        self,
                        s,
                        "expected a base-10 integer of at most 100 digits",
                    ));
                }
            }
            (Kind::DecimalString, Value::String(s)) => {
                if !is_decimal(s) {
                    return Err(ValidationError::invalid_format(
                        self,
                        s,
                        "expected a base-10 decimal number",
                    ));
                }
            }
            (Kind::Json, Value::Json(text)) => {
                if let Err(e) = serde_json::from_str::<serde::de::IgnoredAny>(text) {
                    return Err(ValidationError::invalid_format(
                        self,
                        text,
                        format!("expected valid JSON: {e}"),
                    ));
                }
            }
            _ => {}
        }

        Ok(())
    }
}
