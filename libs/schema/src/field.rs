//! Field definitions

use serde::{Deserialize, Serialize};

use crate::enum_type::EnumType;
use crate::error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
use crate::format::{is_valid_name, NAME_FORMAT};
use crate::kind::{Kind, MAX_ADDRESS_LENGTH};
use crate::value::Value;

/// A named, typed slot in an object's key or value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    /// Upper bound on the byte length of variable-length kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_type: Option<EnumType>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            max_length: None,
            enum_type: None,
        }
    }

    pub fn enumeration(name: impl Into<String>, enum_type: EnumType) -> Self {
        Self {
            enum_type: Some(enum_type),
            ..Self::new(name, Kind::Enum)
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Effective byte-length bound, including the address limit
    pub fn effective_max_length(&self) -> Option<usize> {
        let declared = self.max_length.map(|m| m as usize);
        match self.kind {
            Kind::Address => Some(declared.map_or(MAX_ADDRESS_LENGTH, |m| m.min(MAX_ADDRESS_LENGTH))),
            _ => declared,
        }
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if !is_valid_name(&self.name) {
            return Err(SchemaError::InvalidName {
                what: "field",
                name: self.name.clone(),
                pattern: NAME_FORMAT,
            });
        }

        self.kind
            .validate()
            .map_err(|source| SchemaError::InvalidFieldKind {
                field: self.name.clone(),
                source,
            })?;

        match (self.kind, &self.enum_type) {
            (Kind::Enum, None) => Err(SchemaError::MissingEnumType {
                field: self.name.clone(),
            }),
            (Kind::Enum, Some(e)) => e.validate(),
            (kind, Some(_)) => Err(SchemaError::UnexpectedEnumType {
                field: self.name.clone(),
                kind,
            }),
            (_, None) => Ok(()),
        }
    }

    /// Deep validation plus the constraints only the field knows about:
    /// enum membership and maximum length
    pub fn validate_value(&self, value: &Value) -> ValidationResult<()> {
        self.kind
            .validate_value(value)
            .map_err(|e| match e {
                ValidationError::TypeMismatch { .. } | ValidationError::InvalidFormat { .. } => {
                    ValidationError::in_field(&self.name, e)
                }
                other => other,
            })?;

        if let (Kind::Enum, Some(enum_type), Value::String(name)) =
            (self.kind, &self.enum_type, value)
        {
            if enum_type.value_of(name).is_none() {
                return Err(ValidationError::field_constraint(
                    &self.name,
                    format!("{name:?} is not a member of enum {}", enum_type.name),
                ));
            }
        }

        if let Some(max) = self.effective_max_length() {
            let len = match value {
                Value::String(s) if self.kind == Kind::String => Some(s.len()),
                Value::Bytes(b) => Some(b.len()),
                _ => None,
            };
            if let Some(len) = len.filter(|len| *len > max) {
                return Err(ValidationError::field_constraint(
                    &self.name,
                    format!("length {len} exceeds maximum {max}"),
                ));
            }
        }

        Ok(())
    }
}
