//! Enum type definitions referenced by enum-kind fields

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::format::{is_valid_name, NAME_FORMAT};
use crate::kind::Kind;

/// One named member of an enum type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValueDefinition {
    pub name: String,
    pub value: i32,
}

impl EnumValueDefinition {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Named set of values; encoded in binary forms as `numeric_kind`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValueDefinition>,
    #[serde(default = "default_numeric_kind")]
    pub numeric_kind: Kind,
}

fn default_numeric_kind() -> Kind {
    Kind::Int32
}

impl EnumType {
    /// Enum backed by int32
    pub fn new(name: impl Into<String>, values: Vec<EnumValueDefinition>) -> Self {
        Self {
            name: name.into(),
            values,
            numeric_kind: default_numeric_kind(),
        }
    }

    /// Enum whose members are numbered 0, 1, 2, ... in the given order
    pub fn sequential<S: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        let values = members
            .into_iter()
            .enumerate()
            .map(|(i, m)| EnumValueDefinition::new(m, i as i32))
            .collect();
        Self::new(name, values)
    }

    pub fn with_numeric_kind(mut self, kind: Kind) -> Self {
        self.numeric_kind = kind;
        self
    }

    pub fn value_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|v| v.name == name).map(|v| v.value)
    }

    pub fn name_of(&self, value: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.value == value)
            .map(|v| v.name.as_str())
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if !is_valid_name(&self.name) {
            return Err(SchemaError::InvalidName {
                what: "enum type",
                name: self.name.clone(),
                pattern: NAME_FORMAT,
            });
        }

        let (min, max): (i64, i64) = match self.numeric_kind {
            Kind::Int8 => (i8::MIN.into(), i8::MAX.into()),
            Kind::Uint8 => (0, u8::MAX.into()),
            Kind::Int16 => (i16::MIN.into(), i16::MAX.into()),
            Kind::Uint16 => (0, u16::MAX.into()),
            Kind::Int32 => (i32::MIN.into(), i32::MAX.into()),
            other => {
                return Err(SchemaError::invalid_enum(
                    &self.name,
                    format!("numeric kind must be int8, uint8, int16, uint16 or int32, got {other}"),
                ))
            }
        };

        if self.values.is_empty() {
            return Err(SchemaError::invalid_enum(&self.name, "enum has no values"));
        }

        let mut names = HashSet::new();
        let mut numbers = HashSet::new();
        for v in &self.values {
            if !is_valid_name(&v.name) {
                return Err(SchemaError::InvalidName {
                    what: "enum value",
                    name: v.name.clone(),
                    pattern: NAME_FORMAT,
                });
            }
            if !names.insert(v.name.as_str()) {
                return Err(SchemaError::DuplicateName {
                    what: "enum value",
                    name: v.name.clone(),
                });
            }
            if !numbers.insert(v.value) {
                return Err(SchemaError::invalid_enum(
                    &self.name,
                    format!("value {} is used more than once", v.value),
                ));
            }
            let n = i64::from(v.value);
            if n < min || n > max {
                return Err(SchemaError::invalid_enum(
                    &self.name,
                    format!(
                        "value {} of {:?} does not fit {}",
                        v.value, v.name, self.numeric_kind
                    ),
                ));
            }
        }

        Ok(())
    }
}
