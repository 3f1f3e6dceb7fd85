//! Object type definitions: an ordered key plus a value tuple

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
use crate::field::Field;
use crate::format::{is_valid_name, NAME_FORMAT};
use crate::object_update::ObjectUpdate;
use crate::value::Value;

/// Schema for one kind of stored object
///
/// Key fields form a composite ordered key in declared order. An object type
/// with no key fields is a singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub key_fields: Vec<Field>,
    #[serde(default)]
    pub value_fields: Vec<Field>,
    /// Deletions are expected to be kept by consumers rather than applied
    #[serde(default)]
    pub retain_deletions: bool,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, key_fields: Vec<Field>, value_fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            key_fields,
            value_fields,
            retain_deletions: false,
        }
    }

    pub fn with_retain_deletions(mut self, retain: bool) -> Self {
        self.retain_deletions = retain;
        self
    }

    /// All fields, key fields first
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.key_fields.iter().chain(self.value_fields.iter())
    }

    pub fn validate(&self) -> SchemaResult<()> {
        if !is_valid_name(&self.name) {
            return Err(SchemaError::InvalidName {
                what: "object type",
                name: self.name.clone(),
                pattern: NAME_FORMAT,
            });
        }

        let mut names = HashSet::new();
        for field in self.fields() {
            field.validate()?;
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateName {
                    what: "field",
                    name: field.name.clone(),
                });
            }
        }

        for field in &self.key_fields {
            if !field.kind.is_valid_key_kind() {
                return Err(SchemaError::InvalidKeyKind {
                    field: field.name.clone(),
                    kind: field.kind,
                });
            }
        }

        Ok(())
    }

    pub fn validate_key(&self, key: &[Value]) -> ValidationResult<()> {
        validate_tuple(&self.name, "key", &self.key_fields, key)
    }

    pub fn validate_values(&self, values: &[Value]) -> ValidationResult<()> {
        validate_tuple(&self.name, "value", &self.value_fields, values)
    }

    /// Check an update's key, values and deletion flag against this type
    pub fn validate_object_update(&self, update: &ObjectUpdate) -> ValidationResult<()> {
        if update.type_name != self.name {
            return Err(ValidationError::update_mismatch(
                &update.type_name,
                format!("addressed to object type {:?}", self.name),
            ));
        }

        self.validate_key(&update.key)?;

        if update.delete {
            if !update.value.is_empty() {
                return Err(ValidationError::update_mismatch(
                    &self.name,
                    "deletion must not carry values",
                ));
            }
            return Ok(());
        }

        self.validate_values(&update.value)
    }
}

fn validate_tuple(
    type_name: &str,
    part: &str,
    fields: &[Field],
    values: &[Value],
) -> ValidationResult<()> {
    if fields.len() != values.len() {
        return Err(ValidationError::update_mismatch(
            type_name,
            format!(
                "expected {} {part} values, got {}",
                fields.len(),
                values.len()
            ),
        ));
    }

    fields
        .iter()
        .zip(values)
        .try_for_each(|(field, value)| field.validate_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Kind;

    fn balances() -> ObjectType {
        ObjectType::new(
            "balances",
            vec![
                Field::new("address", Kind::Address),
                Field::new("denom", Kind::String).with_max_length(128),
            ],
            vec![Field::new("amount", Kind::IntegerString)],
        )
    }

    #[test]
    fn test_valid_object_type() {
        assert!(balances().validate().is_ok());
    }

    #[test]
    fn test_rejects_float_key() {
        let t = ObjectType::new("prices", vec![Field::new("p", Kind::Float64)], vec![]);
        assert!(matches!(t.validate(), Err(SchemaError::InvalidKeyKind { .. })));

        let j = ObjectType::new("docs", vec![Field::new("doc", Kind::Json)], vec![]);
        assert!(matches!(j.validate(), Err(SchemaError::InvalidKeyKind { .. })));
    }

    #[test]
    fn test_rejects_duplicate_field_names() {
        let t = ObjectType::new(
            "dup",
            vec![Field::new("id", Kind::Uint64)],
            vec![Field::new("id", Kind::String)],
        );
        assert!(matches!(t.validate(), Err(SchemaError::DuplicateName { .. })));
    }

    #[test]
    fn test_update_validation() {
        let t = balances();
        let key = vec![Value::Bytes(vec![1; 20]), Value::from("uatom")];

        let ok = ObjectUpdate::set("balances", key.clone(), vec![Value::from("100")]);
        assert!(t.validate_object_update(&ok).is_ok());

        let del = ObjectUpdate::delete("balances", key.clone());
        assert!(t.validate_object_update(&del).is_ok());

        let mut bad_del = del.clone();
        bad_del.value = vec![Value::from("1")];
        assert!(t.validate_object_update(&bad_del).is_err());

        let short_key = ObjectUpdate::set("balances", key[..1].to_vec(), vec![Value::from("1")]);
        assert!(t.validate_object_update(&short_key).is_err());

        let bad_amount = ObjectUpdate::set("balances", key, vec![Value::from("1.5")]);
        assert!(t.validate_object_update(&bad_amount).is_err());
    }
}
