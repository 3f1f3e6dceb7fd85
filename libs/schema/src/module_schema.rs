//! Module schemas: the object types one module exposes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::enum_type::EnumType;
use crate::error::{SchemaError, SchemaResult, ValidationError, ValidationResult};
use crate::object_type::ObjectType;
use crate::object_update::ObjectUpdate;

/// Object types of one module, kept sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ModuleSchemaDef")]
pub struct ModuleSchema {
    object_types: Vec<ObjectType>,
}

/// Unchecked wire form; deserializing goes through [`ModuleSchema::new`]
#[derive(Deserialize)]
struct ModuleSchemaDef {
    object_types: Vec<ObjectType>,
}

impl TryFrom<ModuleSchemaDef> for ModuleSchema {
    type Error = SchemaError;

    fn try_from(def: ModuleSchemaDef) -> Result<Self, Self::Error> {
        ModuleSchema::new(def.object_types)
    }
}

impl ModuleSchema {
    /// Sort, then validate every object type and the shared enum types
    pub fn new(mut object_types: Vec<ObjectType>) -> SchemaResult<Self> {
        object_types.sort_by(|a, b| a.name.cmp(&b.name));
        let schema = Self { object_types };
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> SchemaResult<()> {
        for pair in self.object_types.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(SchemaError::DuplicateName {
                    what: "object type",
                    name: pair[0].name.clone(),
                });
            }
        }

        let mut enums: HashMap<&str, &EnumType> = HashMap::new();
        for object_type in &self.object_types {
            object_type.validate()?;
            for enum_type in object_type.fields().filter_map(|f| f.enum_type.as_ref()) {
                match enums.get(enum_type.name.as_str()) {
                    Some(existing) if *existing != enum_type => {
                        return Err(SchemaError::ConflictingEnumType {
                            name: enum_type.name.clone(),
                        })
                    }
                    Some(_) => {}
                    None => {
                        enums.insert(&enum_type.name, enum_type);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn lookup_object_type(&self, name: &str) -> Option<&ObjectType> {
        self.object_types
            .binary_search_by(|t| t.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.object_types[idx])
    }

    /// Object types in name order
    pub fn object_types(&self) -> impl Iterator<Item = &ObjectType> {
        self.object_types.iter()
    }

    pub fn len(&self) -> usize {
        self.object_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_types.is_empty()
    }

    /// Distinct enum types referenced by any field
    pub fn enum_types(&self) -> Vec<&EnumType> {
        let mut seen: Vec<&EnumType> = Vec::new();
        for enum_type in self
            .object_types
            .iter()
            .flat_map(|t| t.fields())
            .filter_map(|f| f.enum_type.as_ref())
        {
            if !seen.iter().any(|e| e.name == enum_type.name) {
                seen.push(enum_type);
            }
        }
        seen
    }

    /// Resolve the update's object type and validate against it
    pub fn validate_object_update(&self, update: &ObjectUpdate) -> ValidationResult<()> {
        let object_type = self.lookup_object_type(&update.type_name).ok_or_else(|| {
            ValidationError::update_mismatch(&update.type_name, "unknown object type")
        })?;
        object_type.validate_object_update(update)
    }
}
