//! Reference state model
//!
//! ```text
//! AppState ─┬─ ModuleState ─┬─ ObjectCollection  (encoded key → entry)
//!           │               └─ ObjectCollection
//!           └─ ModuleState ── ...
//! ```
//!
//! Collections are ordered by the key encoding, so iteration order follows
//! the ordered-key property of the codec and is identical across runs.

use std::collections::BTreeMap;

use codec::encode_object_key;
use rand::Rng;
use schema::{ModuleSchema, ObjectType, ObjectUpdate, Value};
use tracing::trace;

use crate::error::{SimError, SimResult};

/// One stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: Vec<Value>,
    pub value: Vec<Value>,
}

/// Every live object of one object type
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCollection {
    object_type: ObjectType,
    objects: BTreeMap<Vec<u8>, ObjectEntry>,
}

impl ObjectCollection {
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            object_type,
            objects: BTreeMap::new(),
        }
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    /// Validate `update` and apply it as an insert, replace or removal
    pub fn apply_update(&mut self, update: &ObjectUpdate) -> SimResult<()> {
        self.object_type.validate_object_update(update)?;
        let encoded = encode_object_key(&self.object_type, &update.key)?;

        if update.delete {
            if self.objects.remove(&encoded).is_none() {
                return Err(SimError::MissingObject {
                    type_name: self.object_type.name.clone(),
                    key: render_key(&update.key),
                });
            }
            trace!(object_type = %self.object_type.name, "Object removed");
            return Ok(());
        }

        self.objects.insert(
            encoded,
            ObjectEntry {
                key: update.key.clone(),
                value: update.value.clone(),
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &[Value]) -> SimResult<Option<&ObjectEntry>> {
        let encoded = encode_object_key(&self.object_type, key)?;
        Ok(self.objects.get(&encoded))
    }

    /// Objects in key order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Uniformly chosen key of a live object
    pub fn random_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[Value]> {
        if self.objects.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.objects.len());
        self.objects.values().nth(index).map(|entry| entry.key.as_slice())
    }
}

/// Collections for every object type of one module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleState {
    schema: ModuleSchema,
    collections: BTreeMap<String, ObjectCollection>,
}

impl ModuleState {
    pub fn new(schema: ModuleSchema) -> Self {
        let collections = schema
            .object_types()
            .map(|t| (t.name.clone(), ObjectCollection::new(t.clone())))
            .collect();
        Self { schema, collections }
    }

    pub fn schema(&self) -> &ModuleSchema {
        &self.schema
    }

    pub fn apply_update(&mut self, update: &ObjectUpdate) -> SimResult<()> {
        self.collections
            .get_mut(&update.type_name)
            .ok_or_else(|| SimError::UnknownObjectType {
                module: String::new(),
                type_name: update.type_name.clone(),
            })?
            .apply_update(update)
    }

    pub fn collection(&self, type_name: &str) -> Option<&ObjectCollection> {
        self.collections.get(type_name)
    }

    pub fn collections(&self) -> impl Iterator<Item = &ObjectCollection> {
        self.collections.values()
    }

    pub fn object_count(&self) -> usize {
        self.collections.values().map(ObjectCollection::len).sum()
    }
}

/// State of a whole application, one [`ModuleState`] per module
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    modules: BTreeMap<String, ModuleState>,
}

impl AppState {
    pub fn new(app_schema: BTreeMap<String, ModuleSchema>) -> Self {
        let modules = app_schema
            .into_iter()
            .map(|(name, schema)| (name, ModuleState::new(schema)))
            .collect();
        Self { modules }
    }

    pub fn apply_update(&mut self, module_name: &str, update: &ObjectUpdate) -> SimResult<()> {
        let module = self
            .modules
            .get_mut(module_name)
            .ok_or_else(|| SimError::UnknownModule(module_name.to_string()))?;
        module.apply_update(update).map_err(|e| match e {
            SimError::UnknownObjectType { type_name, .. } => SimError::UnknownObjectType {
                module: module_name.to_string(),
                type_name,
            },
            other => other,
        })
    }

    /// Binary key of `update`; equal keys in different spellings share it
    pub fn encoded_key(&self, module_name: &str, update: &ObjectUpdate) -> SimResult<Vec<u8>> {
        let collection = self
            .module(module_name)
            .ok_or_else(|| SimError::UnknownModule(module_name.to_string()))?
            .collection(&update.type_name)
            .ok_or_else(|| SimError::UnknownObjectType {
                module: module_name.to_string(),
                type_name: update.type_name.clone(),
            })?;
        Ok(encode_object_key(collection.object_type(), &update.key)?)
    }

    pub fn module(&self, name: &str) -> Option<&ModuleState> {
        self.modules.get(name)
    }

    /// Modules in name order
    pub fn modules(&self) -> impl Iterator<Item = (&str, &ModuleState)> {
        self.modules.iter().map(|(name, state)| (name.as_str(), state))
    }

    /// Module schemas in name order
    pub fn module_schemas(&self) -> impl Iterator<Item = (&str, &ModuleSchema)> {
        self.modules()
            .map(|(name, state)| (name, state.schema()))
    }

    pub fn object_count(&self) -> usize {
        self.modules.values().map(ModuleState::object_count).sum()
    }
}

pub(crate) fn render_key(key: &[Value]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
