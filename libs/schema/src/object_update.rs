//! Object updates: one entity's change within a block

use crate::value::Value;

/// Insert, replace or delete of a single object
///
/// `key` holds one value per key field in declared order. `value` holds one
/// value per value field and is empty for deletions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpdate {
    pub type_name: String,
    pub key: Vec<Value>,
    pub value: Vec<Value>,
    pub delete: bool,
}

impl ObjectUpdate {
    /// Insert or replace the object at `key`
    pub fn set(type_name: impl Into<String>, key: Vec<Value>, value: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            key,
            value,
            delete: false,
        }
    }

    pub fn delete(type_name: impl Into<String>, key: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            key,
            value: Vec::new(),
            delete: true,
        }
    }
}
