//! Example application schema exercising every kind
//!
//! `all_kinds` has one object type per kind named `test_<kind>`. Kinds that
//! can key an object appear in both key and value position; floats and JSON
//! are keyed by an `int32` instead. `test_cases` covers the structural
//! shapes: singletons, composite keys, key-only objects, long value tuples,
//! retained deletions and enum keys.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use schema::{EnumType, Field, Kind, ModuleSchema, ObjectType, SchemaResult};

pub const ALL_KINDS_MODULE: &str = "all_kinds";
pub const TEST_CASES_MODULE: &str = "test_cases";

/// Built once; the definitions below are static and known to validate
pub static EXAMPLE_APP_SCHEMA: Lazy<BTreeMap<String, ModuleSchema>> =
    Lazy::new(|| build_example_app_schema().expect("example app schema is valid"));

pub fn example_app_schema() -> BTreeMap<String, ModuleSchema> {
    EXAMPLE_APP_SCHEMA.clone()
}

fn build_example_app_schema() -> SchemaResult<BTreeMap<String, ModuleSchema>> {
    Ok(BTreeMap::from([
        (ALL_KINDS_MODULE.to_string(), all_kinds_module()?),
        (TEST_CASES_MODULE.to_string(), test_cases_module()?),
    ]))
}

fn test_enum() -> EnumType {
    EnumType::sequential("test_enum_type", ["foo", "bar", "baz"])
}

fn small_enum() -> EnumType {
    EnumType::sequential("color", ["red", "green", "blue"]).with_numeric_kind(Kind::Uint8)
}

fn field(name: &str, kind: Kind) -> Field {
    match kind {
        Kind::Enum => Field::enumeration(name, test_enum()),
        kind => Field::new(name, kind),
    }
}

fn all_kinds_module() -> SchemaResult<ModuleSchema> {
    let object_types = Kind::ALL
        .into_iter()
        .map(|kind| {
            let key = if kind.is_valid_key_kind() {
                field("key", kind)
            } else {
                Field::new("key", Kind::Int32)
            };
            ObjectType::new(
                format!("test_{kind}"),
                vec![key],
                vec![field("value", kind), field("other", kind)],
            )
        })
        .collect();
    ModuleSchema::new(object_types)
}

fn test_cases_module() -> SchemaResult<ModuleSchema> {
    ModuleSchema::new(vec![
        ObjectType::new(
            "singleton",
            vec![],
            vec![Field::new("value", Kind::String), Field::new("count", Kind::Int32)],
        ),
        ObjectType::new(
            "simple",
            vec![Field::new("key", Kind::String).with_max_length(32)],
            vec![Field::new("value1", Kind::Int32), Field::new("value2", Kind::Bytes)],
        ),
        ObjectType::new(
            "two_keys",
            vec![Field::new("key1", Kind::String), Field::new("key2", Kind::Int32)],
            vec![],
        ),
        ObjectType::new(
            "three_keys",
            vec![
                Field::new("key1", Kind::Address),
                Field::new("key2", Kind::Time),
                Field::new("key3", Kind::Bytes).with_max_length(8),
            ],
            vec![Field::new("value1", Kind::DecimalString)],
        ),
        ObjectType::new(
            "many_values",
            vec![Field::new("key", Kind::Uint64)],
            vec![
                Field::new("value1", Kind::String).with_max_length(16),
                Field::new("value2", Kind::Bytes),
                Field::new("value3", Kind::Float64),
                Field::new("value4", Kind::Uint32),
                Field::new("value5", Kind::Duration),
                Field::new("value6", Kind::IntegerString),
                Field::new("value7", Kind::Json),
            ],
        ),
        ObjectType::new(
            "retain_deletions",
            vec![Field::new("key", Kind::Int64)],
            vec![Field::new("value", Kind::Bool)],
        )
        .with_retain_deletions(true),
        ObjectType::new(
            "colors",
            vec![Field::enumeration("color", small_enum()), Field::new("shade", Kind::Uint8)],
            vec![Field::enumeration("favorite", test_enum())],
        ),
    ])
}
