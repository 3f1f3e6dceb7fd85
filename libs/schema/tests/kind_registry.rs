//! # Kind Registry Integration Tests
//!
//! Exhaustive checks over the whole identifier space plus schema-level
//! validation through the public API.

use proptest::prelude::*;
use schema::{
    EnumType, Field, Kind, ModuleSchema, ObjectType, ObjectUpdate, ValidationError, Value,
    MAX_VALID_KIND,
};

proptest! {
    #[test]
    fn identifier_space_is_partitioned(id in any::<u8>()) {
        let implemented = id >= 1 && id <= MAX_VALID_KIND.id();
        prop_assert_eq!(Kind::validate_id(id).is_ok(), implemented);

        match Kind::from_id(id) {
            Ok(kind) => {
                prop_assert!(implemented);
                prop_assert_eq!(Kind::parse(&Kind::name_of(id)).unwrap(), kind);
            }
            Err(err) => {
                prop_assert!(!implemented);
                prop_assert!(matches!(err, ValidationError::InvalidKind { .. }), "expected InvalidKind, got {:?}", err);
                prop_assert_eq!(Kind::name_of(id), format!("invalid({id})"));
            }
        }
    }

    #[test]
    fn integer_strings_validate_by_grammar(digits in "[0-9]{1,100}", negative in any::<bool>()) {
        let s = if negative { format!("-{digits}") } else { digits };
        prop_assert!(Kind::IntegerString.validate_value(&Value::String(s)).is_ok());
    }
}

#[test]
fn test_names_are_unique_and_lowercase() {
    let mut names: Vec<_> = Kind::ALL.iter().map(|k| k.as_str()).collect();
    assert!(names.iter().all(|n| n.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())));
    names.sort();
    names.dedup();
    assert_eq!(names.len(), Kind::ALL.len());
}

#[test]
fn test_module_schema_end_to_end() {
    let vote = EnumType::sequential("vote_option", ["yes", "no", "abstain", "veto"]);
    let schema = ModuleSchema::new(vec![
        ObjectType::new(
            "votes",
            vec![
                Field::new("proposal_id", Kind::Uint64),
                Field::new("voter", Kind::Address),
            ],
            vec![
                Field::enumeration("option", vote),
                Field::new("weight", Kind::DecimalString),
            ],
        ),
        ObjectType::new("params", vec![], vec![Field::new("config", Kind::Json)]),
    ])
    .unwrap();

    let update = ObjectUpdate::set(
        "votes",
        vec![Value::Uint64(7), Value::Bytes(vec![0xaa; 20])],
        vec![Value::from("yes"), Value::from("0.5")],
    );
    assert!(schema.validate_object_update(&update).is_ok());

    let bad_option = ObjectUpdate::set(
        "votes",
        vec![Value::Uint64(7), Value::Bytes(vec![0xaa; 20])],
        vec![Value::from("maybe"), Value::from("0.5")],
    );
    assert!(matches!(
        schema.validate_object_update(&bad_option),
        Err(ValidationError::FieldConstraint { .. })
    ));

    let singleton = ObjectUpdate::set("params", vec![], vec![Value::json(r#"{"max":10}"#)]);
    assert!(schema.validate_object_update(&singleton).is_ok());
}
