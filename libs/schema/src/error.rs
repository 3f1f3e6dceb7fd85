//! Validation and schema-definition errors
//!
//! Two families live here. [`ValidationError`] reports a value or kind
//! identifier that does not conform to its declared type or format; it is
//! local and non-fatal. [`SchemaError`] reports a malformed schema
//! definition (bad names, duplicate fields, non-key kinds in key position).

use thiserror::Error;

use crate::kind::{Kind, MAX_VALID_KIND};

/// Longest value excerpt carried inside a format error message
const MAX_EXCERPT_LEN: usize = 64;

/// Value and kind validation errors
///
/// Each variant names one failure class so callers can branch on the class
/// instead of matching message text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Kind identifier is 0 or above the highest implemented kind
    #[error("invalid kind identifier {id}: {reason}")]
    InvalidKind { id: u8, reason: &'static str },

    /// Kind name has no registered identifier
    #[error("unknown kind name {0:?}")]
    UnknownKindName(String),

    /// Native representation does not match the kind
    #[error("expected {expected} for kind {kind}, got {got}")]
    TypeMismatch {
        kind: Kind,
        expected: &'static str,
        got: &'static str,
    },

    /// Native representation is right but the content is malformed
    #[error("invalid {kind} value {value:?}: {reason}")]
    InvalidFormat {
        kind: Kind,
        value: String,
        reason: String,
    },

    /// Value violates a field-level constraint (length, enum membership)
    #[error("field {field:?}: {reason}")]
    FieldConstraint { field: String, reason: String },

    /// A kind-level failure of one field's value, with the field name
    #[error("field {field:?}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<ValidationError>,
    },

    /// Object update does not match its object type
    #[error("object update for {type_name:?}: {reason}")]
    UpdateMismatch { type_name: String, reason: String },
}

impl ValidationError {
    /// Kind identifier 0 is reserved
    pub fn reserved_kind() -> Self {
        Self::InvalidKind {
            id: 0,
            reason: "identifier 0 is reserved as invalid",
        }
    }

    /// Kind identifier above [`MAX_VALID_KIND`]
    pub fn unimplemented_kind(id: u8) -> Self {
        debug_assert!(id > MAX_VALID_KIND as u8);
        Self::InvalidKind {
            id,
            reason: "exceeds the highest implemented kind",
        }
    }

    /// Create a format error, truncating long values in the message
    pub fn invalid_format(kind: Kind, value: impl AsRef<str>, reason: impl Into<String>) -> Self {
        let value = value.as_ref();
        let value = match value.char_indices().nth(MAX_EXCERPT_LEN) {
            Some((idx, _)) => format!("{}...", &value[..idx]),
            None => value.to_string(),
        };
        Self::InvalidFormat {
            kind,
            value,
            reason: reason.into(),
        }
    }

    pub fn field_constraint(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FieldConstraint {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Attribute `source` to the field named `field`
    pub fn in_field(field: impl Into<String>, source: ValidationError) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// The underlying failure with any field attribution peeled off
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn update_mismatch(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpdateMismatch {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// True for errors about the kind identifier itself rather than a value
    pub fn is_kind_error(&self) -> bool {
        matches!(
            self,
            ValidationError::InvalidKind { .. } | ValidationError::UnknownKindName(_)
        )
    }
}

/// Schema definition errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid {what} name {name:?}: must match {pattern}")]
    InvalidName {
        what: &'static str,
        name: String,
        pattern: &'static str,
    },

    #[error("duplicate {what} name {name:?}")]
    DuplicateName { what: &'static str, name: String },

    #[error("field {field:?}: {source}")]
    InvalidFieldKind {
        field: String,
        #[source]
        source: ValidationError,
    },

    #[error("key field {field:?} has kind {kind} which cannot be used in a key")]
    InvalidKeyKind { field: String, kind: Kind },

    #[error("field {field:?} has kind enum but no enum type")]
    MissingEnumType { field: String },

    #[error("field {field:?} has kind {kind} but declares an enum type")]
    UnexpectedEnumType { field: String, kind: Kind },

    #[error("enum type {name:?}: {reason}")]
    InvalidEnumType { name: String, reason: String },

    #[error("enum type {name:?} is defined more than once with different values")]
    ConflictingEnumType { name: String },
}

impl SchemaError {
    pub fn invalid_enum(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnumType {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for value validation
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type for schema definition checks
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_truncates_long_values() {
        let long = "9".repeat(200);
        let err = ValidationError::invalid_format(Kind::IntegerString, &long, "too many digits");
        match err {
            ValidationError::InvalidFormat { value, .. } => {
                assert!(value.ends_with("..."));
                assert_eq!(value.len(), MAX_EXCERPT_LEN + 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_kind_error_classification() {
        assert!(ValidationError::reserved_kind().is_kind_error());
        assert!(ValidationError::UnknownKindName("nope".into()).is_kind_error());
        assert!(!ValidationError::field_constraint("f", "too long").is_kind_error());
    }
}
