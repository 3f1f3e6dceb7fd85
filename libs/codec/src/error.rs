//! Codec errors for encoding and decoding field values
//!
//! Every failure is reported synchronously to the caller and never leaves a
//! partially written buffer behind: encoders write into a scratch buffer that
//! is only returned on success. Each variant carries the context needed to
//! locate the failing field.

use schema::{Kind, ValidationError};
use thiserror::Error;

/// Encoding and decoding errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Value failed kind or field validation before encoding
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Buffer ended before the declared data
    #[error("Truncated input: need {need} bytes, got {got} (context: {context})")]
    Truncated {
        need: usize,
        got: usize,
        context: String,
    },

    /// Bytes left over after the last field was decoded
    #[error("Trailing bytes: {remaining} unread after decoding {context}")]
    TrailingBytes { remaining: usize, context: String },

    /// Kind has no encoding in the requested form
    #[error("Kind {kind} has no {form} encoding")]
    Unsupported { kind: Kind, form: &'static str },

    /// Value cannot be represented in the target form
    #[error("Value out of range for {kind}: {reason}")]
    OutOfRange { kind: Kind, reason: String },

    /// Variable-length data longer than its length prefix can describe
    #[error("Length {len} does not fit a {width}-byte length prefix (field: {field})")]
    LengthOverflow {
        len: usize,
        width: usize,
        field: String,
    },

    /// JSON input has the wrong shape or content for the kind
    #[error("Invalid JSON for {kind}: {reason}")]
    InvalidJson { kind: Kind, reason: String },

    /// Decoded bytes do not form a valid value of the kind
    #[error("Invalid encoding for {kind} at offset {offset}: {reason}")]
    InvalidEncoding {
        kind: Kind,
        offset: usize,
        reason: String,
    },

    /// Number of values does not match the number of fields
    #[error("Expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },
}

impl CodecError {
    pub fn truncated(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::Truncated {
            need,
            got,
            context: context.into(),
        }
    }

    pub fn out_of_range(kind: Kind, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            kind,
            reason: reason.into(),
        }
    }

    pub fn invalid_json(kind: Kind, reason: impl Into<String>) -> Self {
        Self::InvalidJson {
            kind,
            reason: reason.into(),
        }
    }

    pub fn invalid_encoding(kind: Kind, offset: usize, reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            kind,
            offset,
            reason: reason.into(),
        }
    }

    /// True when the input was well formed but the value itself was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, CodecError::Validation(_))
    }
}

/// Result type for codec operations
pub type CodecResult<T> = std::result::Result<T, CodecError>;
