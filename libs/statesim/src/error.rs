//! Simulator errors

use appdata::ProtocolError;
use codec::CodecError;
use schema::ValidationError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// The listener or the stream session rejected a step; the run is over
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Update does not match its object type: {0}")]
    Validation(#[from] ValidationError),

    #[error("Key encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Unknown module {0:?}")]
    UnknownModule(String),

    #[error("Module {module:?} has no object type {type_name:?}")]
    UnknownObjectType { module: String, type_name: String },

    #[error("Cannot delete missing object {type_name:?} with key {key}")]
    MissingObject { type_name: String, key: String },

    #[error("Invalid simulator configuration: {0}")]
    InvalidConfig(String),

    /// Rejection sampling could not find enough distinct keys
    #[error("Could only generate {generated} of {requested} distinct updates")]
    KeySpaceExhausted { requested: usize, generated: usize },

    #[error("App schema has no object types to generate updates for")]
    EmptySchema,
}

impl SimError {
    /// True when the failure came from the listener under test
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, SimError::Protocol(e) if e.is_listener_failure())
    }
}

pub type SimResult<T> = std::result::Result<T, SimError>;
