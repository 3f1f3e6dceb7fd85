//! Protocol and listener errors
//!
//! [`ListenerError`] is what a listener returns; [`ProtocolError`] is what
//! the producer side sees. A listener failure is always fatal to the block in
//! progress and surfaces as [`ProtocolError::ListenerRejected`]. The other
//! variants are producer mistakes caught before anything is emitted.

use codec::CodecError;
use schema::ValidationError;
use thiserror::Error;

use crate::packet::Stage;
use crate::session::SessionState;

/// Errors returned by listener callbacks
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("Listener rejected packet: {0}")]
    Rejected(String),

    #[error("Listener channel closed")]
    ChannelClosed,

    #[error("Encoding failed: {0}")]
    Encoding(#[from] CodecError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ListenerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

impl From<std::io::Error> for ListenerError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type ListenerResult<T> = std::result::Result<T, ListenerError>;

/// Errors raised while producing a packet stream
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A listener callback failed; the session cannot continue
    #[error("Listener failed during {stage}: {source}")]
    ListenerRejected {
        stage: Stage,
        #[source]
        source: ListenerError,
    },

    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        state: SessionState,
        operation: Stage,
    },

    #[error("Block height {got} does not follow last committed height {previous}")]
    NonIncreasingHeight { previous: u64, got: u64 },

    /// A second update for the same module and key within one block
    #[error("Duplicate update in block for module {module:?}, key {key}")]
    DuplicateKey { module: String, key: String },

    #[error("Module {0:?} was not initialized")]
    UnknownModule(String),

    #[error("Module {0:?} was already initialized")]
    DuplicateModule(String),

    #[error("Invalid update for module {module:?}: {source}")]
    InvalidUpdate {
        module: String,
        #[source]
        source: ValidationError,
    },

    /// The key passed validation but has no binary key encoding
    #[error("Unencodable key for module {module:?}: {source}")]
    UnencodableKey {
        module: String,
        #[source]
        source: CodecError,
    },

    /// The session was poisoned by an earlier listener failure
    #[error("Session failed earlier and accepts no further packets")]
    SessionFailed,
}

impl ProtocolError {
    /// True for failures that came from the listener rather than the producer
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, ProtocolError::ListenerRejected { .. })
    }
}

pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
