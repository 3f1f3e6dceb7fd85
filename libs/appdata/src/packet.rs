//! Packets of the change-event protocol
//!
//! A stream opens with one [`StreamCapabilities`] packet and one
//! [`ModuleInitialization`] per module, followed by blocks:
//!
//! ```text
//! StartBlock(h) → ObjectUpdate* → Commit
//! ```

use std::fmt;

use schema::{ModuleSchema, ObjectUpdate};

/// Stream-level properties announced once before any module data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamCapabilities {
    /// Every state mutation is paired with a packet describing it
    pub has_event_aligned_writes: bool,
}

/// Returned by a listener from `initialize`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitializationResult {
    /// Height the listener has already processed up to, if it is resuming
    pub start_from_block: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInitialization {
    pub module_name: String,
    pub schema: ModuleSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartBlock {
    pub height: u64,
}

/// One object update tagged with the module it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpdateData {
    pub module_name: String,
    pub update: ObjectUpdate,
}

impl ObjectUpdateData {
    pub fn new(module_name: impl Into<String>, update: ObjectUpdate) -> Self {
        Self {
            module_name: module_name.into(),
            update,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Initialization(StreamCapabilities),
    ModuleInitialization(ModuleInitialization),
    StartBlock(StartBlock),
    ObjectUpdate(ObjectUpdateData),
    Commit(Commit),
}

impl Packet {
    pub fn stage(&self) -> Stage {
        match self {
            Packet::Initialization(_) => Stage::Initialize,
            Packet::ModuleInitialization(_) => Stage::InitializeModule,
            Packet::StartBlock(_) => Stage::StartBlock,
            Packet::ObjectUpdate(_) => Stage::ObjectUpdate,
            Packet::Commit(_) => Stage::Commit,
        }
    }

    pub fn as_object_update(&self) -> Option<&ObjectUpdateData> {
        match self {
            Packet::ObjectUpdate(data) => Some(data),
            _ => None,
        }
    }
}

impl From<ObjectUpdateData> for Packet {
    fn from(data: ObjectUpdateData) -> Self {
        Packet::ObjectUpdate(data)
    }
}

impl From<StartBlock> for Packet {
    fn from(data: StartBlock) -> Self {
        Packet::StartBlock(data)
    }
}

/// Protocol step a packet belongs to, used in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Initialize,
    InitializeModule,
    StartBlock,
    ObjectUpdate,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Initialize => "initialize",
            Stage::InitializeModule => "initialize module",
            Stage::StartBlock => "start block",
            Stage::ObjectUpdate => "object update",
            Stage::Commit => "commit",
        })
    }
}
