//! Producer-side enforcement of the protocol state machine
//!
//! ```text
//! Uninitialized --initialize--> Ready
//! Ready --initialize_module (before the first block)--> Ready
//! Ready --start_block(h)--> InBlock(h)
//! InBlock(h) --send_update*--> InBlock(h)
//! InBlock(h) --commit--> Ready
//! any --listener error or abandon--> Failed
//! ```
//!
//! Producer mistakes (out-of-order calls, non-increasing heights, duplicate
//! keys, updates that do not match the module schema) are rejected before
//! anything reaches the listener and leave the session usable. A listener
//! error poisons the session: the block in progress is abandoned and every
//! later call returns [`ProtocolError::SessionFailed`]. A producer that cannot
//! finish a block it already started streaming poisons the session the same
//! way through [`StreamSession::abandon`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use codec::{encode_object_key, CodecError};
use schema::{ModuleSchema, ObjectUpdate, ValidationError, Value};
use tracing::{debug, error, info, warn};

use crate::error::{ListenerError, ProtocolError, ProtocolResult};
use crate::listener::Listener;
use crate::packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, Packet, Stage,
    StartBlock, StreamCapabilities,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    InBlock(u64),
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => f.write_str("uninitialized"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::InBlock(height) => write!(f, "in block {height}"),
            SessionState::Failed => f.write_str("failed"),
        }
    }
}

/// Drives one listener through a well-formed packet sequence
#[derive(Debug)]
pub struct StreamSession<L: Listener> {
    listener: L,
    state: SessionState,
    modules: HashMap<String, ModuleSchema>,
    last_committed: Option<u64>,
    /// (module, encoded key) of every update delivered in the open block
    block_keys: HashSet<(String, Vec<u8>)>,
    resume_from: Option<u64>,
}

impl<L: Listener> StreamSession<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            state: SessionState::Uninitialized,
            modules: HashMap::new(),
            last_committed: None,
            block_keys: HashSet::new(),
            resume_from: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn last_committed_height(&self) -> Option<u64> {
        self.last_committed
    }

    /// Height the listener asked to resume from during initialization
    pub fn resume_from(&self) -> Option<u64> {
        self.resume_from
    }

    pub fn module_schema(&self, module_name: &str) -> Option<&ModuleSchema> {
        self.modules.get(module_name)
    }

    pub fn initialize(
        &mut self,
        capabilities: StreamCapabilities,
    ) -> ProtocolResult<InitializationResult> {
        self.expect_state(Stage::Initialize, |s| s == SessionState::Uninitialized)?;

        let result = match self.listener.initialize(&capabilities) {
            Ok(result) => result,
            Err(source) => return Err(self.fail(Stage::Initialize, source)),
        };
        info!(
            event_aligned_writes = capabilities.has_event_aligned_writes,
            start_from_block = ?result.start_from_block,
            "Stream initialized"
        );

        self.resume_from = result.start_from_block;
        self.state = SessionState::Ready;
        Ok(result)
    }

    /// Announce one module; only allowed before the first block
    pub fn initialize_module(
        &mut self,
        module_name: impl Into<String>,
        schema: ModuleSchema,
    ) -> ProtocolResult<()> {
        self.expect_state(Stage::InitializeModule, |s| s == SessionState::Ready)?;
        if self.last_committed.is_some() {
            return Err(self.reject(ProtocolError::InvalidTransition {
                state: self.state,
                operation: Stage::InitializeModule,
            }));
        }

        let module_name = module_name.into();
        if self.modules.contains_key(&module_name) {
            return Err(self.reject(ProtocolError::DuplicateModule(module_name)));
        }

        let packet = Packet::ModuleInitialization(ModuleInitialization {
            module_name: module_name.clone(),
            schema,
        });
        self.deliver(&packet)?;

        if let Packet::ModuleInitialization(data) = packet {
            debug!(module = %module_name, object_types = data.schema.len(), "Module initialized");
            self.modules.insert(module_name, data.schema);
        }
        Ok(())
    }

    pub fn start_block(&mut self, height: u64) -> ProtocolResult<()> {
        self.expect_state(Stage::StartBlock, |s| s == SessionState::Ready)?;
        if let Some(previous) = self.last_committed.filter(|previous| height <= *previous) {
            return Err(self.reject(ProtocolError::NonIncreasingHeight {
                previous,
                got: height,
            }));
        }

        self.deliver(&Packet::StartBlock(StartBlock { height }))?;
        self.block_keys.clear();
        self.state = SessionState::InBlock(height);
        debug!(height, "Block started");
        Ok(())
    }

    /// Validate and emit one update inside the open block
    pub fn send_update(
        &mut self,
        module_name: impl Into<String>,
        update: ObjectUpdate,
    ) -> ProtocolResult<()> {
        self.send_update_data(ObjectUpdateData::new(module_name, update))
    }

    pub fn send_update_data(&mut self, data: ObjectUpdateData) -> ProtocolResult<()> {
        self.expect_state(Stage::ObjectUpdate, |s| matches!(s, SessionState::InBlock(_)))?;

        let key_bytes = match self.encoded_key(&data) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.reject(e)),
        };

        let identity = (data.module_name.clone(), key_bytes);
        if self.block_keys.contains(&identity) {
            return Err(self.reject(ProtocolError::DuplicateKey {
                module: data.module_name,
                key: render_key(&data.update.key),
            }));
        }

        let packet = Packet::ObjectUpdate(data);
        self.deliver(&packet)?;
        self.block_keys.insert(identity);
        Ok(())
    }

    pub fn commit(&mut self) -> ProtocolResult<()> {
        self.expect_state(Stage::Commit, |s| matches!(s, SessionState::InBlock(_)))?;
        let SessionState::InBlock(height) = self.state else {
            return Err(ProtocolError::InvalidTransition {
                state: self.state,
                operation: Stage::Commit,
            });
        };

        self.deliver(&Packet::Commit(Commit))?;
        info!(height, updates = self.block_keys.len(), "Block committed");
        self.block_keys.clear();
        self.last_committed = Some(height);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Give up on the session from the producer side
    ///
    /// Used when the producer cannot finish a block it has started streaming.
    /// The session fails exactly as after a listener error; calling this on a
    /// failed session does nothing.
    pub fn abandon(&mut self) {
        if self.state == SessionState::Failed {
            return;
        }
        error!(state = %self.state, "Producer abandoned the session");
        self.state = SessionState::Failed;
        self.block_keys.clear();
    }

    /// Route a packet to the matching operation
    pub fn send_packet(&mut self, packet: Packet) -> ProtocolResult<()> {
        match packet {
            Packet::Initialization(caps) => self.initialize(caps).map(|_| ()),
            Packet::ModuleInitialization(data) => {
                self.initialize_module(data.module_name, data.schema)
            }
            Packet::StartBlock(data) => self.start_block(data.height),
            Packet::ObjectUpdate(data) => self.send_update_data(data),
            Packet::Commit(_) => self.commit(),
        }
    }

    fn expect_state(
        &self,
        operation: Stage,
        allowed: impl Fn(SessionState) -> bool,
    ) -> ProtocolResult<()> {
        if self.state == SessionState::Failed {
            return Err(ProtocolError::SessionFailed);
        }
        if !allowed(self.state) {
            let error = ProtocolError::InvalidTransition {
                state: self.state,
                operation,
            };
            warn!(%error, "Rejected out-of-order protocol call");
            return Err(error);
        }
        Ok(())
    }

    /// Validate the update and encode its key; equal key values in
    /// different spellings (`"1"` and `"01"` as integer strings) share bytes
    fn encoded_key(&self, data: &ObjectUpdateData) -> ProtocolResult<Vec<u8>> {
        let module = &data.module_name;
        let schema = self
            .modules
            .get(module)
            .ok_or_else(|| ProtocolError::UnknownModule(module.clone()))?;
        let invalid = |source| ProtocolError::InvalidUpdate {
            module: module.clone(),
            source,
        };
        schema.validate_object_update(&data.update).map_err(invalid)?;

        let object_type = schema.lookup_object_type(&data.update.type_name).ok_or_else(|| {
            invalid(ValidationError::update_mismatch(&data.update.type_name, "unknown object type"))
        })?;
        encode_object_key(object_type, &data.update.key).map_err(|e| match e {
            CodecError::Validation(source) => invalid(source),
            source => ProtocolError::UnencodableKey {
                module: module.clone(),
                source,
            },
        })
    }

    fn reject(&self, error: ProtocolError) -> ProtocolError {
        warn!(%error, state = %self.state, "Rejected packet before emission");
        error
    }

    fn deliver(&mut self, packet: &Packet) -> ProtocolResult<()> {
        let stage = packet.stage();
        match self.listener.send_packet(packet) {
            Ok(()) => Ok(()),
            Err(source) => Err(self.fail(stage, source)),
        }
    }

    fn fail(&mut self, stage: Stage, source: ListenerError) -> ProtocolError {
        error!(%stage, error = %source, state = %self.state, "Listener failed, abandoning session");
        self.state = SessionState::Failed;
        self.block_keys.clear();
        ProtocolError::ListenerRejected { stage, source }
    }
}

fn render_key(key: &[Value]) -> String {
    let parts: Vec<String> = key.iter().map(Value::to_string).collect();
    format!("[{}]", parts.join(", "))
}
