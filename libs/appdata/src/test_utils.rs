//! Listener doubles for tests
//!
//! [`CollectorListener`] records every packet it is handed;
//! [`FailingListener`] records the same way but returns an error at a chosen
//! point in the stream.

use schema::{Field, Kind, ModuleSchema, ObjectType};

use crate::error::{ListenerError, ListenerResult};
use crate::listener::Listener;
use crate::packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, Packet, StartBlock,
    StreamCapabilities,
};

/// Records packets in delivery order
#[derive(Debug, Default, Clone)]
pub struct CollectorListener {
    packets: Vec<Packet>,
    start_from_block: Option<u64>,
}

impl CollectorListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the producer to resume after `height`
    pub fn resuming_from(height: u64) -> Self {
        Self {
            start_from_block: Some(height),
            ..Self::default()
        }
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn updates(&self) -> Vec<&ObjectUpdateData> {
        self.packets
            .iter()
            .filter_map(Packet::as_object_update)
            .collect()
    }

    /// Heights of every block that reached `commit`
    pub fn committed_heights(&self) -> Vec<u64> {
        let mut open = None;
        let mut heights = Vec::new();
        for packet in &self.packets {
            match packet {
                Packet::StartBlock(data) => open = Some(data.height),
                Packet::Commit(_) => heights.extend(open.take()),
                _ => {}
            }
        }
        heights
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}

impl Listener for CollectorListener {
    fn initialize(
        &mut self,
        capabilities: &StreamCapabilities,
    ) -> ListenerResult<InitializationResult> {
        self.packets.push(Packet::Initialization(*capabilities));
        Ok(InitializationResult {
            start_from_block: self.start_from_block,
        })
    }

    fn initialize_module_data(&mut self, data: &ModuleInitialization) -> ListenerResult<()> {
        self.packets.push(Packet::ModuleInitialization(data.clone()));
        Ok(())
    }

    fn start_block(&mut self, data: &StartBlock) -> ListenerResult<()> {
        self.packets.push(Packet::StartBlock(*data));
        Ok(())
    }

    fn on_object_update(&mut self, data: &ObjectUpdateData) -> ListenerResult<()> {
        self.packets.push(Packet::ObjectUpdate(data.clone()));
        Ok(())
    }

    fn commit(&mut self, data: &Commit) -> ListenerResult<()> {
        self.packets.push(Packet::Commit(*data));
        Ok(())
    }
}

/// Collects packets until a configured failure point
#[derive(Debug, Default, Clone)]
pub struct FailingListener {
    collector: CollectorListener,
    fail_on_update: Option<usize>,
    fail_on_commit: bool,
    updates_seen: usize,
}

impl FailingListener {
    /// Fail the `n`th object update of the session, counting from 1
    pub fn on_update(n: usize) -> Self {
        Self {
            fail_on_update: Some(n),
            ..Self::default()
        }
    }

    pub fn on_commit() -> Self {
        Self {
            fail_on_commit: true,
            ..Self::default()
        }
    }

    /// Packets accepted before the failure
    pub fn collector(&self) -> &CollectorListener {
        &self.collector
    }

    pub fn updates_seen(&self) -> usize {
        self.updates_seen
    }
}

impl Listener for FailingListener {
    fn initialize(
        &mut self,
        capabilities: &StreamCapabilities,
    ) -> ListenerResult<InitializationResult> {
        self.collector.initialize(capabilities)
    }

    fn initialize_module_data(&mut self, data: &ModuleInitialization) -> ListenerResult<()> {
        self.collector.initialize_module_data(data)
    }

    fn start_block(&mut self, data: &StartBlock) -> ListenerResult<()> {
        self.collector.start_block(data)
    }

    fn on_object_update(&mut self, data: &ObjectUpdateData) -> ListenerResult<()> {
        self.updates_seen += 1;
        if self.fail_on_update == Some(self.updates_seen) {
            return Err(ListenerError::rejected(format!(
                "simulated failure on update {}",
                self.updates_seen
            )));
        }
        self.collector.on_object_update(data)
    }

    fn commit(&mut self, data: &Commit) -> ListenerResult<()> {
        if self.fail_on_commit {
            return Err(ListenerError::rejected("simulated failure on commit"));
        }
        self.collector.commit(data)
    }
}

/// One-type module used across tests: `balances` keyed by address
pub fn bank_schema() -> ModuleSchema {
    ModuleSchema::new(vec![ObjectType::new(
        "balances",
        vec![Field::new("address", Kind::Address)],
        vec![Field::new("amount", Kind::IntegerString)],
    )])
    .expect("bank schema is valid")
}
