//! Fan-out to several listeners
//!
//! Each child sees the same packet sequence, in registration order. The
//! first child error stops delivery of that packet; later children do not
//! see it, and the error is returned to the producer.

use tracing::debug;

use crate::error::{ListenerError, ListenerResult};
use crate::listener::Listener;
use crate::packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, Packet, StartBlock,
    StreamCapabilities,
};

#[derive(Debug, Default)]
pub struct CompositeListener {
    children: Vec<(String, Box<dyn Listener>)>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, name: impl Into<String>, listener: impl Listener + 'static) -> Self {
        self.add(name, listener);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, listener: impl Listener + 'static) {
        self.children.push((name.into(), Box::new(listener)));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn each(
        &mut self,
        mut f: impl FnMut(&mut dyn Listener) -> ListenerResult<()>,
    ) -> ListenerResult<()> {
        for (name, child) in &mut self.children {
            f(child.as_mut()).map_err(|e| {
                debug!(listener = %name, error = %e, "Child listener failed");
                match e {
                    ListenerError::Rejected(reason) => {
                        ListenerError::Rejected(format!("{name}: {reason}"))
                    }
                    other => other,
                }
            })?;
        }
        Ok(())
    }
}

impl Listener for CompositeListener {
    /// Resumes from the lowest height any child asked for
    fn initialize(
        &mut self,
        capabilities: &StreamCapabilities,
    ) -> ListenerResult<InitializationResult> {
        let mut start_from_block: Option<u64> = None;
        self.each(|child| {
            if let Some(h) = child.initialize(capabilities)?.start_from_block {
                start_from_block = Some(start_from_block.map_or(h, |cur| cur.min(h)));
            }
            Ok(())
        })?;
        Ok(InitializationResult { start_from_block })
    }

    fn initialize_module_data(&mut self, data: &ModuleInitialization) -> ListenerResult<()> {
        self.each(|child| child.initialize_module_data(data))
    }

    fn start_block(&mut self, data: &StartBlock) -> ListenerResult<()> {
        self.each(|child| child.start_block(data))
    }

    fn on_object_update(&mut self, data: &ObjectUpdateData) -> ListenerResult<()> {
        self.each(|child| child.on_object_update(data))
    }

    fn commit(&mut self, data: &Commit) -> ListenerResult<()> {
        self.each(|child| child.commit(data))
    }

    fn send_packet(&mut self, packet: &Packet) -> ListenerResult<()> {
        self.each(|child| child.send_packet(packet))
    }
}
