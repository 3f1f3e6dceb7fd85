//! The listener capability trait
//!
//! Every callback defaults to a no-op success, so a listener implements only
//! the steps it cares about. Producers deliver packets through
//! [`Listener::send_packet`], whose default dispatches to the callback for
//! the packet's variant.

use std::fmt::Debug;

use crate::error::ListenerResult;
use crate::packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, Packet, StartBlock,
    StreamCapabilities,
};

/// A consumer of the change-event protocol
///
/// Calls for one listener are strictly sequential and in emission order. An
/// error from any callback is fatal to the block in progress.
pub trait Listener: Send + Debug {
    fn initialize(
        &mut self,
        _capabilities: &StreamCapabilities,
    ) -> ListenerResult<InitializationResult> {
        Ok(InitializationResult::default())
    }

    /// Called once per module before the first block
    fn initialize_module_data(&mut self, _data: &ModuleInitialization) -> ListenerResult<()> {
        Ok(())
    }

    fn start_block(&mut self, _data: &StartBlock) -> ListenerResult<()> {
        Ok(())
    }

    fn on_object_update(&mut self, _data: &ObjectUpdateData) -> ListenerResult<()> {
        Ok(())
    }

    /// Finalizes every packet since the matching `start_block` as one unit
    fn commit(&mut self, _data: &Commit) -> ListenerResult<()> {
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> ListenerResult<()> {
        match packet {
            Packet::Initialization(caps) => self.initialize(caps).map(|_| ()),
            Packet::ModuleInitialization(data) => self.initialize_module_data(data),
            Packet::StartBlock(data) => self.start_block(data),
            Packet::ObjectUpdate(data) => self.on_object_update(data),
            Packet::Commit(data) => self.commit(data),
        }
    }
}

/// Listener that accepts everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl Listener for NoopListener {}

macro_rules! forward_listener {
    ($($target:ty),*) => {
        $(
            impl<L: Listener + ?Sized> Listener for $target {
                fn initialize(
                    &mut self,
                    capabilities: &StreamCapabilities,
                ) -> ListenerResult<InitializationResult> {
                    (**self).initialize(capabilities)
                }

                fn initialize_module_data(&mut self, data: &ModuleInitialization) -> ListenerResult<()> {
                    (**self).initialize_module_data(data)
                }

                fn start_block(&mut self, data: &StartBlock) -> ListenerResult<()> {
                    (**self).start_block(data)
                }

                fn on_object_update(&mut self, data: &ObjectUpdateData) -> ListenerResult<()> {
                    (**self).on_object_update(data)
                }

                fn commit(&mut self, data: &Commit) -> ListenerResult<()> {
                    (**self).commit(data)
                }

                fn send_packet(&mut self, packet: &Packet) -> ListenerResult<()> {
                    (**self).send_packet(packet)
                }
            }
        )*
    };
}

forward_listener!(Box<L>, &mut L);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ListenerError;
    use schema::ObjectUpdate;

    #[derive(Debug, Default)]
    struct UpdateCounter {
        updates: usize,
        commits: usize,
    }

    impl Listener for UpdateCounter {
        fn on_object_update(&mut self, _data: &ObjectUpdateData) -> ListenerResult<()> {
            self.updates += 1;
            Ok(())
        }

        fn commit(&mut self, _data: &Commit) -> ListenerResult<()> {
            self.commits += 1;
            Err(ListenerError::rejected("read only"))
        }
    }

    #[test]
    fn test_default_dispatch() {
        let mut counter = UpdateCounter::default();
        let update = ObjectUpdateData::new("bank", ObjectUpdate::delete("balances", vec![]));

        counter.send_packet(&Packet::StartBlock(StartBlock { height: 1 })).unwrap();
        counter.send_packet(&update.clone().into()).unwrap();
        counter.send_packet(&update.into()).unwrap();
        assert!(counter.send_packet(&Packet::Commit(Commit)).is_err());

        assert_eq!(counter.updates, 2);
        assert_eq!(counter.commits, 1);
    }

    #[test]
    fn test_noop_accepts_everything() {
        let mut listener: Box<dyn Listener> = Box::new(NoopListener);
        let result = listener.initialize(&StreamCapabilities::default()).unwrap();
        assert_eq!(result.start_from_block, None);
        assert!(listener.send_packet(&Packet::Commit(Commit)).is_ok());
    }
}
