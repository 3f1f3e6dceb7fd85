//! Bridge from the synchronous listener interface to an async consumer
//!
//! [`ChannelListener`] clones each packet into an unbounded `tokio` channel.
//! The receiving task processes at its own pace; the producer never blocks.
//! Once the receiver is dropped every callback fails with
//! [`ListenerError::ChannelClosed`].

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::error::{ListenerError, ListenerResult};
use crate::listener::Listener;
use crate::packet::Packet;

#[derive(Debug, Clone)]
pub struct ChannelListener {
    sender: UnboundedSender<Packet>,
}

impl ChannelListener {
    pub fn new() -> (Self, UnboundedReceiver<Packet>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Listener for ChannelListener {
    fn send_packet(&mut self, packet: &Packet) -> ListenerResult<()> {
        trace!(stage = %packet.stage(), "Forwarding packet to channel");
        self.sender
            .send(packet.clone())
            .map_err(|_| ListenerError::ChannelClosed)
    }
}
