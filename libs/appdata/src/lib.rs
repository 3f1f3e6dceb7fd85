//! # AppData - Change-Event Protocol
//!
//! ## Purpose
//!
//! Delivers application state changes to listeners as a block-framed packet
//! stream:
//! - **Packets**: initialization, module schemas, block boundaries and
//!   object updates ([`Packet`])
//! - **Listener**: capability trait where every callback is optional
//!   ([`Listener`])
//! - **Session**: producer-side state machine that rejects malformed streams
//!   before they reach a listener ([`StreamSession`])
//! - **Adapters**: fan-out, async channel bridge and JSON lines output
//!
//! ## Architecture Role
//!
//! ```text
//! Producer → [StreamSession] → Listener
//!                 ↓                ↓
//!         order, heights,    CompositeListener → many
//!         duplicate keys     ChannelListener   → tokio task
//!         schema checks      JsonLinesListener → io::Write
//! ```
//!
//! ## Delivery Contract
//!
//! - Calls for one listener are sequential and in emission order
//! - `commit` finalizes every packet since the matching `start_block`
//! - Any listener error is fatal for the block; there is no retry here

pub mod channel;
pub mod composite;
pub mod error;
pub mod json_lines;
pub mod listener;
pub mod packet;
pub mod session;
pub mod test_utils;

pub use channel::ChannelListener;
pub use composite::CompositeListener;
pub use error::{ListenerError, ListenerResult, ProtocolError, ProtocolResult};
pub use json_lines::JsonLinesListener;
pub use listener::{Listener, NoopListener};
pub use packet::{
    Commit, InitializationResult, ModuleInitialization, ObjectUpdateData, Packet, Stage,
    StartBlock, StreamCapabilities,
};
pub use session::{SessionState, StreamSession};
