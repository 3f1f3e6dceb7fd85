//! # Codec - Value Encodings
//!
//! ## Purpose
//!
//! Three interchangeable encodings for values described by a [`schema::Field`]:
//! - **JSON**: canonical, human-readable, lenient on input ([`JsonCodec`])
//! - **Binary key**: ordered so that bytewise comparison of encoded keys
//!   follows value order for fixed-width kinds ([`encode_key`])
//! - **Binary value**: compact head/tail layout for value tuples
//!   ([`encode_value`])
//!
//! Every encoder validates its input first and returns an error instead of
//! emitting partial output.
//!
//! ## Architecture Role
//!
//! ```text
//! libs/schema → [codec] → libs/appdata, libs/statesim
//!     ↑            ↓              ↓
//!  Kinds       JSON text      Listeners, reference
//!  Values      Key bytes      state keyed by
//!  Fields      Value bytes    encoded keys
//! ```
//!
//! ## Canonical Forms
//!
//! Integer and decimal strings, times and durations are written in a single
//! canonical form (see [`canonical`]), so equal values always encode to equal
//! bytes and equal JSON.
//!
//! ## What This Crate Does NOT Contain
//! - Schema definitions or validation rules (belong in `schema`)
//! - Packet delivery (belongs in `appdata`)

pub mod address;
mod buffer;
pub mod canonical;
pub mod error;
pub mod json;
pub mod key;
pub mod object;
pub mod value;

pub use address::{AddressCodec, HexAddressCodec};
pub use canonical::{
    canonical_decimal, canonical_integer, format_duration, format_time, parse_duration, parse_time,
};
pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;
pub use key::{decode_key, encode_key, encode_key_field, length_prefix_width};
pub use object::{decode_object_key, decode_object_value, encode_object_key, encode_object_value};
pub use value::{decode_value, encode_value};
