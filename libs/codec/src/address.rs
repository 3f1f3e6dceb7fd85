//! Pluggable text rendering for address values

use std::fmt;

use schema::{Kind, MAX_ADDRESS_LENGTH};

use crate::error::{CodecError, CodecResult};

/// Converts address bytes to and from their human-readable form
///
/// The JSON codec falls back to base64 when no renderer is configured.
pub trait AddressCodec: fmt::Debug + Send + Sync {
    fn address_to_string(&self, address: &[u8]) -> CodecResult<String>;

    fn string_to_address(&self, text: &str) -> CodecResult<Vec<u8>>;
}

/// `0x`-prefixed lowercase hex, as used by EVM-style chains
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressCodec;

impl AddressCodec for HexAddressCodec {
    fn address_to_string(&self, address: &[u8]) -> CodecResult<String> {
        Ok(format!("0x{}", hex::encode(address)))
    }

    fn string_to_address(&self, text: &str) -> CodecResult<Vec<u8>> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let bytes = hex::decode(digits)
            .map_err(|e| CodecError::invalid_json(Kind::Address, format!("{text:?}: {e}")))?;
        if bytes.len() > MAX_ADDRESS_LENGTH {
            return Err(CodecError::out_of_range(
                Kind::Address,
                format!("{} bytes exceeds {MAX_ADDRESS_LENGTH}", bytes.len()),
            ));
        }
        Ok(bytes)
    }
}
