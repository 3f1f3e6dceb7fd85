//! Bounds-checked cursor over an encoded buffer
//!
//! Decoders never index the input directly: every read goes through
//! [`ByteReader::take`], which reports a [`CodecError::Truncated`] naming the
//! field being decoded instead of panicking.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{CodecError, CodecResult};

#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize, context: &str) -> CodecResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::truncated(n, self.remaining(), context));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consume everything left
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub fn u8(&mut self, context: &str) -> CodecResult<u8> {
        Ok(self.take(1, context)?[0])
    }

    pub fn u16_be(&mut self, context: &str) -> CodecResult<u16> {
        Ok(BigEndian::read_u16(self.take(2, context)?))
    }

    pub fn u32_be(&mut self, context: &str) -> CodecResult<u32> {
        Ok(BigEndian::read_u32(self.take(4, context)?))
    }

    pub fn u64_be(&mut self, context: &str) -> CodecResult<u64> {
        Ok(BigEndian::read_u64(self.take(8, context)?))
    }

    /// Big-endian unsigned integer of 1 to 8 bytes
    pub fn uint_be(&mut self, width: usize, context: &str) -> CodecResult<u64> {
        Ok(BigEndian::read_uint(self.take(width, context)?, width))
    }

    pub fn u16_le(&mut self, context: &str) -> CodecResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2, context)?))
    }

    pub fn u32_le(&mut self, context: &str) -> CodecResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4, context)?))
    }

    pub fn u64_le(&mut self, context: &str) -> CodecResult<u64> {
        Ok(LittleEndian::read_u64(self.take(8, context)?))
    }
}

/// Append a big-endian unsigned integer of `width` bytes
pub(crate) fn write_uint_be(buf: &mut Vec<u8>, n: u64, width: usize) {
    let mut scratch = [0u8; 8];
    BigEndian::write_uint(&mut scratch, n, width);
    buf.extend_from_slice(&scratch[..width]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_reports_truncation() {
        let mut reader = ByteReader::new(&[1, 2, 3]);
        assert_eq!(reader.take(2, "head").unwrap(), &[1, 2]);
        let err = reader.take(2, "tail").unwrap_err();
        assert_eq!(err, CodecError::truncated(2, 1, "tail"));
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_three_byte_integers() {
        let mut buf = Vec::new();
        write_uint_be(&mut buf, 0x01_02_03, 3);
        assert_eq!(buf, [1, 2, 3]);

        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.uint_be(3, "len").unwrap(), 0x01_02_03);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_endianness() {
        let bytes = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(ByteReader::new(&bytes).u32_be("x").unwrap(), 0x1234_5678);
        assert_eq!(ByteReader::new(&bytes).u32_le("x").unwrap(), 0x7856_3412);
        assert_eq!(ByteReader::new(&bytes).u16_le("x").unwrap(), 0x3412);
    }

    #[test]
    fn test_rest_consumes_everything() {
        let mut reader = ByteReader::new(&[9, 8, 7]);
        reader.u8("lead").unwrap();
        assert_eq!(reader.rest(), &[8, 7]);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.rest().is_empty());
    }
}
