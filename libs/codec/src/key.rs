//! Order-preserving binary encoding of object keys
//!
//! A key is the concatenation of its fields' encodings in declared order.
//! For the fixed-width kinds, comparing two encoded keys bytewise gives the
//! same order as comparing the values:
//!
//! - **Signed integers, time, duration**: big-endian with the sign bit flipped
//! - **Unsigned integers**: big-endian
//! - **Bool**: `0x00` / `0x01`
//! - **Enum**: the encoding of its numeric kind
//!
//! Variable-length kinds (string, bytes, address, integer, decimal) carry a
//! big-endian length prefix unless they are the last field, in which case
//! they run to the end of the buffer. The prefix width follows the field's
//! maximum length: 1 byte up to `0xFF`, 2 up to `0xFFFF`, 3 up to
//! `0xFF_FFFF`, else 4. Addresses always use a 1-byte prefix.
//!
//! Integer and decimal values are encoded by their canonical text, so their
//! key order is lexicographic rather than numeric.

use chrono::{DateTime, TimeDelta};
use schema::{Field, Kind, Value, ValidationError};

use crate::buffer::{write_uint_be, ByteReader};
use crate::canonical::{canonical_decimal, canonical_integer, duration_to_nanos, time_to_nanos};
use crate::error::{CodecError, CodecResult};

const UNSUPPORTED_FORM: &str = "binary key";

/// Width in bytes of the length prefix a non-terminal field carries
pub fn length_prefix_width(field: &Field) -> usize {
    if field.kind == Kind::Address {
        return 1;
    }
    match field.max_length {
        Some(max) if max <= 0xFF => 1,
        Some(max) if max <= 0xFFFF => 2,
        Some(max) if max <= 0xFF_FFFF => 3,
        _ => 4,
    }
}

/// Encode a full key tuple
///
/// Every value is validated against its field before anything is written.
pub fn encode_key(fields: &[Field], values: &[Value]) -> CodecResult<Vec<u8>> {
    if fields.len() != values.len() {
        return Err(CodecError::ArityMismatch {
            expected: fields.len(),
            got: values.len(),
        });
    }

    let mut buf = Vec::with_capacity(fields.len() * 8);
    let last = fields.len().saturating_sub(1);
    for (idx, (field, value)) in fields.iter().zip(values).enumerate() {
        encode_key_field(field, value, idx == last, &mut buf)?;
    }
    Ok(buf)
}

/// Decode a full key tuple, requiring every byte to be consumed
pub fn decode_key(fields: &[Field], bytes: &[u8]) -> CodecResult<Vec<Value>> {
    let mut reader = ByteReader::new(bytes);
    let last = fields.len().saturating_sub(1);
    let values = fields
        .iter()
        .enumerate()
        .map(|(idx, field)| decode_key_field(field, &mut reader, idx == last))
        .collect::<CodecResult<Vec<_>>>()?;

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes {
            remaining: reader.remaining(),
            context: "key".to_string(),
        });
    }
    Ok(values)
}

/// Append one field's key encoding to `buf`
///
/// On error `buf` is left exactly as it was.
pub fn encode_key_field(
    field: &Field,
    value: &Value,
    terminal: bool,
    buf: &mut Vec<u8>,
) -> CodecResult<()> {
    if !field.kind.is_valid_key_kind() {
        return Err(CodecError::Unsupported {
            kind: field.kind,
            form: UNSUPPORTED_FORM,
        });
    }
    field.validate_value(value)?;

    let start = buf.len();
    let result = write_key_value(field, value, terminal, buf);
    if result.is_err() {
        buf.truncate(start);
    }
    result
}

fn write_key_value(
    field: &Field,
    value: &Value,
    terminal: bool,
    buf: &mut Vec<u8>,
) -> CodecResult<()> {
    match (field.kind, value) {
        (Kind::String, Value::String(s)) => write_var(field, s.as_bytes(), terminal, buf)?,
        (Kind::IntegerString, Value::String(s)) => {
            write_var(field, canonical_integer(s)?.as_bytes(), terminal, buf)?
        }
        (Kind::DecimalString, Value::String(s)) => {
            write_var(field, canonical_decimal(s)?.as_bytes(), terminal, buf)?
        }
        (Kind::Bytes | Kind::Address, Value::Bytes(b)) => write_var(field, b, terminal, buf)?,
        (Kind::Int8, Value::Int8(v)) => buf.push((*v as u8) ^ 0x80),
        (Kind::Uint8, Value::Uint8(v)) => buf.push(*v),
        (Kind::Int16, Value::Int16(v)) => buf.extend_from_slice(&((*v as u16) ^ 0x8000).to_be_bytes()),
        (Kind::Uint16, Value::Uint16(v)) => buf.extend_from_slice(&v.to_be_bytes()),
        (Kind::Int32, Value::Int32(v)) => buf.extend_from_slice(&flip_i32(*v).to_be_bytes()),
        (Kind::Uint32, Value::Uint32(v)) => buf.extend_from_slice(&v.to_be_bytes()),
        (Kind::Int64, Value::Int64(v)) => buf.extend_from_slice(&flip_i64(*v).to_be_bytes()),
        (Kind::Uint64, Value::Uint64(v)) => buf.extend_from_slice(&v.to_be_bytes()),
        (Kind::Bool, Value::Bool(v)) => buf.push(u8::from(*v)),
        (Kind::Time, Value::Time(t)) => {
            buf.extend_from_slice(&flip_i64(time_to_nanos(t)?).to_be_bytes())
        }
        (Kind::Duration, Value::Duration(d)) => {
            buf.extend_from_slice(&flip_i64(duration_to_nanos(d)?).to_be_bytes())
        }
        (Kind::Enum, Value::String(name)) => {
            let (numeric_kind, number) = enum_number(field, name)?;
            write_enum_number(numeric_kind, number, buf)?
        }
        (kind, value) => {
            return Err(ValidationError::TypeMismatch {
                kind,
                expected: kind.native_type_name(),
                got: value.native_type_name(),
            }
            .into())
        }
    }
    Ok(())
}

/// Decode one field at the reader's position
pub(crate) fn decode_key_field(
    field: &Field,
    reader: &mut ByteReader<'_>,
    terminal: bool,
) -> CodecResult<Value> {
    let context = field.name.as_str();
    let offset = reader.position();

    let value = match field.kind {
        Kind::String | Kind::IntegerString | Kind::DecimalString => {
            let bytes = read_var(field, reader, terminal)?;
            let text = std::str::from_utf8(bytes).map_err(|e| {
                CodecError::invalid_encoding(field.kind, offset, format!("invalid UTF-8: {e}"))
            })?;
            Value::String(text.to_string())
        }
        Kind::Bytes | Kind::Address => Value::Bytes(read_var(field, reader, terminal)?.to_vec()),
        Kind::Int8 => Value::Int8((reader.u8(context)? ^ 0x80) as i8),
        Kind::Uint8 => Value::Uint8(reader.u8(context)?),
        Kind::Int16 => Value::Int16((reader.u16_be(context)? ^ 0x8000) as i16),
        Kind::Uint16 => Value::Uint16(reader.u16_be(context)?),
        Kind::Int32 => Value::Int32(unflip_i32(reader.u32_be(context)?)),
        Kind::Uint32 => Value::Uint32(reader.u32_be(context)?),
        Kind::Int64 => Value::Int64(unflip_i64(reader.u64_be(context)?)),
        Kind::Uint64 => Value::Uint64(reader.u64_be(context)?),
        Kind::Bool => match reader.u8(context)? {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => {
                return Err(CodecError::invalid_encoding(
                    Kind::Bool,
                    offset,
                    format!("bool byte must be 0 or 1, got {other}"),
                ))
            }
        },
        Kind::Time => {
            Value::Time(DateTime::from_timestamp_nanos(unflip_i64(reader.u64_be(context)?)))
        }
        Kind::Duration => {
            Value::Duration(TimeDelta::nanoseconds(unflip_i64(reader.u64_be(context)?)))
        }
        Kind::Enum => {
            let enum_type = field
                .enum_type
                .as_ref()
                .ok_or_else(|| ValidationError::field_constraint(&field.name, "no enum type"))?;
            let number = read_enum_number(enum_type.numeric_kind, reader, context)?;
            let name = enum_type.name_of(number).ok_or_else(|| {
                CodecError::invalid_encoding(
                    Kind::Enum,
                    offset,
                    format!("{number} is not a value of enum {}", enum_type.name),
                )
            })?;
            Value::String(name.to_string())
        }
        kind @ (Kind::Float32 | Kind::Float64 | Kind::Json | Kind::Invalid) => {
            return Err(CodecError::Unsupported {
                kind,
                form: UNSUPPORTED_FORM,
            })
        }
    };

    field.validate_value(&value)?;
    Ok(value)
}

fn write_var(field: &Field, data: &[u8], terminal: bool, buf: &mut Vec<u8>) -> CodecResult<()> {
    if !terminal {
        let width = length_prefix_width(field);
        let limit = if width >= 8 { u64::MAX } else { (1u64 << (8 * width)) - 1 };
        if data.len() as u64 > limit {
            return Err(CodecError::LengthOverflow {
                len: data.len(),
                width,
                field: field.name.clone(),
            });
        }
        write_uint_be(buf, data.len() as u64, width);
    }
    buf.extend_from_slice(data);
    Ok(())
}

fn read_var<'a>(
    field: &Field,
    reader: &mut ByteReader<'a>,
    terminal: bool,
) -> CodecResult<&'a [u8]> {
    if terminal {
        return Ok(reader.rest());
    }
    let width = length_prefix_width(field);
    let len = reader.uint_be(width, &field.name)? as usize;
    reader.take(len, &field.name)
}

fn enum_number(field: &Field, name: &str) -> CodecResult<(Kind, i32)> {
    let enum_type = field
        .enum_type
        .as_ref()
        .ok_or_else(|| ValidationError::field_constraint(&field.name, "no enum type"))?;
    let number = enum_type.value_of(name).ok_or_else(|| {
        ValidationError::field_constraint(
            &field.name,
            format!("{name:?} is not a member of enum {}", enum_type.name),
        )
    })?;
    Ok((enum_type.numeric_kind, number))
}

fn write_enum_number(numeric_kind: Kind, number: i32, buf: &mut Vec<u8>) -> CodecResult<()> {
    let out_of_range = || CodecError::out_of_range(numeric_kind, format!("enum value {number}"));
    match numeric_kind {
        Kind::Int8 => buf.push((i8::try_from(number).map_err(|_| out_of_range())? as u8) ^ 0x80),
        Kind::Uint8 => buf.push(u8::try_from(number).map_err(|_| out_of_range())?),
        Kind::Int16 => {
            let v = i16::try_from(number).map_err(|_| out_of_range())?;
            buf.extend_from_slice(&((v as u16) ^ 0x8000).to_be_bytes());
        }
        Kind::Uint16 => {
            let v = u16::try_from(number).map_err(|_| out_of_range())?;
            buf.extend_from_slice(&v.to_be_bytes());
        }
        Kind::Int32 => buf.extend_from_slice(&flip_i32(number).to_be_bytes()),
        other => return Err(CodecError::out_of_range(other, "not an enum numeric kind")),
    }
    Ok(())
}

fn read_enum_number(
    numeric_kind: Kind,
    reader: &mut ByteReader<'_>,
    context: &str,
) -> CodecResult<i32> {
    Ok(match numeric_kind {
        Kind::Int8 => i32::from((reader.u8(context)? ^ 0x80) as i8),
        Kind::Uint8 => i32::from(reader.u8(context)?),
        Kind::Int16 => i32::from((reader.u16_be(context)? ^ 0x8000) as i16),
        Kind::Uint16 => i32::from(reader.u16_be(context)?),
        Kind::Int32 => unflip_i32(reader.u32_be(context)?),
        other => return Err(CodecError::out_of_range(other, "not an enum numeric kind")),
    })
}

fn flip_i32(v: i32) -> u32 {
    (v as u32) ^ 0x8000_0000
}

fn unflip_i32(v: u32) -> i32 {
    (v ^ 0x8000_0000) as i32
}

fn flip_i64(v: i64) -> u64 {
    (v as u64) ^ 0x8000_0000_0000_0000
}

fn unflip_i64(v: u64) -> i64 {
    (v ^ 0x8000_0000_0000_0000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use schema::EnumType;

    fn key_of(field: &Field, value: Value) -> Vec<u8> {
        encode_key(std::slice::from_ref(field), &[value]).unwrap()
    }

    #[test]
    fn test_signed_keys_flip_the_sign_bit() {
        let f = Field::new("n", Kind::Int32);
        assert_eq!(key_of(&f, Value::Int32(0)), [0x80, 0, 0, 0]);
        assert_eq!(key_of(&f, Value::Int32(-1)), [0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(key_of(&f, Value::Int32(i32::MIN)), [0, 0, 0, 0]);

        let f8 = Field::new("n", Kind::Int8);
        assert_eq!(key_of(&f8, Value::Int8(-128)), [0x00]);
        assert_eq!(key_of(&f8, Value::Int8(127)), [0xff]);
    }

    #[test]
    fn test_prefix_width_follows_max_length() {
        assert_eq!(length_prefix_width(&Field::new("s", Kind::String)), 4);
        assert_eq!(length_prefix_width(&Field::new("s", Kind::String).with_max_length(255)), 1);
        assert_eq!(length_prefix_width(&Field::new("s", Kind::String).with_max_length(256)), 2);
        assert_eq!(length_prefix_width(&Field::new("s", Kind::Bytes).with_max_length(70_000)), 3);
        assert_eq!(length_prefix_width(&Field::new("s", Kind::Bytes).with_max_length(1 << 24)), 4);
        assert_eq!(length_prefix_width(&Field::new("a", Kind::Address)), 1);
    }

    #[test]
    fn test_terminal_field_has_no_prefix() {
        let fields = [
            Field::new("denom", Kind::String).with_max_length(64),
            Field::new("owner", Kind::Address),
        ];
        let key = encode_key(&fields, &[Value::from("atom"), Value::Bytes(vec![0xaa, 0xbb])]).unwrap();
        assert_eq!(key, [4, b'a', b't', b'o', b'm', 0xaa, 0xbb]);

        let back = decode_key(&fields, &key).unwrap();
        assert_eq!(back, [Value::from("atom"), Value::Bytes(vec![0xaa, 0xbb])]);
    }

    #[test]
    fn test_canonicalizes_numeric_strings() {
        let f = Field::new("amount", Kind::IntegerString);
        assert_eq!(key_of(&f, Value::from("-0")), b"0");
        assert_eq!(key_of(&f, Value::from("0042")), b"42");

        let d = Field::new("rate", Kind::DecimalString);
        assert_eq!(key_of(&d, Value::from("1000000.0")), b"1e6");
    }

    #[test]
    fn test_enum_uses_numeric_kind() {
        let status = EnumType::sequential("status", ["pending", "active", "closed"])
            .with_numeric_kind(Kind::Uint8);
        let f = Field::enumeration("status", status);
        assert_eq!(key_of(&f, Value::from("closed")), [2]);
        assert_eq!(
            decode_key(std::slice::from_ref(&f), &[1]).unwrap(),
            [Value::from("active")]
        );
        assert!(decode_key(std::slice::from_ref(&f), &[9]).is_err());
    }

    #[test]
    fn test_float_and_json_keys_are_unsupported() {
        for kind in [Kind::Float32, Kind::Float64, Kind::Json] {
            let f = Field::new("x", kind);
            let err = encode_key(std::slice::from_ref(&f), &[Value::Float64(1.0)]).unwrap_err();
            assert!(matches!(err, CodecError::Unsupported { .. }), "{kind}");
            let err = decode_key(std::slice::from_ref(&f), &[0; 8]).unwrap_err();
            assert!(matches!(err, CodecError::Unsupported { .. }), "{kind}");
        }
    }

    #[test]
    fn test_decode_errors() {
        let fields = [Field::new("height", Kind::Uint64)];
        assert!(matches!(
            decode_key(&fields, &[0; 4]),
            Err(CodecError::Truncated { .. })
        ));
        assert!(matches!(
            decode_key(&fields, &[0; 9]),
            Err(CodecError::TrailingBytes { remaining: 1, .. })
        ));
        assert!(matches!(
            decode_key(&[Field::new("b", Kind::Bool)], &[2]),
            Err(CodecError::InvalidEncoding { .. })
        ));

        let prefixed = [
            Field::new("name", Kind::String).with_max_length(10),
            Field::new("n", Kind::Uint8),
        ];
        assert!(matches!(
            decode_key(&prefixed, &[5, b'a']),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn test_failed_field_leaves_buffer_untouched() {
        let mut buf = vec![0xee];
        let f = Field::new("tiny", Kind::Bytes).with_max_length(2);
        assert!(encode_key_field(&f, &Value::Bytes(vec![1, 2, 3]), false, &mut buf).is_err());
        assert_eq!(buf, [0xee]);
    }

    #[test]
    fn test_arity_mismatch() {
        let fields = [Field::new("a", Kind::Uint8), Field::new("b", Kind::Uint8)];
        assert_eq!(
            encode_key(&fields, &[Value::Uint8(1)]).unwrap_err(),
            CodecError::ArityMismatch { expected: 2, got: 1 }
        );
    }

    #[test]
    fn test_time_keys_order_before_epoch() {
        let f = Field::new("at", Kind::Time);
        let before = key_of(&f, Value::Time(Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap()));
        let after = key_of(&f, Value::Time(Utc.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap()));
        assert!(before < after);
    }

    proptest! {
        #[test]
        fn prop_int64_order_preserved(a: i64, b: i64) {
            let f = Field::new("n", Kind::Int64);
            let ka = key_of(&f, Value::Int64(a));
            let kb = key_of(&f, Value::Int64(b));
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn prop_int16_uint32_composite_order(a: (i16, u32), b: (i16, u32)) {
            let fields = [Field::new("x", Kind::Int16), Field::new("y", Kind::Uint32)];
            let ka = encode_key(&fields, &[Value::Int16(a.0), Value::Uint32(a.1)]).unwrap();
            let kb = encode_key(&fields, &[Value::Int16(b.0), Value::Uint32(b.1)]).unwrap();
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn prop_duration_order_preserved(a: i64, b: i64) {
            let f = Field::new("d", Kind::Duration);
            let ka = key_of(&f, Value::Duration(TimeDelta::nanoseconds(a)));
            let kb = key_of(&f, Value::Duration(TimeDelta::nanoseconds(b)));
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn prop_terminal_string_order_is_bytewise(a in "\\PC{0,24}", b in "\\PC{0,24}") {
            let f = Field::new("s", Kind::String);
            let ka = key_of(&f, Value::from(a.as_str()));
            let kb = key_of(&f, Value::from(b.as_str()));
            prop_assert_eq!(a.as_bytes().cmp(b.as_bytes()), ka.cmp(&kb));
        }

        #[test]
        fn prop_terminal_bytes_order_is_bytewise(
            a in proptest::collection::vec(any::<u8>(), 0..24),
            b in proptest::collection::vec(any::<u8>(), 0..24),
        ) {
            let f = Field::new("b", Kind::Bytes);
            let ka = key_of(&f, Value::Bytes(a.clone()));
            let kb = key_of(&f, Value::Bytes(b.clone()));
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        #[test]
        fn prop_unsigned_order_preserved(a: u64, b: u64, c: u32, d: u32) {
            let wide = Field::new("n", Kind::Uint64);
            let (ka, kb) = (key_of(&wide, Value::Uint64(a)), key_of(&wide, Value::Uint64(b)));
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));

            let narrow = Field::new("n", Kind::Uint32);
            let (kc, kd) = (key_of(&narrow, Value::Uint32(c)), key_of(&narrow, Value::Uint32(d)));
            prop_assert_eq!(c.cmp(&d), kc.cmp(&kd));
        }

        #[test]
        fn prop_time_order_preserved(a: i64, b: i64) {
            let f = Field::new("at", Kind::Time);
            let ka = key_of(&f, Value::Time(DateTime::from_timestamp_nanos(a)));
            let kb = key_of(&f, Value::Time(DateTime::from_timestamp_nanos(b)));
            prop_assert_eq!(a.cmp(&b), ka.cmp(&kb));
        }

        // a length prefix sorts shorter values first, then bytewise
        #[test]
        fn prop_prefixed_string_orders_by_length_then_bytes(
            a in "\\PC{0,12}",
            b in "\\PC{0,12}",
            x: u32,
            y: u32,
            max_length in prop::sample::select(vec![Some(255u32), Some(65_535), Some(70_000), None]),
        ) {
            let mut name = Field::new("name", Kind::String);
            name.max_length = max_length;
            let fields = [name, Field::new("n", Kind::Uint32)];

            let ka = encode_key(&fields, &[Value::from(a.as_str()), Value::Uint32(x)]).unwrap();
            let kb = encode_key(&fields, &[Value::from(b.as_str()), Value::Uint32(y)]).unwrap();
            let expected = (a.len(), a.as_bytes(), x).cmp(&(b.len(), b.as_bytes(), y));
            prop_assert_eq!(expected, ka.cmp(&kb));
        }

        #[test]
        fn prop_prefixed_bytes_orders_by_length_then_bytes(
            a in proptest::collection::vec(any::<u8>(), 0..12),
            b in proptest::collection::vec(any::<u8>(), 0..12),
            x: i64,
            y: i64,
        ) {
            let fields = [
                Field::new("blob", Kind::Bytes).with_max_length(16),
                Field::new("at", Kind::Time),
            ];
            let key = |bytes: &[u8], nanos: i64| {
                let at = Value::Time(DateTime::from_timestamp_nanos(nanos));
                encode_key(&fields, &[Value::Bytes(bytes.to_vec()), at]).unwrap()
            };
            let expected = (a.len(), &a, x).cmp(&(b.len(), &b, y));
            prop_assert_eq!(expected, key(&a, x).cmp(&key(&b, y)));
        }

        #[test]
        fn prop_non_terminal_fixed_width_leads_composite_order(a: (u64, i64), b: (u64, i64)) {
            let fields = [Field::new("height", Kind::Uint64), Field::new("at", Kind::Time)];
            let key = |(height, nanos): (u64, i64)| {
                let at = Value::Time(DateTime::from_timestamp_nanos(nanos));
                encode_key(&fields, &[Value::Uint64(height), at]).unwrap()
            };
            prop_assert_eq!(a.cmp(&b), key(a).cmp(&key(b)));
        }

        #[test]
        fn prop_prefixed_strings_decode(a in "[a-z]{0,20}", b in "[a-z]{0,20}", n: u16) {
            let fields = [
                Field::new("a", Kind::String).with_max_length(300),
                Field::new("b", Kind::String),
                Field::new("n", Kind::Uint16),
            ];
            let values = vec![Value::from(a.as_str()), Value::from(b.as_str()), Value::Uint16(n)];
            let key = encode_key(&fields, &values).unwrap();
            prop_assert_eq!(decode_key(&fields, &key).unwrap(), values);
        }
    }
}
