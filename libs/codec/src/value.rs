//! Compact binary encoding of value tuples
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────── head ─────────────────────────┬──── tail ────┐
//! │ field 0 │ field 1 │ (offset u32, len u32) │ field 3 … │ var bytes …  │
//! └───────────────────────────────────────────────────────┴──────────────┘
//! ```
//!
//! The head holds one entry per field in declared order:
//!
//! - **Numeric, time, duration, bool, enum**: little-endian at their fixed
//!   width (time and duration as i64 nanoseconds, enum as its numeric kind)
//! - **Address**: a 1-byte length followed by the bytes, inline
//! - **String, bytes, integer, decimal, json**: an `(offset, len)` pair of
//!   little-endian u32 pointing into the tail, offsets absolute from the
//!   start of the buffer
//!
//! Decoding requires the buffer to be exactly head plus tail long.

use chrono::{DateTime, TimeDelta};
use schema::{Field, Kind, Value, ValidationError};

use crate::buffer::ByteReader;
use crate::canonical::{canonical_decimal, canonical_integer, duration_to_nanos, time_to_nanos};
use crate::error::{CodecError, CodecResult};

/// Head entry size for tail-stored kinds
const POINTER_SIZE: usize = 8;

fn stored_in_tail(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::String | Kind::Bytes | Kind::IntegerString | Kind::DecimalString | Kind::Json
    )
}

/// Encode a value tuple
pub fn encode_value(fields: &[Field], values: &[Value]) -> CodecResult<Vec<u8>> {
    if fields.len() != values.len() {
        return Err(CodecError::ArityMismatch {
            expected: fields.len(),
            got: values.len(),
        });
    }

    // Validate and canonicalize first so nothing is written for a bad tuple
    let mut tail_parts: Vec<Option<Vec<u8>>> = Vec::with_capacity(fields.len());
    let mut head_len = 0usize;
    for (field, value) in fields.iter().zip(values) {
        field.validate_value(value)?;
        if stored_in_tail(field.kind) {
            tail_parts.push(Some(tail_bytes(field, value)?));
            head_len += POINTER_SIZE;
        } else {
            tail_parts.push(None);
            head_len += head_entry_len(field, value)?;
        }
    }

    let tail_len: usize = tail_parts.iter().flatten().map(Vec::len).sum();
    let total = head_len + tail_len;
    if u32::try_from(total).is_err() {
        return Err(CodecError::LengthOverflow {
            len: total,
            width: 4,
            field: "value".to_string(),
        });
    }

    let mut head = Vec::with_capacity(total);
    let mut tail = Vec::with_capacity(tail_len);
    for ((field, value), part) in fields.iter().zip(values).zip(&tail_parts) {
        match part {
            Some(bytes) => {
                let offset = (head_len + tail.len()) as u32;
                head.extend_from_slice(&offset.to_le_bytes());
                head.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                tail.extend_from_slice(bytes);
            }
            None => write_head_entry(field, value, &mut head)?,
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Decode a value tuple
pub fn decode_value(fields: &[Field], bytes: &[u8]) -> CodecResult<Vec<Value>> {
    let mut reader = ByteReader::new(bytes);
    let mut values = Vec::with_capacity(fields.len());
    let mut tail_len = 0usize;

    for field in fields {
        let value = if stored_in_tail(field.kind) {
            let context = field.name.as_str();
            let offset = reader.u32_le(context)? as usize;
            let len = reader.u32_le(context)? as usize;
            let data = offset
                .checked_add(len)
                .and_then(|end| bytes.get(offset..end))
                .ok_or_else(|| {
                    CodecError::truncated(offset.saturating_add(len), bytes.len(), context)
                })?;
            tail_len += len;
            tail_value(field, data, offset)?
        } else {
            read_head_entry(field, &mut reader)?
        };
        field.validate_value(&value)?;
        values.push(value);
    }

    let expected = reader.position() + tail_len;
    if expected != bytes.len() {
        return Err(CodecError::TrailingBytes {
            remaining: bytes.len().abs_diff(expected),
            context: "value".to_string(),
        });
    }
    Ok(values)
}

fn tail_bytes(field: &Field, value: &Value) -> CodecResult<Vec<u8>> {
    Ok(match (field.kind, value) {
        (Kind::IntegerString, Value::String(s)) => canonical_integer(s)?.into_bytes(),
        (Kind::DecimalString, Value::String(s)) => canonical_decimal(s)?.into_bytes(),
        (_, Value::String(s) | Value::Json(s)) => s.as_bytes().to_vec(),
        (_, Value::Bytes(b)) => b.clone(),
        (kind, value) => return Err(type_mismatch(kind, value)),
    })
}

fn tail_value(field: &Field, data: &[u8], offset: usize) -> CodecResult<Value> {
    if field.kind == Kind::Bytes {
        return Ok(Value::Bytes(data.to_vec()));
    }
    let text = std::str::from_utf8(data).map_err(|e| {
        CodecError::invalid_encoding(field.kind, offset, format!("invalid UTF-8: {e}"))
    })?;
    Ok(match field.kind {
        Kind::Json => Value::Json(text.to_string()),
        _ => Value::String(text.to_string()),
    })
}

fn head_entry_len(field: &Field, value: &Value) -> CodecResult<usize> {
    match (field.kind, value) {
        (Kind::Address, Value::Bytes(b)) => Ok(1 + b.len()),
        (Kind::Enum, _) => enum_numeric_kind(field)?
            .fixed_width()
            .ok_or_else(|| CodecError::out_of_range(Kind::Enum, "numeric kind has no width")),
        (kind, _) => kind.fixed_width().ok_or(CodecError::Unsupported {
            kind,
            form: "binary value",
        }),
    }
}

fn write_head_entry(field: &Field, value: &Value, buf: &mut Vec<u8>) -> CodecResult<()> {
    match (field.kind, value) {
        (Kind::Address, Value::Bytes(b)) => {
            let len = u8::try_from(b.len()).map_err(|_| CodecError::LengthOverflow {
                len: b.len(),
                width: 1,
                field: field.name.clone(),
            })?;
            buf.push(len);
            buf.extend_from_slice(b);
        }
        (Kind::Int8, Value::Int8(v)) => buf.push(*v as u8),
        (Kind::Uint8, Value::Uint8(v)) => buf.push(*v),
        (Kind::Int16, Value::Int16(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Uint16, Value::Uint16(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Int32, Value::Int32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Uint32, Value::Uint32(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Int64, Value::Int64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Uint64, Value::Uint64(v)) => buf.extend_from_slice(&v.to_le_bytes()),
        (Kind::Float32, Value::Float32(v)) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
        (Kind::Float64, Value::Float64(v)) => buf.extend_from_slice(&v.to_bits().to_le_bytes()),
        (Kind::Bool, Value::Bool(v)) => buf.push(u8::from(*v)),
        (Kind::Time, Value::Time(t)) => buf.extend_from_slice(&time_to_nanos(t)?.to_le_bytes()),
        (Kind::Duration, Value::Duration(d)) => {
            buf.extend_from_slice(&duration_to_nanos(d)?.to_le_bytes())
        }
        (Kind::Enum, Value::String(name)) => {
            let number = field
                .enum_type
                .as_ref()
                .and_then(|e| e.value_of(name))
                .ok_or_else(|| {
                    ValidationError::field_constraint(&field.name, format!("unknown member {name:?}"))
                })?;
            let numeric_kind = enum_numeric_kind(field)?;
            let range = || CodecError::out_of_range(numeric_kind, format!("enum value {number}"));
            match numeric_kind {
                Kind::Int8 => buf.push(i8::try_from(number).map_err(|_| range())? as u8),
                Kind::Uint8 => buf.push(u8::try_from(number).map_err(|_| range())?),
                Kind::Int16 => buf.extend_from_slice(
                    &i16::try_from(number).map_err(|_| range())?.to_le_bytes(),
                ),
                Kind::Uint16 => buf.extend_from_slice(
                    &u16::try_from(number).map_err(|_| range())?.to_le_bytes(),
                ),
                _ => buf.extend_from_slice(&number.to_le_bytes()),
            }
        }
        (kind, value) => return Err(type_mismatch(kind, value)),
    }
    Ok(())
}

fn read_head_entry(field: &Field, reader: &mut ByteReader<'_>) -> CodecResult<Value> {
    let context = field.name.as_str();
    let offset = reader.position();
    Ok(match field.kind {
        Kind::Address => {
            let len = reader.u8(context)? as usize;
            Value::Bytes(reader.take(len, context)?.to_vec())
        }
        Kind::Int8 => Value::Int8(reader.u8(context)? as i8),
        Kind::Uint8 => Value::Uint8(reader.u8(context)?),
        Kind::Int16 => Value::Int16(reader.u16_le(context)? as i16),
        Kind::Uint16 => Value::Uint16(reader.u16_le(context)?),
        Kind::Int32 => Value::Int32(reader.u32_le(context)? as i32),
        Kind::Uint32 => Value::Uint32(reader.u32_le(context)?),
        Kind::Int64 => Value::Int64(reader.u64_le(context)? as i64),
        Kind::Uint64 => Value::Uint64(reader.u64_le(context)?),
        Kind::Float32 => Value::Float32(f32::from_bits(reader.u32_le(context)?)),
        Kind::Float64 => Value::Float64(f64::from_bits(reader.u64_le(context)?)),
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
        Kind::Time => Value::Time(DateTime::from_timestamp_nanos(reader.u64_le(context)? as i64)),
        Kind::Duration => Value::Duration(TimeDelta::nanoseconds(reader.u64_le(context)? as i64)),
        Kind::Enum => {
            let number = match enum_numeric_kind(field)? {
                Kind::Int8 => i32::from(reader.u8(context)? as i8),
                Kind::Uint8 => i32::from(reader.u8(context)?),
                Kind::Int16 => i32::from(reader.u16_le(context)? as i16),
                Kind::Uint16 => i32::from(reader.u16_le(context)?),
                _ => reader.u32_le(context)? as i32,
            };
            let name = field
                .enum_type
                .as_ref()
                .and_then(|e| e.name_of(number))
                .ok_or_else(|| {
                    CodecError::invalid_encoding(Kind::Enum, offset, format!("no member {number}"))
                })?;
            Value::String(name.to_string())
        }
        kind => {
            return Err(CodecError::Unsupported {
                kind,
                form: "binary value",
            })
        }
    })
}

fn enum_numeric_kind(field: &Field) -> CodecResult<Kind> {
    field
        .enum_type
        .as_ref()
        .map(|e| e.numeric_kind)
        .ok_or_else(|| ValidationError::field_constraint(&field.name, "no enum type").into())
}

fn type_mismatch(kind: Kind, value: &Value) -> CodecError {
    ValidationError::TypeMismatch {
        kind,
        expected: kind.native_type_name(),
        got: value.native_type_name(),
    }
    .into()
}
