//! JSON encoding of field values
//!
//! | Kind                      | JSON form                                   |
//! |---------------------------|---------------------------------------------|
//! | string, enum              | string                                      |
//! | integer, decimal          | canonical string                            |
//! | int8 … uint32             | number                                      |
//! | int64, uint64             | string (numbers are accepted when decoding) |
//! | float32, float64          | number; NaN and infinities are rejected     |
//! | bool                      | boolean                                     |
//! | bytes                     | base64 string                               |
//! | address                   | [`AddressCodec`] string, else base64        |
//! | time                      | RFC 3339 UTC string, i64 nanosecond range   |
//! | duration                  | decimal seconds with an `s` suffix          |
//! | json                      | the embedded document, compact              |
//!
//! Embedded documents keep their member order and the exact text of every
//! number, so only insignificant whitespace is lost: a compact document
//! survives a round trip unchanged.
//!
//! Decoders are lenient where several spellings exist: bytes accept the
//! standard and URL-safe base64 alphabets with or without padding, and time
//! accepts any offset.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;
use schema::{Field, Kind, ObjectType, ObjectUpdate, Value, ValidationError};
use serde_json::{Map, Number, Value as JsonValue};

use crate::address::AddressCodec;
use crate::canonical::{
    canonical_decimal, canonical_integer, format_duration, format_time, parse_duration, parse_time,
    time_to_nanos,
};
use crate::error::{CodecError, CodecResult};

/// Encodes and decodes values to `serde_json::Value`
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    address_codec: Option<Arc<dyn AddressCodec>>,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render addresses with `codec` instead of base64
    pub fn with_address_codec(codec: Arc<dyn AddressCodec>) -> Self {
        Self {
            address_codec: Some(codec),
        }
    }

    /// Encode a value of `kind` after deep validation
    pub fn encode(&self, kind: Kind, value: &Value) -> CodecResult<JsonValue> {
        kind.validate_value(value)?;

        Ok(match (kind, value) {
            (Kind::String | Kind::Enum, Value::String(s)) => JsonValue::String(s.clone()),
            (Kind::IntegerString, Value::String(s)) => JsonValue::String(canonical_integer(s)?),
            (Kind::DecimalString, Value::String(s)) => JsonValue::String(canonical_decimal(s)?),
            (Kind::Bytes, Value::Bytes(b)) => JsonValue::String(STANDARD.encode(b)),
            (Kind::Address, Value::Bytes(b)) => JsonValue::String(match &self.address_codec {
                Some(codec) => codec.address_to_string(b)?,
                None => STANDARD.encode(b),
            }),
            (Kind::Int8, Value::Int8(v)) => JsonValue::from(*v),
            (Kind::Uint8, Value::Uint8(v)) => JsonValue::from(*v),
            (Kind::Int16, Value::Int16(v)) => JsonValue::from(*v),
            (Kind::Uint16, Value::Uint16(v)) => JsonValue::from(*v),
            (Kind::Int32, Value::Int32(v)) => JsonValue::from(*v),
            (Kind::Uint32, Value::Uint32(v)) => JsonValue::from(*v),
            (Kind::Int64, Value::Int64(v)) => JsonValue::String(v.to_string()),
            (Kind::Uint64, Value::Uint64(v)) => JsonValue::String(v.to_string()),
            (Kind::Float32, Value::Float32(v)) => finite_number(kind, f64::from(*v))?,
            (Kind::Float64, Value::Float64(v)) => finite_number(kind, *v)?,
            (Kind::Bool, Value::Bool(v)) => JsonValue::Bool(*v),
            (Kind::Time, Value::Time(t)) => JsonValue::String(format_time(t)),
            (Kind::Duration, Value::Duration(d)) => JsonValue::String(format_duration(d)?),
            (Kind::Json, Value::Json(text)) => serde_json::from_str(text)
                .map_err(|e| CodecError::invalid_json(kind, e.to_string()))?,
            (kind, value) => {
                return Err(ValidationError::TypeMismatch {
                    kind,
                    expected: kind.native_type_name(),
                    got: value.native_type_name(),
                }
                .into())
            }
        })
    }

    /// Decode a JSON value as `kind`, then deep-validate the result
    pub fn decode(&self, kind: Kind, json: &JsonValue) -> CodecResult<Value> {
        let value = match kind {
            Kind::String | Kind::Enum => Value::String(expect_str(kind, json)?.to_string()),
            Kind::IntegerString => Value::String(canonical_integer(expect_str(kind, json)?)?),
            Kind::DecimalString => Value::String(canonical_decimal(expect_str(kind, json)?)?),
            Kind::Bytes => Value::Bytes(decode_base64(kind, expect_str(kind, json)?)?),
            Kind::Address => {
                let text = expect_str(kind, json)?;
                Value::Bytes(match &self.address_codec {
                    Some(codec) => codec.string_to_address(text)?,
                    None => decode_base64(kind, text)?,
                })
            }
            Kind::Int8 => Value::Int8(small_int(kind, json)?),
            Kind::Uint8 => Value::Uint8(small_int(kind, json)?),
            Kind::Int16 => Value::Int16(small_int(kind, json)?),
            Kind::Uint16 => Value::Uint16(small_int(kind, json)?),
            Kind::Int32 => Value::Int32(small_int(kind, json)?),
            Kind::Uint32 => Value::Uint32(small_int(kind, json)?),
            Kind::Int64 => Value::Int64(match json {
                JsonValue::String(s) => parse_integer_text(kind, s)?,
                JsonValue::Number(n) => n
                    .as_i64()
                    .ok_or_else(|| CodecError::out_of_range(kind, n.to_string()))?,
                other => return Err(wrong_shape(kind, "a string or number", other)),
            }),
            Kind::Uint64 => Value::Uint64(match json {
                JsonValue::String(s) => parse_integer_text(kind, s)?,
                JsonValue::Number(n) => n
                    .as_u64()
                    .ok_or_else(|| CodecError::out_of_range(kind, n.to_string()))?,
                other => return Err(wrong_shape(kind, "a string or number", other)),
            }),
            Kind::Float32 => Value::Float32(expect_f64(kind, json)? as f32),
            Kind::Float64 => Value::Float64(expect_f64(kind, json)?),
            Kind::Bool => Value::Bool(
                json.as_bool()
                    .ok_or_else(|| wrong_shape(kind, "a boolean", json))?,
            ),
            Kind::Time => {
                let t = parse_time(expect_str(kind, json)?)?;
                time_to_nanos(&t)?;
                Value::Time(t)
            }
            Kind::Duration => Value::Duration(parse_duration(expect_str(kind, json)?)?),
            Kind::Json => Value::Json(
                serde_json::to_string(json)
                    .map_err(|e| CodecError::invalid_json(kind, e.to_string()))?,
            ),
            Kind::Invalid => return Err(ValidationError::reserved_kind().into()),
        };

        kind.validate_value(&value)?;
        Ok(value)
    }

    /// Encode with the field's constraints (enum membership, max length) checked
    pub fn encode_field(&self, field: &Field, value: &Value) -> CodecResult<JsonValue> {
        field.validate_value(value)?;
        self.encode(field.kind, value)
    }

    pub fn decode_field(&self, field: &Field, json: &JsonValue) -> CodecResult<Value> {
        let value = self.decode(field.kind, json)?;
        field.validate_value(&value)?;
        Ok(value)
    }

    /// Encode a tuple as a JSON object keyed by field name
    pub fn encode_fields(&self, fields: &[Field], values: &[Value]) -> CodecResult<Map<String, JsonValue>> {
        if fields.len() != values.len() {
            return Err(CodecError::ArityMismatch {
                expected: fields.len(),
                got: values.len(),
            });
        }
        fields
            .iter()
            .zip(values)
            .map(|(field, value)| Ok((field.name.clone(), self.encode_field(field, value)?)))
            .collect()
    }

    /// Decode a JSON object into a tuple in field order; every field is required
    pub fn decode_fields(&self, fields: &[Field], object: &Map<String, JsonValue>) -> CodecResult<Vec<Value>> {
        if let Some(extra) = object.keys().find(|k| !fields.iter().any(|f| &f.name == *k)) {
            return Err(ValidationError::field_constraint(extra, "not declared by the schema").into());
        }
        fields
            .iter()
            .map(|field| {
                let json = object.get(&field.name).ok_or_else(|| {
                    ValidationError::field_constraint(&field.name, "missing from JSON object")
                })?;
                self.decode_field(field, json)
            })
            .collect()
    }

    /// Render an update as `{"type", "key", "value"?, "delete"}`
    pub fn encode_object_update(
        &self,
        object_type: &ObjectType,
        update: &ObjectUpdate,
    ) -> CodecResult<JsonValue> {
        object_type.validate_object_update(update)?;

        let mut out = Map::new();
        out.insert("type".into(), JsonValue::String(update.type_name.clone()));
        out.insert(
            "key".into(),
            JsonValue::Object(self.encode_fields(&object_type.key_fields, &update.key)?),
        );
        if !update.delete {
            out.insert(
                "value".into(),
                JsonValue::Object(self.encode_fields(&object_type.value_fields, &update.value)?),
            );
        }
        out.insert("delete".into(), JsonValue::Bool(update.delete));
        Ok(JsonValue::Object(out))
    }

    pub fn decode_object_update(
        &self,
        object_type: &ObjectType,
        json: &JsonValue,
    ) -> CodecResult<ObjectUpdate> {
        let kind = Kind::Json;
        let object = json
            .as_object()
            .ok_or_else(|| wrong_shape(kind, "an object update", json))?;

        let type_name = object
            .get("type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| CodecError::invalid_json(kind, "missing \"type\""))?;
        let delete = object
            .get("delete")
            .map(|d| d.as_bool().ok_or_else(|| wrong_shape(kind, "a boolean", d)))
            .transpose()?
            .unwrap_or(false);
        let key_object = object
            .get("key")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| CodecError::invalid_json(kind, "missing \"key\" object"))?;
        let key = self.decode_fields(&object_type.key_fields, key_object)?;

        let update = if delete {
            ObjectUpdate::delete(type_name, key)
        } else {
            let empty = Map::new();
            let value_object = match object.get("value") {
                Some(v) => v
                    .as_object()
                    .ok_or_else(|| wrong_shape(kind, "a value object", v))?,
                None => &empty,
            };
            let value = self.decode_fields(&object_type.value_fields, value_object)?;
            ObjectUpdate::set(type_name, key, value)
        };

        object_type.validate_object_update(&update)?;
        Ok(update)
    }
}

fn expect_str<'a>(kind: Kind, json: &'a JsonValue) -> CodecResult<&'a str> {
    json.as_str().ok_or_else(|| wrong_shape(kind, "a string", json))
}

fn expect_f64(kind: Kind, json: &JsonValue) -> CodecResult<f64> {
    json.as_f64().ok_or_else(|| wrong_shape(kind, "a number", json))
}

fn small_int<T: TryFrom<i64>>(kind: Kind, json: &JsonValue) -> CodecResult<T> {
    let n = json
        .as_i64()
        .ok_or_else(|| wrong_shape(kind, "an integer number", json))?;
    T::try_from(n).map_err(|_| CodecError::out_of_range(kind, n.to_string()))
}

fn parse_integer_text<T: std::str::FromStr>(kind: Kind, s: &str) -> CodecResult<T> {
    s.parse()
        .map_err(|_| CodecError::invalid_json(kind, format!("{s:?} is not a {kind}")))
}

fn finite_number(kind: Kind, v: f64) -> CodecResult<JsonValue> {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .ok_or_else(|| CodecError::out_of_range(kind, format!("{v} has no JSON representation")))
}

fn decode_base64(kind: Kind, text: &str) -> CodecResult<Vec<u8>> {
    [STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(text).ok())
        .ok_or_else(|| CodecError::invalid_json(kind, format!("{text:?} is not base64")))
}

fn wrong_shape(kind: Kind, expected: &str, got: &JsonValue) -> CodecError {
    let got = match got {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    };
    CodecError::invalid_json(kind, format!("expected {expected}, got {got}"))
}
