//! Random schema-valid values
//!
//! Every generated value passes [`Field::validate_value`] for the field it was
//! generated for. Integer and decimal strings are produced in canonical form
//! so that two values are equal exactly when their encodings are.

use chrono::{DateTime, TimeDelta};
use codec::canonical_decimal;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use schema::{Field, Kind, MAX_ADDRESS_LENGTH, Value};
use serde_json::json;

use crate::config::SimulatorConfig;

/// Roughly ±126 years around the epoch, inside the i64 nanosecond range
const TIME_RANGE_NANOS: i64 = 4_000_000_000_000_000_000;
const DURATION_RANGE_NANOS: i64 = 1_000_000_000_000_000;

/// Draw a value for `field`
pub fn random_value<R: Rng + ?Sized>(rng: &mut R, field: &Field, config: &SimulatorConfig) -> Value {
    match field.kind {
        Kind::String => {
            let len = random_len(rng, field, config.max_string_length, 0);
            Value::String((0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect())
        }
        Kind::Bytes => {
            let len = random_len(rng, field, config.max_bytes_length, 0);
            Value::Bytes((0..len).map(|_| rng.gen()).collect())
        }
        Kind::Address => {
            let len = random_len(rng, field, MAX_ADDRESS_LENGTH.min(32), 1);
            Value::Bytes((0..len).map(|_| rng.gen()).collect())
        }
        Kind::Int8 => Value::Int8(rng.gen()),
        Kind::Uint8 => Value::Uint8(rng.gen()),
        Kind::Int16 => Value::Int16(rng.gen()),
        Kind::Uint16 => Value::Uint16(rng.gen()),
        Kind::Int32 => Value::Int32(rng.gen()),
        Kind::Uint32 => Value::Uint32(rng.gen()),
        Kind::Int64 => Value::Int64(rng.gen()),
        Kind::Uint64 => Value::Uint64(rng.gen()),
        Kind::IntegerString => Value::String(random_integer_string(rng)),
        Kind::DecimalString => Value::String(random_decimal_string(rng)),
        Kind::Bool => Value::Bool(rng.gen()),
        Kind::Time => Value::Time(DateTime::from_timestamp_nanos(
            rng.gen_range(-TIME_RANGE_NANOS..TIME_RANGE_NANOS),
        )),
        Kind::Duration => Value::Duration(TimeDelta::nanoseconds(
            rng.gen_range(-DURATION_RANGE_NANOS..DURATION_RANGE_NANOS),
        )),
        Kind::Float32 => Value::Float32(rng.gen_range(-1.0e6f32..1.0e6)),
        Kind::Float64 => Value::Float64(rng.gen_range(-1.0e12f64..1.0e12)),
        Kind::Enum => {
            let member = field
                .enum_type
                .as_ref()
                .and_then(|e| e.values.choose(rng))
                .map(|v| v.name.clone())
                .unwrap_or_default();
            Value::String(member)
        }
        Kind::Json => {
            let doc = json!({
                "id": rng.gen::<u32>(),
                "flag": rng.gen::<bool>(),
                "tags": (0..rng.gen_range(0..3))
                    .map(|_| rng.gen_range(0..100))
                    .collect::<Vec<u32>>(),
            });
            Value::Json(doc.to_string())
        }
        Kind::Invalid => Value::Bool(false),
    }
}

/// Draw a full tuple for `fields`
pub fn random_values<R: Rng + ?Sized>(
    rng: &mut R,
    fields: &[Field],
    config: &SimulatorConfig,
) -> Vec<Value> {
    fields.iter().map(|f| random_value(rng, f, config)).collect()
}

fn random_len<R: Rng + ?Sized>(rng: &mut R, field: &Field, configured: usize, min: usize) -> usize {
    let max = field
        .effective_max_length()
        .map_or(configured, |m| m.min(configured))
        .max(min);
    rng.gen_range(min..=max)
}

/// Canonical integer of up to 40 digits
fn random_integer_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    if rng.gen_bool(0.7) {
        return rng.gen::<i64>().to_string();
    }
    let digits = rng.gen_range(1..=40);
    let mut s = String::with_capacity(digits + 1);
    if rng.gen() {
        s.push('-');
    }
    s.push(char::from(b'1' + rng.gen_range(0..9)));
    s.extend((1..digits).map(|_| char::from(b'0' + rng.gen_range(0..10))));
    s
}

fn random_decimal_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mantissa: i64 = rng.gen_range(-1_000_000_000_000..1_000_000_000_000);
    let exponent: i32 = rng.gen_range(-20..20);
    let text = format!("{mantissa}e{exponent}");
    canonical_decimal(&text).unwrap_or_else(|_| mantissa.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use schema::EnumType;

    #[test]
    fn test_values_validate_for_every_kind() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SimulatorConfig::default();
        for kind in Kind::ALL {
            let field = match kind {
                Kind::Enum => Field::enumeration("e", EnumType::sequential("color", ["red", "green"])),
                kind => Field::new("f", kind),
            };
            for _ in 0..50 {
                let value = random_value(&mut rng, &field, &config);
                assert!(field.validate_value(&value).is_ok(), "{kind}: {value}");
            }
        }
    }

    #[test]
    fn test_respects_max_length() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SimulatorConfig::default();
        let field = Field::new("memo", Kind::String).with_max_length(3);
        for _ in 0..100 {
            let value = random_value(&mut rng, &field, &config);
            assert!(value.as_str().unwrap().len() <= 3);
        }
    }

    #[test]
    fn test_numeric_strings_are_canonical() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let i = random_integer_string(&mut rng);
            assert_eq!(codec::canonical_integer(&i).unwrap(), i);
            let d = random_decimal_string(&mut rng);
            assert_eq!(canonical_decimal(&d).unwrap(), d);
        }
    }
}
