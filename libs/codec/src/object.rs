//! Key and value encodings bound to an object type

use schema::{ObjectType, Value};
use tracing::debug;

use crate::error::CodecResult;
use crate::key::{decode_key, encode_key};
use crate::value::{decode_value, encode_value};

/// Encode the key tuple of an object of `object_type`
///
/// Singletons (no key fields) encode to the empty key.
pub fn encode_object_key(object_type: &ObjectType, key: &[Value]) -> CodecResult<Vec<u8>> {
    encode_key(&object_type.key_fields, key).inspect_err(|e| {
        debug!(object_type = %object_type.name, error = %e, "Failed to encode object key");
    })
}

pub fn decode_object_key(object_type: &ObjectType, bytes: &[u8]) -> CodecResult<Vec<Value>> {
    decode_key(&object_type.key_fields, bytes).inspect_err(|e| {
        debug!(object_type = %object_type.name, error = %e, len = bytes.len(), "Failed to decode object key");
    })
}

pub fn encode_object_value(object_type: &ObjectType, values: &[Value]) -> CodecResult<Vec<u8>> {
    encode_value(&object_type.value_fields, values).inspect_err(|e| {
        debug!(object_type = %object_type.name, error = %e, "Failed to encode object value");
    })
}

pub fn decode_object_value(object_type: &ObjectType, bytes: &[u8]) -> CodecResult<Vec<Value>> {
    decode_value(&object_type.value_fields, bytes).inspect_err(|e| {
        debug!(object_type = %object_type.name, error = %e, len = bytes.len(), "Failed to decode object value");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{Field, Kind};

    #[test]
    fn test_singleton_has_empty_key() {
        let params = ObjectType::new("params", vec![], vec![Field::new("max_gas", Kind::Uint64)]);
        assert!(encode_object_key(&params, &[]).unwrap().is_empty());
        assert!(decode_object_key(&params, &[]).unwrap().is_empty());

        let value = encode_object_value(&params, &[Value::Uint64(10)]).unwrap();
        assert_eq!(decode_object_value(&params, &value).unwrap(), [Value::Uint64(10)]);
    }

    #[test]
    fn test_keys_sort_like_their_values() {
        let heights = ObjectType::new(
            "blocks",
            vec![Field::new("chain", Kind::Uint8), Field::new("height", Kind::Int64)],
            vec![],
        );
        let mut keys: Vec<Vec<u8>> = [(1u8, -3i64), (0, 100), (1, -10), (0, -1)]
            .iter()
            .map(|(c, h)| encode_object_key(&heights, &[Value::Uint8(*c), Value::Int64(*h)]).unwrap())
            .collect();
        keys.sort();
        let decoded: Vec<_> = keys
            .iter()
            .map(|k| decode_object_key(&heights, k).unwrap())
            .collect();
        assert_eq!(
            decoded,
            [
                vec![Value::Uint8(0), Value::Int64(-1)],
                vec![Value::Uint8(0), Value::Int64(100)],
                vec![Value::Uint8(1), Value::Int64(-10)],
                vec![Value::Uint8(1), Value::Int64(-3)],
            ]
        );
    }
}
