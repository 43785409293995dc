//! The canonical encoder.
//!
//! Integers emit in minimal decimal form and dictionaries iterate their
//! `BTreeMap` in key order, so any two equal values encode to identical
//! bytes.

use crate::value::Value;

/// Encode a value into a fresh byte vector.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::with_capacity(estimate(value));
    encode_to(value, &mut out);
    out
}

/// Append a value's encoding to `out`.
pub fn encode_to(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Int(v) => {
            out.push(b'i');
            out.extend_from_slice(itoa(*v).as_bytes());
            out.push(b'e');
        }
        Value::Bytes(data) => {
            out.extend_from_slice(itoa(data.len() as i64).as_bytes());
            out.push(b':');
            out.extend_from_slice(data);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_to(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(entries) => {
            out.push(b'd');
            for (key, entry) in entries {
                out.extend_from_slice(itoa(key.len() as i64).as_bytes());
                out.push(b':');
                out.extend_from_slice(key);
                encode_to(entry, out);
            }
            out.push(b'e');
        }
    }
}

fn itoa(v: i64) -> String {
    v.to_string()
}

/// Rough output size, good enough to avoid most reallocation.
fn estimate(value: &Value) -> usize {
    match value {
        Value::Int(_) => 22,
        Value::Bytes(data) => data.len() + 12,
        Value::List(items) => 2 + items.iter().map(estimate).sum::<usize>(),
        Value::Dict(entries) => {
            2 + entries
                .iter()
                .map(|(k, v)| k.len() + 12 + estimate(v))
                .sum::<usize>()
        }
    }
}
