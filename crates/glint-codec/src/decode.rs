//! The strict decoder.
//!
//! Rejects every malformed form the grammar forbids: leading zeros in
//! integers and lengths, `-0`, truncated values, unknown sigils, non-string
//! dictionary keys. Duplicate dictionary keys deterministically keep the
//! last occurrence. Limits cap string lengths and nesting depth so hostile
//! input cannot force unbounded allocation.

use std::collections::BTreeMap;

use glint_core::{GlintError, Result};

use crate::value::Value;

/// Allocation and recursion caps for untrusted input.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    /// Longest accepted byte string.
    pub max_string_len: usize,
    /// Deepest accepted list/dictionary nesting.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_string_len: 64 * 1024 * 1024,
            max_depth: 128,
        }
    }
}

/// Decode one value, returning it with the number of bytes consumed.
/// Trailing bytes are left for the caller.
pub fn decode(bytes: &[u8]) -> Result<(Value, usize)> {
    decode_with_limits(bytes, &DecodeLimits::default())
}

/// Decode one value under explicit limits.
pub fn decode_with_limits(bytes: &[u8], limits: &DecodeLimits) -> Result<(Value, usize)> {
    let mut decoder = Decoder {
        input: bytes,
        pos: 0,
        limits: *limits,
    };
    let value = decoder.value(0)?;
    Ok((value, decoder.pos))
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    limits: DecodeLimits,
}

impl Decoder<'_> {
    fn malformed(&self, reason: &'static str) -> GlintError {
        GlintError::MalformedInput {
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Result<u8> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(GlintError::Truncated)
    }

    fn advance(&mut self) -> Result<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, byte: u8, reason: &'static str) -> Result<()> {
        if self.peek()? != byte {
            return Err(self.malformed(reason));
        }
        self.pos += 1;
        Ok(())
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > self.limits.max_depth {
            return Err(self.malformed("nesting depth exceeds limit"));
        }
        match self.peek()? {
            b'i' => self.integer(),
            b'0'..=b'9' => Ok(Value::Bytes(self.byte_string()?)),
            b'l' => self.list(depth),
            b'd' => self.dict(depth),
            _ => Err(self.malformed("unknown type sigil")),
        }
    }

    fn integer(&mut self) -> Result<Value> {
        self.pos += 1; // 'i'
        let negative = if self.peek()? == b'-' {
            self.pos += 1;
            true
        } else {
            false
        };

        let first = self.advance()?;
        if !first.is_ascii_digit() {
            return Err(self.malformed("integer needs at least one digit"));
        }
        if negative && first == b'0' {
            return Err(self.malformed("negative zero is forbidden"));
        }

        let mut acc: i64 = -i64::from(first - b'0');
        if first == b'0' && self.peek()? != b'e' {
            return Err(self.malformed("integer has a leading zero"));
        }
        loop {
            match self.advance()? {
                b'e' => break,
                digit @ b'0'..=b'9' => {
                    // Accumulate negated so i64::MIN stays representable.
                    acc = acc
                        .checked_mul(10)
                        .and_then(|v| v.checked_sub(i64::from(digit - b'0')))
                        .ok_or(GlintError::LengthOverflow)?;
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.malformed("integer contains a non-digit"));
                }
            }
        }

        let value = if negative {
            acc
        } else {
            acc.checked_neg().ok_or(GlintError::LengthOverflow)?
        };
        Ok(Value::Int(value))
    }

    fn byte_string(&mut self) -> Result<Vec<u8>> {
        let first = self.advance()?;
        let mut len = (first - b'0') as usize;
        if first == b'0' && self.peek()?.is_ascii_digit() {
            return Err(self.malformed("length prefix has a leading zero"));
        }
        loop {
            match self.advance()? {
                b':' => break,
                digit @ b'0'..=b'9' => {
                    len = len
                        .checked_mul(10)
                        .and_then(|v| v.checked_add((digit - b'0') as usize))
                        .ok_or(GlintError::LengthOverflow)?;
                }
                _ => {
                    self.pos -= 1;
                    return Err(self.malformed("length prefix contains a non-digit"));
                }
            }
        }
        if len > self.limits.max_string_len {
            return Err(GlintError::LengthOverflow);
        }
        if self.pos + len > self.input.len() {
            return Err(GlintError::Truncated);
        }
        let data = self.input[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(data)
    }

    fn list(&mut self, depth: usize) -> Result<Value> {
        self.pos += 1; // 'l'
        let mut items = Vec::new();
        while self.peek()? != b'e' {
            items.push(self.value(depth + 1)?);
        }
        self.pos += 1; // 'e'
        Ok(Value::List(items))
    }

    fn dict(&mut self, depth: usize) -> Result<Value> {
        self.pos += 1; // 'd'
        let mut entries = BTreeMap::new();
        while self.peek()? != b'e' {
            if !self.peek()?.is_ascii_digit() {
                return Err(self.malformed("dictionary key must be a byte string"));
            }
            let key = self.byte_string()?;
            let value = self.value(depth + 1)?;
            // Deterministic duplicate handling: the last occurrence wins.
            entries.insert(key, value);
        }
        self.pos += 1; // 'e'
        Ok(Value::Dict(entries))
    }
}
