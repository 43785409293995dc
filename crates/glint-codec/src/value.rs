//! The bencode value model.
//!
//! Dictionaries are `BTreeMap`s keyed by byte strings, so the canonical
//! byte-sorted key order is structural rather than enforced at encode
//! time.

use std::collections::BTreeMap;

use glint_core::{GlintError, Rect, Result};
use glint_scroll::{RowSpan, ScrollMove};

/// A bencode value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Raw byte string; UTF-8 is not assumed.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Dictionary with byte-string keys in sorted order.
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    /// Byte-string value from anything byte-like.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Byte-string value from UTF-8 text.
    pub fn string(text: &str) -> Self {
        Self::Bytes(text.as_bytes().to_vec())
    }

    /// Empty dictionary.
    pub fn dict() -> Self {
        Self::Dict(BTreeMap::new())
    }

    /// The integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The byte payload, if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(data) => Some(data),
            _ => None,
        }
    }

    /// The byte payload as text, if this is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|data| std::str::from_utf8(data).ok())
    }

    /// The element list, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The entry map, if this is a dictionary.
    pub fn as_dict(&self) -> Option<&BTreeMap<Vec<u8>, Value>> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Dictionary lookup by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?.get(key.as_bytes())
    }

    /// Insert into a dictionary value; no-op on other variants.
    pub fn insert(&mut self, key: &str, value: Value) {
        if let Self::Dict(entries) = self {
            entries.insert(key.as_bytes().to_vec(), value);
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

/// Conversion of host values into bencode.
///
/// Fallible so absent values stay a hard error instead of a silent null.
pub trait ToBencode {
    fn to_bencode(&self) -> Result<Value>;
}

/// Conversion of bencode back into host values.
pub trait FromBencode: Sized {
    fn from_bencode(value: &Value) -> Result<Self>;
}

fn expect_int(value: &Value) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| GlintError::invalid("expected a bencode integer"))
}

fn int_field(items: &[Value], index: usize) -> Result<i64> {
    items
        .get(index)
        .ok_or_else(|| GlintError::invalid("list too short"))
        .and_then(expect_int)
}

impl ToBencode for i64 {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::Int(*self))
    }
}

impl FromBencode for i64 {
    fn from_bencode(value: &Value) -> Result<Self> {
        expect_int(value)
    }
}

impl ToBencode for u32 {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::Int(*self as i64))
    }
}

impl FromBencode for u32 {
    fn from_bencode(value: &Value) -> Result<Self> {
        u32::try_from(expect_int(value)?).map_err(|_| GlintError::LengthOverflow)
    }
}

impl ToBencode for u64 {
    fn to_bencode(&self) -> Result<Value> {
        i64::try_from(*self)
            .map(Value::Int)
            .map_err(|_| GlintError::LengthOverflow)
    }
}

impl FromBencode for u64 {
    fn from_bencode(value: &Value) -> Result<Self> {
        u64::try_from(expect_int(value)?).map_err(|_| GlintError::LengthOverflow)
    }
}

impl ToBencode for bool {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::Int(i64::from(*self)))
    }
}

impl FromBencode for bool {
    fn from_bencode(value: &Value) -> Result<Self> {
        match expect_int(value)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(GlintError::invalid(format!(
                "boolean must be 0 or 1, got {other}"
            ))),
        }
    }
}

impl ToBencode for String {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::string(self))
    }
}

impl FromBencode for String {
    fn from_bencode(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| GlintError::invalid("expected a UTF-8 byte string"))
    }
}

impl ToBencode for &[u8] {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl<T: ToBencode> ToBencode for Vec<T> {
    fn to_bencode(&self) -> Result<Value> {
        let items = self.iter().map(T::to_bencode).collect::<Result<Vec<_>>>()?;
        Ok(Value::List(items))
    }
}

impl<T: FromBencode> FromBencode for Vec<T> {
    fn from_bencode(value: &Value) -> Result<Self> {
        value
            .as_list()
            .ok_or_else(|| GlintError::invalid("expected a list"))?
            .iter()
            .map(T::from_bencode)
            .collect()
    }
}

/// Absent values are a hard error on the wire.
impl<T: ToBencode> ToBencode for Option<T> {
    fn to_bencode(&self) -> Result<Value> {
        match self {
            Some(inner) => inner.to_bencode(),
            None => Err(GlintError::invalid("cannot encode an absent value")),
        }
    }
}

impl ToBencode for Rect {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::List(vec![
            Value::Int(self.x as i64),
            Value::Int(self.y as i64),
            Value::Int(self.width as i64),
            Value::Int(self.height as i64),
        ]))
    }
}

impl FromBencode for Rect {
    fn from_bencode(value: &Value) -> Result<Self> {
        let items = value
            .as_list()
            .ok_or_else(|| GlintError::invalid("rectangle must be a list"))?;
        if items.len() != 4 {
            return Err(GlintError::invalid("rectangle needs four integers"));
        }
        let field = |i: usize| -> Result<i32> {
            i32::try_from(int_field(items, i)?).map_err(|_| GlintError::LengthOverflow)
        };
        Rect::new(field(0)?, field(1)?, field(2)?, field(3)?)
    }
}

impl ToBencode for ScrollMove {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::List(vec![
            Value::Int(self.shift as i64),
            Value::Int(self.start as i64),
            Value::Int(self.count as i64),
        ]))
    }
}

impl FromBencode for ScrollMove {
    fn from_bencode(value: &Value) -> Result<Self> {
        let items = value
            .as_list()
            .ok_or_else(|| GlintError::invalid("scroll move must be a list"))?;
        if items.len() != 3 {
            return Err(GlintError::invalid("scroll move needs three integers"));
        }
        Ok(Self {
            shift: i32::try_from(int_field(items, 0)?).map_err(|_| GlintError::LengthOverflow)?,
            start: u32::try_from(int_field(items, 1)?).map_err(|_| GlintError::LengthOverflow)?,
            count: u32::try_from(int_field(items, 2)?).map_err(|_| GlintError::LengthOverflow)?,
        })
    }
}

impl ToBencode for RowSpan {
    fn to_bencode(&self) -> Result<Value> {
        Ok(Value::List(vec![
            Value::Int(self.start as i64),
            Value::Int(self.count as i64),
        ]))
    }
}

impl FromBencode for RowSpan {
    fn from_bencode(value: &Value) -> Result<Self> {
        let items = value
            .as_list()
            .ok_or_else(|| GlintError::invalid("row span must be a list"))?;
        if items.len() != 2 {
            return Err(GlintError::invalid("row span needs two integers"));
        }
        Ok(Self {
            start: u32::try_from(int_field(items, 0)?).map_err(|_| GlintError::LengthOverflow)?,
            count: u32::try_from(int_field(items, 1)?).map_err(|_| GlintError::LengthOverflow)?,
        })
    }
}
