//! Pixel buffer self-description.
//!
//! A `PixelBuffer` crosses the transport as a bencoded dictionary with
//! keys `w`, `h`, `fmt`, `planes`, `strides` and `data`. The receiver
//! validates the strides against the format tables before rebuilding the
//! buffer, so a hostile peer cannot describe out-of-bounds geometry.

use std::collections::BTreeMap;
use std::sync::Arc;

use glint_buffer::{AlignedBuffer, PixelBuffer, PlaneDesc};
use glint_core::{GlintError, PixelFormat, Result};

use crate::value::Value;

/// Describe a pixel buffer as a bencode dictionary.
pub fn pixel_buffer_to_value(buf: &PixelBuffer) -> Result<Value> {
    let mut entries = BTreeMap::new();
    entries.insert(b"w".to_vec(), Value::Int(buf.width() as i64));
    entries.insert(b"h".to_vec(), Value::Int(buf.height() as i64));
    entries.insert(b"fmt".to_vec(), Value::string(buf.format().name()));
    entries.insert(b"planes".to_vec(), Value::Int(buf.plane_count() as i64));

    let mut strides = Vec::with_capacity(buf.plane_count());
    let mut planes = Vec::with_capacity(buf.plane_count());
    for p in 0..buf.plane_count() {
        strides.push(Value::Int(buf.plane_stride(p)? as i64));
        planes.push(Value::Bytes(buf.plane(p)?.to_vec()));
    }
    entries.insert(b"strides".to_vec(), Value::List(strides));

    let data = if buf.plane_count() == 1 {
        planes.remove(0)
    } else {
        Value::List(planes)
    };
    entries.insert(b"data".to_vec(), data);

    Ok(Value::Dict(entries))
}

/// Rebuild a pixel buffer from its wire description.
///
/// # Errors
/// - [`GlintError::InvalidArgument`] for missing or mistyped keys, an
///   unknown format name, a plane count or stride that contradicts the
///   format, or plane data whose size does not match the geometry
pub fn pixel_buffer_from_value(value: &Value) -> Result<PixelBuffer> {
    let dict = value
        .as_dict()
        .ok_or_else(|| GlintError::invalid("pixel buffer description must be a dictionary"))?;

    let int_key = |key: &str| -> Result<i64> {
        dict.get(key.as_bytes())
            .and_then(Value::as_int)
            .ok_or_else(|| GlintError::invalid(format!("missing integer key {key:?}")))
    };

    let width = u32::try_from(int_key("w")?).map_err(|_| GlintError::LengthOverflow)?;
    let height = u32::try_from(int_key("h")?).map_err(|_| GlintError::LengthOverflow)?;
    let format_name = dict
        .get(b"fmt".as_slice())
        .and_then(Value::as_str)
        .ok_or_else(|| GlintError::invalid("missing string key \"fmt\""))?;
    let format = PixelFormat::from_name(format_name)?;

    let plane_count = usize::try_from(int_key("planes")?).map_err(|_| GlintError::LengthOverflow)?;
    if plane_count != format.plane_count() {
        return Err(GlintError::invalid(format!(
            "format {} has {} planes, description claims {plane_count}",
            format.name(),
            format.plane_count()
        )));
    }

    let strides = dict
        .get(b"strides".as_slice())
        .and_then(Value::as_list)
        .ok_or_else(|| GlintError::invalid("missing list key \"strides\""))?;
    if strides.len() != plane_count {
        return Err(GlintError::invalid(format!(
            "expected {plane_count} strides, got {}",
            strides.len()
        )));
    }

    let data = dict
        .get(b"data".as_slice())
        .ok_or_else(|| GlintError::invalid("missing key \"data\""))?;
    let plane_data: Vec<&[u8]> = match (plane_count, data) {
        (1, Value::Bytes(bytes)) => vec![bytes.as_slice()],
        (1, _) => {
            return Err(GlintError::invalid(
                "packed data must be a single byte string",
            ))
        }
        (_, Value::List(items)) => {
            if items.len() != plane_count {
                return Err(GlintError::invalid(format!(
                    "expected {plane_count} data planes, got {}",
                    items.len()
                )));
            }
            items
                .iter()
                .map(|item| {
                    item.as_bytes()
                        .ok_or_else(|| GlintError::invalid("plane data must be a byte string"))
                })
                .collect::<Result<_>>()?
        }
        _ => {
            return Err(GlintError::invalid(
                "planar data must be a list of byte strings",
            ))
        }
    };

    let mut descs = Vec::with_capacity(plane_count);
    for (p, (stride_value, bytes)) in strides.iter().zip(plane_data).enumerate() {
        let stride = usize::try_from(
            stride_value
                .as_int()
                .ok_or_else(|| GlintError::invalid("stride must be an integer"))?,
        )
        .map_err(|_| GlintError::LengthOverflow)?;

        if stride < format.min_stride(width, p) {
            return Err(GlintError::invalid(format!(
                "plane {p} stride {stride} below row size {}",
                format.min_stride(width, p)
            )));
        }
        let (pw, ph) = format.plane_dimensions(width, height, p);
        let expected = stride * (ph as usize).saturating_sub(1)
            + pw as usize * format.bytes_per_pixel(p);
        if bytes.len() != expected {
            return Err(GlintError::invalid(format!(
                "plane {p} carries {} bytes, geometry needs {expected}",
                bytes.len()
            )));
        }
        descs.push(PlaneDesc {
            buffer: Arc::new(AlignedBuffer::from_bytes(bytes)?),
            offset: 0,
            stride,
        });
    }

    PixelBuffer::with_planes(width, height, format, descs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;
    use crate::encode::encode;

    fn sample_packed() -> PixelBuffer {
        let mut buf = PixelBuffer::allocate(16, 8, PixelFormat::Bgrx).unwrap();
        let stride = buf.plane_stride(0).unwrap();
        let plane = buf.plane_mut(0).unwrap();
        for y in 0..8usize {
            for x in 0..64usize {
                plane[y * stride + x] = (x ^ y) as u8;
            }
        }
        buf
    }

    #[test]
    fn test_packed_round_trip() {
        let original = sample_packed();
        let value = pixel_buffer_to_value(&original).unwrap();
        let bytes = encode(&value);
        let (back, consumed) = decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());

        let rebuilt = pixel_buffer_from_value(&back).unwrap();
        assert_eq!(rebuilt.width(), 16);
        assert_eq!(rebuilt.height(), 8);
        assert_eq!(rebuilt.format(), PixelFormat::Bgrx);
        assert_eq!(rebuilt.plane(0).unwrap(), original.plane(0).unwrap());
    }

    #[test]
    fn test_planar_round_trip() {
        let mut original = PixelBuffer::allocate(16, 8, PixelFormat::Yuv420p).unwrap();
        for p in 0..3 {
            let fill = 50 * (p as u8 + 1);
            original.plane_mut(p).unwrap().fill(fill);
        }
        let value = pixel_buffer_to_value(&original).unwrap();
        let rebuilt = pixel_buffer_from_value(&value).unwrap();
        assert_eq!(rebuilt.plane_count(), 3);
        for p in 0..3 {
            assert_eq!(rebuilt.plane(p).unwrap(), original.plane(p).unwrap());
        }
    }

    #[test]
    fn test_description_has_expected_keys() {
        let value = pixel_buffer_to_value(&sample_packed()).unwrap();
        assert_eq!(value.get("w").and_then(Value::as_int), Some(16));
        assert_eq!(value.get("h").and_then(Value::as_int), Some(8));
        assert_eq!(value.get("fmt").and_then(Value::as_str), Some("BGRX"));
        assert_eq!(value.get("planes").and_then(Value::as_int), Some(1));
        assert!(value.get("strides").and_then(Value::as_list).is_some());
        assert!(value.get("data").and_then(Value::as_bytes).is_some());
    }

    #[test]
    fn test_bad_stride_rejected() {
        let mut value = pixel_buffer_to_value(&sample_packed()).unwrap();
        value.insert("strides", Value::List(vec![Value::Int(8)]));
        assert!(pixel_buffer_from_value(&value).is_err());
    }

    #[test]
    fn test_wrong_plane_count_rejected() {
        let mut value = pixel_buffer_to_value(&sample_packed()).unwrap();
        value.insert("planes", Value::Int(3));
        assert!(pixel_buffer_from_value(&value).is_err());
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut value = pixel_buffer_to_value(&sample_packed()).unwrap();
        value.insert("fmt", Value::string("YUY2"));
        assert!(pixel_buffer_from_value(&value).is_err());
    }

    #[test]
    fn test_short_data_rejected() {
        let mut value = pixel_buffer_to_value(&sample_packed()).unwrap();
        value.insert("data", Value::Bytes(vec![0; 16]));
        assert!(pixel_buffer_from_value(&value).is_err());
    }
}
