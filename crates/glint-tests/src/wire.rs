//! Integration tests for the wire surface.
//!
//! Control messages carry scroll results, damage regions and pixel buffer
//! descriptions between server and client; both directions must agree on
//! the canonical bytes.

use glint_buffer::PixelBuffer;
use glint_codec::{
    decode, encode, pixel_buffer_from_value, pixel_buffer_to_value, FromBencode, ToBencode, Value,
};
use glint_core::{GlintError, PixelFormat, Rect};
use glint_region::RegionSet;
use glint_scroll::{RowSpan, ScrollMove};

// ── Canonical bytes ────────────────────────────────────────────

#[test]
fn canonical_dictionary_example() {
    let mut value = Value::dict();
    value.insert("foo", Value::Int(42));
    value.insert(
        "bar",
        Value::List(vec![Value::string("a"), Value::string("b")]),
    );
    assert_eq!(encode(&value), b"d3:barl1:a1:be3:fooi42ee");
}

#[test]
fn rejection_cases() {
    assert!(matches!(
        decode(b"i-0e").unwrap_err(),
        GlintError::MalformedInput { .. }
    ));
    assert!(matches!(
        decode(b"i03e").unwrap_err(),
        GlintError::MalformedInput { .. }
    ));
    assert!(matches!(decode(b"5:abc").unwrap_err(), GlintError::Truncated));
}

// ── Damage region messages ─────────────────────────────────────

#[test]
fn region_subtraction_survives_the_wire() {
    let mut damage = RegionSet::new();
    damage.add(Rect::from_xywh(0, 0, 100, 100));
    damage.remove(Rect::from_xywh(25, 25, 50, 50));
    assert_eq!(damage.area(), 100 * 100 - 50 * 50);

    let rects: Vec<Rect> = damage.iter().collect();
    let message = rects.to_bencode().unwrap();
    let bytes = encode(&message);

    let (back, consumed) = decode(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    let rebuilt = Vec::<Rect>::from_bencode(&back).unwrap();
    assert_eq!(rebuilt, rects);

    let mut region = RegionSet::new();
    for rect in rebuilt {
        region.add(rect);
    }
    assert_eq!(region.area(), 7500);
    assert!(!region.contains(Rect::from_xywh(30, 30, 10, 10)));
}

#[test]
fn scroll_result_message_round_trips() {
    let scrolls = vec![
        ScrollMove {
            shift: -10,
            start: 0,
            count: 80,
        },
        ScrollMove {
            shift: 3,
            start: 90,
            count: 6,
        },
    ];
    let residuals = vec![RowSpan {
        start: 80,
        count: 10,
    }];

    let mut message = Value::dict();
    message.insert("scrolls", scrolls.to_bencode().unwrap());
    message.insert("residuals", residuals.to_bencode().unwrap());
    let bytes = encode(&message);

    let (back, _) = decode(&bytes).unwrap();
    let scroll_back =
        Vec::<ScrollMove>::from_bencode(back.get("scrolls").unwrap()).unwrap();
    let residual_back =
        Vec::<RowSpan>::from_bencode(back.get("residuals").unwrap()).unwrap();
    assert_eq!(scroll_back, scrolls);
    assert_eq!(residual_back, residuals);
}

// ── Pixel buffer descriptions ──────────────────────────────────

#[test]
fn pixel_buffer_crosses_the_wire_intact() {
    let mut original = PixelBuffer::allocate(24, 12, PixelFormat::Yuv420p).unwrap();
    for p in 0..3 {
        let stride = original.plane_stride(p).unwrap();
        let plane = original.plane_mut(p).unwrap();
        for (i, byte) in plane.iter_mut().enumerate() {
            *byte = ((i / stride) * 3 + p) as u8;
        }
    }

    let bytes = encode(&pixel_buffer_to_value(&original).unwrap());
    let (value, consumed) = decode(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());

    let rebuilt = pixel_buffer_from_value(&value).unwrap();
    assert_eq!(rebuilt.width(), 24);
    assert_eq!(rebuilt.height(), 12);
    assert_eq!(rebuilt.format(), PixelFormat::Yuv420p);
    for p in 0..3 {
        assert_eq!(rebuilt.plane(p).unwrap(), original.plane(p).unwrap());
        assert_eq!(
            rebuilt.plane_stride(p).unwrap(),
            original.plane_stride(p).unwrap()
        );
    }
}

#[test]
fn tampered_description_is_rejected() {
    let buf = PixelBuffer::allocate(16, 8, PixelFormat::Bgrx).unwrap();
    let mut value = pixel_buffer_to_value(&buf).unwrap();
    // A peer lying about the stride must not panic the receiver.
    value.insert("strides", Value::List(vec![Value::Int(1)]));
    assert!(pixel_buffer_from_value(&value).is_err());

    let mut value = pixel_buffer_to_value(&buf).unwrap();
    value.insert("w", Value::Int(1 << 40));
    assert!(pixel_buffer_from_value(&value).is_err());
}
