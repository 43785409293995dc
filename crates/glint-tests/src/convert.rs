//! Integration tests for the conversion pipeline.
//!
//! Exercises grabber-shaped input buffers through the converter and
//! checks the acceptance values for the BT.601 full-range matrix.

use glint_buffer::PixelBuffer;
use glint_core::{ColorPrimaries, GlintError, PixelFormat, BUFFER_ALIGNMENT};
use glint_csc::{Converter, ScaleFilter};

use crate::init_tracing;

// ── Helpers ────────────────────────────────────────────────────

fn solid_bgrx(width: u32, height: u32, b: u8, g: u8, r: u8, x: u8) -> PixelBuffer {
    let mut buf = PixelBuffer::allocate(width, height, PixelFormat::Bgrx).unwrap();
    let stride = buf.plane_stride(0).unwrap();
    let plane = buf.plane_mut(0).unwrap();
    for row in 0..height as usize {
        for col in 0..width as usize {
            plane[row * stride + col * 4..row * stride + col * 4 + 4]
                .copy_from_slice(&[b, g, r, x]);
        }
    }
    buf
}

fn assert_plane_solid(buf: &PixelBuffer, plane: usize, expected: u8) {
    let stride = buf.plane_stride(plane).unwrap();
    let width = buf.plane_width(plane).unwrap() as usize;
    let height = buf.plane_height(plane).unwrap() as usize;
    let data = buf.plane(plane).unwrap();
    for row in 0..height {
        for &sample in &data[row * stride..row * stride + width] {
            assert_eq!(sample, expected, "plane {plane} row {row}");
        }
    }
}

// ── Solid-colour acceptance ────────────────────────────────────

#[test]
fn solid_red_bgrx_to_yuv420_hits_reference_values() {
    init_tracing();
    let src = solid_bgrx(16, 16, 0, 0, 255, 0);
    let mut conv =
        Converter::new(16, 16, PixelFormat::Bgrx, 16, 16, PixelFormat::Yuv420p, 50).unwrap();
    let out = conv.convert(&src).unwrap();

    assert_eq!(out.format(), PixelFormat::Yuv420p);
    assert_eq!(out.primaries(), ColorPrimaries::Bt601);
    assert_plane_solid(&out, 0, 76);
    assert_plane_solid(&out, 1, 85);
    assert_plane_solid(&out, 2, 255);
}

#[test]
fn output_geometry_is_encoder_friendly() {
    let src = solid_bgrx(640, 480, 1, 2, 3, 0);
    let mut conv =
        Converter::new(640, 480, PixelFormat::Bgrx, 640, 480, PixelFormat::Yuv420p, 50).unwrap();
    let out = conv.convert(&src).unwrap();

    for p in 0..3 {
        let stride = out.plane_stride(p).unwrap();
        let width = out.plane_width(p).unwrap() as usize;
        assert!(stride >= width);
        assert_eq!(stride % BUFFER_ALIGNMENT, 0);
        assert_eq!(out.plane(p).unwrap().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
    }
}

// ── Boundary conditions ────────────────────────────────────────

#[test]
fn minimum_size_boundary() {
    assert!(Converter::new(8, 2, PixelFormat::Bgrx, 8, 2, PixelFormat::Yuv420p, 50).is_ok());
    for (w, h) in [(7, 2), (8, 1), (0, 0)] {
        let err = Converter::new(w, h, PixelFormat::Bgrx, 8, 2, PixelFormat::Yuv420p, 50)
            .unwrap_err();
        assert!(matches!(err, GlintError::InvalidArgument(_)), "{w}x{h}");
    }
}

#[test]
fn speed_selects_filter_tiers() {
    for (speed, expected) in [
        (100, ScaleFilter::Nearest),
        (67, ScaleFilter::Nearest),
        (66, ScaleFilter::Bilinear),
        (34, ScaleFilter::Bilinear),
        (33, ScaleFilter::Box),
        (0, ScaleFilter::Box),
    ] {
        let conv =
            Converter::new(32, 32, PixelFormat::Bgrx, 16, 16, PixelFormat::Yuv420p, speed)
                .unwrap();
        assert_eq!(conv.filter(), expected, "speed {speed}");
    }
}

// ── Downscale pipeline ─────────────────────────────────────────

#[test]
fn downscaled_conversion_stays_solid() {
    let src = solid_bgrx(64, 64, 0, 0, 255, 0);
    let mut conv =
        Converter::new(64, 64, PixelFormat::Bgrx, 32, 32, PixelFormat::Yuv420p, 0).unwrap();
    for _ in 0..2 {
        let out = conv.convert(&src).unwrap();
        assert_eq!((out.width(), out.height()), (32, 32));
        assert_plane_solid(&out, 0, 76);
        assert_plane_solid(&out, 1, 85);
        assert_plane_solid(&out, 2, 255);
    }
    assert_eq!(conv.stats().frames, 2);
}

// ── Grabber stride handling ────────────────────────────────────

#[test]
fn padded_source_stride_converts_correctly() {
    // A grabber row often carries padding; build a 16x4 image on a
    // 128-byte stride and check the padding never leaks into the output.
    let storage = std::sync::Arc::new(glint_buffer::AlignedBuffer::allocate(128 * 4).unwrap());
    let mut src = PixelBuffer::packed(16, 4, 128, PixelFormat::Bgrx, storage).unwrap();
    {
        let plane = src.plane_mut(0).unwrap();
        plane.fill(0x77); // garbage that lives in the padding
        for row in 0..4usize {
            for col in 0..16usize {
                plane[row * 128 + col * 4..row * 128 + col * 4 + 4]
                    .copy_from_slice(&[0, 0, 255, 0]);
            }
        }
    }
    let mut conv =
        Converter::new(16, 4, PixelFormat::Bgrx, 16, 4, PixelFormat::Yuv420p, 50).unwrap();
    let out = conv.convert(&src).unwrap();
    assert_plane_solid(&out, 0, 76);
    assert_plane_solid(&out, 1, 85);
    assert_plane_solid(&out, 2, 255);
}
