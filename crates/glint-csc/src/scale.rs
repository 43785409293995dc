//! Plane scaling filters.
//!
//! Filters operate on one plane at a time, treating a pixel as `bpp`
//! independent byte channels. That holds for every 8-bit packing and for
//! planar samples; word-packed formats (`r210`, `BGR565`) must use nearest,
//! which moves whole pixels.

use serde::{Deserialize, Serialize};

/// Scaling filter, selected from the converter's speed setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleFilter {
    /// Whole-pixel picks, fastest and lowest quality.
    Nearest,
    /// Two-tap interpolation per axis.
    Bilinear,
    /// Source-box averaging, best for downscales.
    Box,
}

impl ScaleFilter {
    /// Map a speed percentage to a filter: fast settings trade quality.
    pub fn from_speed(speed: u32) -> Self {
        if speed > 66 {
            Self::Nearest
        } else if speed > 33 {
            Self::Bilinear
        } else {
            Self::Box
        }
    }
}

/// Scale one plane. `bpp` bytes per pixel move together for nearest;
/// bilinear and box filter each byte channel separately.
#[allow(clippy::too_many_arguments)]
pub fn scale_plane(
    src: &[u8],
    src_stride: usize,
    src_w: u32,
    src_h: u32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_w: u32,
    dst_h: u32,
    bpp: usize,
    filter: ScaleFilter,
) {
    match filter {
        ScaleFilter::Nearest => {
            nearest(src, src_stride, src_w, src_h, dst, dst_stride, dst_w, dst_h, bpp);
        }
        ScaleFilter::Bilinear => {
            bilinear(src, src_stride, src_w, src_h, dst, dst_stride, dst_w, dst_h, bpp);
        }
        ScaleFilter::Box => {
            box_filter(src, src_stride, src_w, src_h, dst, dst_stride, dst_w, dst_h, bpp);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn nearest(
    src: &[u8],
    src_stride: usize,
    src_w: u32,
    src_h: u32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_w: u32,
    dst_h: u32,
    bpp: usize,
) {
    for dy in 0..dst_h as usize {
        let sy = (dy * src_h as usize) / dst_h as usize;
        let src_row = &src[sy * src_stride..];
        let dst_row = &mut dst[dy * dst_stride..];
        for dx in 0..dst_w as usize {
            let sx = (dx * src_w as usize) / dst_w as usize;
            dst_row[dx * bpp..(dx + 1) * bpp].copy_from_slice(&src_row[sx * bpp..(sx + 1) * bpp]);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn bilinear(
    src: &[u8],
    src_stride: usize,
    src_w: u32,
    src_h: u32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_w: u32,
    dst_h: u32,
    bpp: usize,
) {
    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h as usize {
        let fy = ((dy as f32 + 0.5) * y_ratio - 0.5).max(0.0);
        let y0 = (fy as usize).min(src_h as usize - 1);
        let y1 = (y0 + 1).min(src_h as usize - 1);
        let wy = fy - y0 as f32;

        let dst_row = &mut dst[dy * dst_stride..];
        for dx in 0..dst_w as usize {
            let fx = ((dx as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let x0 = (fx as usize).min(src_w as usize - 1);
            let x1 = (x0 + 1).min(src_w as usize - 1);
            let wx = fx - x0 as f32;

            for c in 0..bpp {
                let s00 = src[y0 * src_stride + x0 * bpp + c] as f32;
                let s01 = src[y0 * src_stride + x1 * bpp + c] as f32;
                let s10 = src[y1 * src_stride + x0 * bpp + c] as f32;
                let s11 = src[y1 * src_stride + x1 * bpp + c] as f32;
                let top = s00 + (s01 - s00) * wx;
                let bottom = s10 + (s11 - s10) * wx;
                dst_row[dx * bpp + c] = (top + (bottom - top) * wy + 0.5) as u8;
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn box_filter(
    src: &[u8],
    src_stride: usize,
    src_w: u32,
    src_h: u32,
    dst: &mut [u8],
    dst_stride: usize,
    dst_w: u32,
    dst_h: u32,
    bpp: usize,
) {
    let sw = src_w as usize;
    let sh = src_h as usize;
    let dw = dst_w as usize;
    let dh = dst_h as usize;

    for dy in 0..dh {
        let y_start = dy * sh / dh;
        let y_end = (((dy + 1) * sh).div_ceil(dh)).min(sh).max(y_start + 1);
        let dst_row = &mut dst[dy * dst_stride..];
        for dx in 0..dw {
            let x_start = dx * sw / dw;
            let x_end = (((dx + 1) * sw).div_ceil(dw)).min(sw).max(x_start + 1);
            let count = ((y_end - y_start) * (x_end - x_start)) as u32;
            for c in 0..bpp {
                let mut acc = 0u32;
                for sy in y_start..y_end {
                    for sx in x_start..x_end {
                        acc += src[sy * src_stride + sx * bpp + c] as u32;
                    }
                }
                dst_row[dx * bpp + c] = ((acc + count / 2) / count) as u8;
            }
        }
    }
}
