//! Conversion kernels.
//!
//! All kernels are straight-line CPU work over validated geometry: callers
//! check strides and dimensions at the boundary, the loops assume them.
//! RGB->YUV uses BT.601 JPEG full-range coefficients in Q15 fixed point;
//! chroma for subsampled outputs averages the 2x2 source block before the
//! matrix. Planar kernels fan out over row bands with rayon but take no
//! locks.

use rayon::prelude::*;

use glint_core::format::RgbLayout;

// BT.601 full-range forward matrix in Q15.
const Y_R: i32 = 9798; // 0.299
const Y_G: i32 = 19235; // 0.587
const Y_B: i32 = 3736; // 0.114
const U_R: i32 = -5529; // -0.168736
const U_G: i32 = -10855; // -0.331264
const U_B: i32 = 16384; // 0.5
const V_R: i32 = 16384; // 0.5
const V_G: i32 = -13720; // -0.418688
const V_B: i32 = -2664; // -0.081312

// BT.601 full-range inverse matrix in Q15.
const R_V: i32 = 45941; // 1.402
const G_U: i32 = -11277; // -0.344136
const G_V: i32 = -23402; // -0.714136
const B_U: i32 = 58065; // 1.772

const Q15_ROUND: i32 = 1 << 14;
const CHROMA_OFFSET: i32 = 128 << 15;

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn luma(r: i32, g: i32, b: i32) -> u8 {
    clamp_u8((Y_R * r + Y_G * g + Y_B * b + Q15_ROUND) >> 15)
}

#[inline]
fn chroma_u(r: i32, g: i32, b: i32) -> u8 {
    clamp_u8((U_R * r + U_G * g + U_B * b + CHROMA_OFFSET + Q15_ROUND) >> 15)
}

#[inline]
fn chroma_v(r: i32, g: i32, b: i32) -> u8 {
    clamp_u8((V_R * r + V_G * g + V_B * b + CHROMA_OFFSET + Q15_ROUND) >> 15)
}

/// Sum of one colour channel over the 2x2 block at `(x, y)`, clamping at
/// the image edge so odd sizes replicate their last row/column.
#[inline]
#[allow(clippy::too_many_arguments)]
fn block_sum(
    src: &[u8],
    stride: usize,
    bpp: usize,
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    channel: usize,
) -> i32 {
    let x1 = (x + 1).min(width - 1);
    let y1 = (y + 1).min(height - 1);
    let sample = |sx: usize, sy: usize| src[sy * stride + sx * bpp + channel] as i32;
    sample(x, y) + sample(x1, y) + sample(x, y1) + sample(x1, y1)
}

/// Convert packed 8-bit RGB into planar YUV 4:2:0.
///
/// `y_out`, `u_out` and `v_out` must each hold their plane's full rows at
/// the given strides.
#[allow(clippy::too_many_arguments)]
pub fn rgb_to_yuv420(
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    layout: RgbLayout,
    bpp: usize,
    y_out: &mut [u8],
    y_stride: usize,
    u_out: &mut [u8],
    u_stride: usize,
    v_out: &mut [u8],
    v_stride: usize,
) {
    let w = width as usize;
    let h = height as usize;

    y_out
        .par_chunks_mut(2 * y_stride)
        .zip(u_out.par_chunks_mut(u_stride))
        .zip(v_out.par_chunks_mut(v_stride))
        .enumerate()
        .for_each(|(band, ((y_rows, u_row), v_row))| {
            let sy = band * 2;
            for dy in 0..2usize.min(h - sy) {
                let src_row = &src[(sy + dy) * src_stride..];
                let y_row = &mut y_rows[dy * y_stride..dy * y_stride + w];
                for (x, out) in y_row.iter_mut().enumerate() {
                    let px = &src_row[x * bpp..];
                    *out = luma(
                        px[layout.r] as i32,
                        px[layout.g] as i32,
                        px[layout.b] as i32,
                    );
                }
            }
            for cx in 0..w.div_ceil(2) {
                let x = cx * 2;
                let r = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.r) + 2) >> 2;
                let g = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.g) + 2) >> 2;
                let b = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.b) + 2) >> 2;
                u_row[cx] = chroma_u(r, g, b);
                v_row[cx] = chroma_v(r, g, b);
            }
        });
}

/// Convert packed 8-bit RGB into two-plane NV12 (Y plane plus interleaved
/// UV pairs).
#[allow(clippy::too_many_arguments)]
pub fn rgb_to_nv12(
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    layout: RgbLayout,
    bpp: usize,
    y_out: &mut [u8],
    y_stride: usize,
    uv_out: &mut [u8],
    uv_stride: usize,
) {
    let w = width as usize;
    let h = height as usize;

    y_out
        .par_chunks_mut(2 * y_stride)
        .zip(uv_out.par_chunks_mut(uv_stride))
        .enumerate()
        .for_each(|(band, (y_rows, uv_row))| {
            let sy = band * 2;
            for dy in 0..2usize.min(h - sy) {
                let src_row = &src[(sy + dy) * src_stride..];
                let y_row = &mut y_rows[dy * y_stride..dy * y_stride + w];
                for (x, out) in y_row.iter_mut().enumerate() {
                    let px = &src_row[x * bpp..];
                    *out = luma(
                        px[layout.r] as i32,
                        px[layout.g] as i32,
                        px[layout.b] as i32,
                    );
                }
            }
            for cx in 0..w.div_ceil(2) {
                let x = cx * 2;
                let r = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.r) + 2) >> 2;
                let g = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.g) + 2) >> 2;
                let b = (block_sum(src, src_stride, bpp, w, h, x, sy, layout.b) + 2) >> 2;
                uv_row[cx * 2] = chroma_u(r, g, b);
                uv_row[cx * 2 + 1] = chroma_v(r, g, b);
            }
        });
}

/// Convert two-plane NV12 into packed 8-bit RGB.
///
/// Padding bytes of alpha-less four-byte formats are set opaque.
#[allow(clippy::too_many_arguments)]
pub fn nv12_to_rgb(
    y_in: &[u8],
    y_stride: usize,
    uv_in: &[u8],
    uv_stride: usize,
    width: u32,
    height: u32,
    dst: &mut [u8],
    dst_stride: usize,
    layout: RgbLayout,
    bpp: usize,
) {
    let w = width as usize;
    let pad = pad_byte(layout, bpp);

    dst.par_chunks_mut(dst_stride)
        .take(height as usize)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let y_row = &y_in[y * y_stride..];
            let uv_row = &uv_in[(y / 2) * uv_stride..];
            for x in 0..w {
                let luma = (y_row[x] as i32) << 15;
                let u = uv_row[(x / 2) * 2] as i32 - 128;
                let v = uv_row[(x / 2) * 2 + 1] as i32 - 128;
                let px = &mut dst_row[x * bpp..(x + 1) * bpp];
                px[layout.r] = clamp_u8((luma + R_V * v + Q15_ROUND) >> 15);
                px[layout.g] = clamp_u8((luma + G_U * u + G_V * v + Q15_ROUND) >> 15);
                px[layout.b] = clamp_u8((luma + B_U * u + Q15_ROUND) >> 15);
                if let Some(pad) = pad {
                    px[pad] = 0xFF;
                }
            }
        });
}

/// Index of the padding byte of an alpha-less four-byte packing.
fn pad_byte(layout: RgbLayout, bpp: usize) -> Option<usize> {
    if bpp != 4 || layout.a.is_some() {
        return None;
    }
    (0..4).find(|&i| i != layout.r && i != layout.g && i != layout.b)
}

/// Split packed RGBA into four planes in R, G, B, A order.
#[allow(clippy::too_many_arguments)]
pub fn rgba_split(
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    layout: RgbLayout,
    bpp: usize,
    planes: [(&mut [u8], usize); 4],
) {
    let w = width as usize;
    let alpha = layout.a.expect("rgba_split requires an alpha channel");
    let channels = [layout.r, layout.g, layout.b, alpha];
    let [(r_out, r_stride), (g_out, g_stride), (b_out, b_stride), (a_out, a_stride)] = planes;
    let outs = [
        (r_out, r_stride),
        (g_out, g_stride),
        (b_out, b_stride),
        (a_out, a_stride),
    ];

    for (channel, (out, stride)) in channels.into_iter().zip(outs) {
        for y in 0..height as usize {
            let src_row = &src[y * src_stride..];
            let out_row = &mut out[y * stride..y * stride + w];
            for (x, sample) in out_row.iter_mut().enumerate() {
                *sample = src_row[x * bpp + channel];
            }
        }
    }
}

/// Copy `height` rows of `row_bytes` between buffers with differing
/// strides.
pub fn copy_plane(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    row_bytes: usize,
    height: u32,
) {
    for y in 0..height as usize {
        let src_row = &src[y * src_stride..y * src_stride + row_bytes];
        let dst_row = &mut dst[y * dst_stride..y * dst_stride + row_bytes];
        dst_row.copy_from_slice(src_row);
    }
}
