//! Pixel format descriptions.
//!
//! Every format carries its packing (packed vs planar), plane count,
//! per-plane bytes per pixel and chroma subsampling divisors. Kernels and
//! constructors consult these tables instead of trusting caller-supplied
//! geometry.

use serde::{Deserialize, Serialize};

use crate::error::{GlintError, Result};

/// Maximum number of planes any supported format uses.
pub const MAX_PLANES: usize = 4;

/// Pixel format enumeration.
///
/// Packed formats store one interleaved plane; planar formats store two to
/// four independent planes. Channel letters read in memory order, `X`
/// marking a padding byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Packed 8-bit R, G, B (24 bits per pixel)
    Rgb,
    /// Packed 8-bit B, G, R (24 bits per pixel)
    Bgr,
    /// Packed 8-bit R, G, B, padding
    Rgbx,
    /// Packed 8-bit B, G, R, padding
    Bgrx,
    /// Packed 8-bit padding, R, G, B
    Xrgb,
    /// Packed 8-bit padding, B, G, R
    Xbgr,
    /// Packed 8-bit R, G, B, A
    Rgba,
    /// Packed 8-bit B, G, R, A
    Bgra,
    /// Packed 8-bit A, B, G, R
    Abgr,
    /// Packed 8-bit A, R, G, B
    Argb,
    /// Packed 10-bit RGB in a 32-bit big-endian word (broadcast "r210")
    R210,
    /// Packed 5-6-5 bit B, G, R in a 16-bit word
    Bgr565,
    /// Planar 8-bit YUV 4:2:0 (I420): Y plane, then quarter-size U and V
    Yuv420p,
    /// Planar 8-bit YUV 4:2:2 (I422): chroma halved horizontally only
    Yuv422p,
    /// Planar 8-bit YUV 4:4:4 (I444): no chroma subsampling
    Yuv444p,
    /// Two-plane 8-bit YUV 4:2:0: Y plane, then interleaved UV pairs
    Nv12,
    /// Planar 8-bit G, B, R
    Gbrp,
    /// Planar 9-bit G, B, R in 16-bit little-endian samples
    Gbrp9le,
    /// Planar 8-bit R, G, B, A (channel-split RGBA)
    Rgbap,
}

/// Full-range vs studio-range sample mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorRange {
    /// Samples span 0-255.
    #[default]
    Full,
    /// Samples span 16-235 (luma) / 16-240 (chroma).
    Studio,
}

/// Colour primaries, carried opaquely for downstream encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorPrimaries {
    #[default]
    Unspecified,
    Bt601,
    Bt709,
    Bt2020,
}

/// Byte positions of the colour channels inside one packed 8-bit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbLayout {
    pub r: usize,
    pub g: usize,
    pub b: usize,
    /// Position of the alpha byte, if the format carries one.
    pub a: Option<usize>,
}

impl PixelFormat {
    /// Number of planes for this format.
    pub fn plane_count(self) -> usize {
        match self {
            Self::Rgb
            | Self::Bgr
            | Self::Rgbx
            | Self::Bgrx
            | Self::Xrgb
            | Self::Xbgr
            | Self::Rgba
            | Self::Bgra
            | Self::Abgr
            | Self::Argb
            | Self::R210
            | Self::Bgr565 => 1,
            Self::Nv12 => 2,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Gbrp | Self::Gbrp9le => 3,
            Self::Rgbap => 4,
        }
    }

    /// Whether this format stores more than one plane.
    #[inline]
    pub fn is_planar(self) -> bool {
        self.plane_count() > 1
    }

    /// Bytes per pixel in plane `plane`.
    ///
    /// For NV12's interleaved chroma plane this is the two bytes of a UV
    /// pair; for 16-bit planar samples it is two.
    pub fn bytes_per_pixel(self, plane: usize) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgbx
            | Self::Bgrx
            | Self::Xrgb
            | Self::Xbgr
            | Self::Rgba
            | Self::Bgra
            | Self::Abgr
            | Self::Argb
            | Self::R210 => 4,
            Self::Bgr565 => 2,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Gbrp | Self::Rgbap => 1,
            Self::Nv12 => {
                if plane == 0 {
                    1
                } else {
                    2
                }
            }
            Self::Gbrp9le => 2,
        }
    }

    /// Chroma subsampling divisors `(xdiv, ydiv)` for plane `plane`.
    pub fn subsampling(self, plane: usize) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 => {
                if plane == 0 {
                    (1, 1)
                } else {
                    (2, 2)
                }
            }
            Self::Yuv422p => {
                if plane == 0 {
                    (1, 1)
                } else {
                    (2, 1)
                }
            }
            _ => (1, 1),
        }
    }

    /// Semantic bits per pixel.
    pub fn depth(self) -> u8 {
        match self {
            Self::Rgb | Self::Bgr | Self::Rgbx | Self::Bgrx | Self::Xrgb | Self::Xbgr => 24,
            Self::Rgba | Self::Bgra | Self::Abgr | Self::Argb | Self::Rgbap => 32,
            Self::R210 => 30,
            Self::Bgr565 => 16,
            Self::Yuv420p => 12,
            Self::Yuv422p => 16,
            Self::Yuv444p | Self::Gbrp => 24,
            Self::Nv12 => 12,
            Self::Gbrp9le => 27,
        }
    }

    /// Whether the format carries a meaningful alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Rgba | Self::Bgra | Self::Abgr | Self::Argb | Self::Rgbap
        )
    }

    /// Dimensions of plane `plane` for a `width` x `height` image.
    ///
    /// Subsampled plane dimensions round up, so odd sizes keep their last
    /// chroma sample.
    pub fn plane_dimensions(self, width: u32, height: u32, plane: usize) -> (u32, u32) {
        let (xdiv, ydiv) = self.subsampling(plane);
        (width.div_ceil(xdiv), height.div_ceil(ydiv))
    }

    /// Minimum bytes per row of plane `plane` for a `width`-pixel image.
    pub fn min_stride(self, width: u32, plane: usize) -> usize {
        let (pw, _) = self.plane_dimensions(width, 1, plane);
        pw as usize * self.bytes_per_pixel(plane)
    }

    /// Channel byte positions for packed 8-bit RGB formats.
    ///
    /// Returns `None` for planar formats and for packings that are not
    /// byte-addressable (`R210`, `Bgr565`).
    pub fn rgb_layout(self) -> Option<RgbLayout> {
        let (r, g, b, a) = match self {
            Self::Rgb | Self::Rgbx => (0, 1, 2, None),
            Self::Bgr | Self::Bgrx => (2, 1, 0, None),
            Self::Xrgb => (1, 2, 3, None),
            Self::Xbgr => (3, 2, 1, None),
            Self::Rgba => (0, 1, 2, Some(3)),
            Self::Bgra => (2, 1, 0, Some(3)),
            Self::Abgr => (3, 2, 1, Some(0)),
            Self::Argb => (1, 2, 3, Some(0)),
            _ => return None,
        };
        Some(RgbLayout { r, g, b, a })
    }

    /// Wire name of the format, as carried in control messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Bgr => "BGR",
            Self::Rgbx => "RGBX",
            Self::Bgrx => "BGRX",
            Self::Xrgb => "XRGB",
            Self::Xbgr => "XBGR",
            Self::Rgba => "RGBA",
            Self::Bgra => "BGRA",
            Self::Abgr => "ABGR",
            Self::Argb => "ARGB",
            Self::R210 => "r210",
            Self::Bgr565 => "BGR565",
            Self::Yuv420p => "YUV420P",
            Self::Yuv422p => "YUV422P",
            Self::Yuv444p => "YUV444P",
            Self::Nv12 => "NV12",
            Self::Gbrp => "GBRP",
            Self::Gbrp9le => "GBRP9LE",
            Self::Rgbap => "RGBAP",
        }
    }

    /// Parse a wire name back into a format.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "RGB" => Self::Rgb,
            "BGR" => Self::Bgr,
            "RGBX" => Self::Rgbx,
            "BGRX" => Self::Bgrx,
            "XRGB" => Self::Xrgb,
            "XBGR" => Self::Xbgr,
            "RGBA" => Self::Rgba,
            "BGRA" => Self::Bgra,
            "ABGR" => Self::Abgr,
            "ARGB" => Self::Argb,
            "r210" => Self::R210,
            "BGR565" => Self::Bgr565,
            "YUV420P" => Self::Yuv420p,
            "YUV422P" => Self::Yuv422p,
            "YUV444P" => Self::Yuv444p,
            "NV12" => Self::Nv12,
            "GBRP" => Self::Gbrp,
            "GBRP9LE" => Self::Gbrp9le,
            "RGBAP" => Self::Rgbap,
            other => {
                return Err(GlintError::invalid(format!("unknown pixel format {other:?}")));
            }
        })
    }
}
