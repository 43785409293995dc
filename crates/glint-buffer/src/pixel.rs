//! Typed multi-plane image views over aligned storage.

use std::sync::Arc;

use smallvec::SmallVec;

use glint_core::{align_up, ColorPrimaries, ColorRange, GlintError, PixelFormat, Result};

use crate::aligned::{AlignedBuffer, SharedBuffer};

/// One plane's placement inside its backing buffer.
#[derive(Debug, Clone)]
pub struct PlaneDesc {
    /// Backing storage; several planes may share one buffer.
    pub buffer: SharedBuffer,
    /// Byte offset of the plane's first row.
    pub offset: usize,
    /// Bytes per row, at least the row's pixel bytes.
    pub stride: usize,
}

/// A rectangular image described by format, geometry and plane storage.
///
/// Producers hand a `PixelBuffer` to consumers by move. Concurrent readers
/// are fine as long as everyone treats the planes read-only; mutation
/// requires exclusive ownership of the plane's backing buffer.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    range: ColorRange,
    primaries: ColorPrimaries,
    planes: SmallVec<[PlaneDesc; 4]>,
}

impl PixelBuffer {
    /// Create a single-plane buffer over packed pixel data.
    ///
    /// # Errors
    /// - [`GlintError::InvalidArgument`] for planar formats, a stride
    ///   smaller than the row, or data that does not fit `buffer`
    pub fn packed(
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
        buffer: SharedBuffer,
    ) -> Result<Self> {
        if format.is_planar() {
            return Err(GlintError::invalid(format!(
                "packed constructor used with planar format {}",
                format.name()
            )));
        }
        Self::with_planes(
            width,
            height,
            format,
            vec![PlaneDesc {
                buffer,
                offset: 0,
                stride,
            }],
        )
    }

    /// Create a planar buffer from one backing buffer per plane.
    ///
    /// # Errors
    /// - [`GlintError::InvalidArgument`] if the stride or buffer count does
    ///   not match the format, or any plane does not fit its buffer
    pub fn planar(
        width: u32,
        height: u32,
        strides: &[usize],
        format: PixelFormat,
        buffers: Vec<SharedBuffer>,
    ) -> Result<Self> {
        let planes = format.plane_count();
        if strides.len() != planes || buffers.len() != planes {
            return Err(GlintError::invalid(format!(
                "format {} requires {} planes, got {} strides and {} buffers",
                format.name(),
                planes,
                strides.len(),
                buffers.len()
            )));
        }
        let descs = buffers
            .into_iter()
            .zip(strides)
            .map(|(buffer, &stride)| PlaneDesc {
                buffer,
                offset: 0,
                stride,
            })
            .collect();
        Self::with_planes(width, height, format, descs)
    }

    /// Create a buffer from explicit plane placements.
    ///
    /// This is the general constructor: the converter uses it to describe
    /// several planes inside one backing allocation.
    pub fn with_planes(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: Vec<PlaneDesc>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GlintError::invalid(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if planes.len() != format.plane_count() {
            return Err(GlintError::invalid(format!(
                "format {} requires {} planes, got {}",
                format.name(),
                format.plane_count(),
                planes.len()
            )));
        }
        for (p, desc) in planes.iter().enumerate() {
            let (pw, ph) = format.plane_dimensions(width, height, p);
            let row_bytes = pw as usize * format.bytes_per_pixel(p);
            if desc.stride < row_bytes {
                return Err(GlintError::invalid(format!(
                    "plane {p} stride {} below row size {row_bytes}",
                    desc.stride
                )));
            }
            let extent = desc.offset + desc.stride * (ph as usize - 1) + row_bytes;
            if extent > desc.buffer.len() {
                return Err(GlintError::invalid(format!(
                    "plane {p} extends to byte {extent} beyond buffer of {} bytes",
                    desc.buffer.len()
                )));
            }
        }
        Ok(Self {
            width,
            height,
            format,
            range: ColorRange::default(),
            primaries: ColorPrimaries::default(),
            planes: planes.into(),
        })
    }

    /// Allocate a zeroed buffer for `width` x `height` pixels of `format`,
    /// one owned 64-byte-aligned buffer per plane with padded strides.
    pub fn allocate(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let mut planes = Vec::with_capacity(format.plane_count());
        for p in 0..format.plane_count() {
            let (pw, ph) = format.plane_dimensions(width, height, p);
            let stride = align_up(pw as usize * format.bytes_per_pixel(p));
            let buffer = AlignedBuffer::allocate(stride * ph as usize)?;
            planes.push(PlaneDesc {
                buffer: Arc::new(buffer),
                offset: 0,
                stride,
            });
        }
        Self::with_planes(width, height, format, planes)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Sample range attribute.
    #[inline]
    pub fn range(&self) -> ColorRange {
        self.range
    }

    /// Colour primaries attribute.
    #[inline]
    pub fn primaries(&self) -> ColorPrimaries {
        self.primaries
    }

    /// Set the sample range attribute.
    pub fn set_range(&mut self, range: ColorRange) {
        self.range = range;
    }

    /// Set the colour primaries attribute.
    pub fn set_primaries(&mut self, primaries: ColorPrimaries) {
        self.primaries = primaries;
    }

    /// Number of planes.
    #[inline]
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    fn check_plane(&self, plane: usize) -> Result<&PlaneDesc> {
        self.planes.get(plane).ok_or(GlintError::OutOfRange {
            index: plane,
            limit: self.planes.len(),
        })
    }

    /// Width in pixels of plane `plane`.
    pub fn plane_width(&self, plane: usize) -> Result<u32> {
        self.check_plane(plane)?;
        Ok(self.format.plane_dimensions(self.width, self.height, plane).0)
    }

    /// Height in rows of plane `plane`.
    pub fn plane_height(&self, plane: usize) -> Result<u32> {
        self.check_plane(plane)?;
        Ok(self.format.plane_dimensions(self.width, self.height, plane).1)
    }

    /// Bytes per row of plane `plane`.
    pub fn plane_stride(&self, plane: usize) -> Result<usize> {
        Ok(self.check_plane(plane)?.stride)
    }

    fn plane_len(&self, plane: usize) -> usize {
        let desc = &self.planes[plane];
        let (pw, ph) = self.format.plane_dimensions(self.width, self.height, plane);
        let row_bytes = pw as usize * self.format.bytes_per_pixel(plane);
        desc.stride * (ph as usize - 1) + row_bytes
    }

    /// Read-only view of plane `plane`, covering `height` rows at the
    /// plane's stride.
    pub fn plane(&self, plane: usize) -> Result<&[u8]> {
        let desc = self.check_plane(plane)?;
        let len = self.plane_len(plane);
        Ok(&desc.buffer.as_slice()[desc.offset..desc.offset + len])
    }

    /// Mutable view of plane `plane`.
    ///
    /// # Errors
    /// - [`GlintError::OutOfRange`] for a bad plane index
    /// - [`GlintError::InvalidArgument`] when the backing buffer is shared
    ///   with another owner and cannot be written safely
    pub fn plane_mut(&mut self, plane: usize) -> Result<&mut [u8]> {
        self.check_plane(plane)?;
        let len = self.plane_len(plane);
        let desc = &mut self.planes[plane];
        let offset = desc.offset;
        let buffer = Arc::get_mut(&mut desc.buffer)
            .ok_or_else(|| GlintError::invalid("plane storage is shared, cannot write"))?;
        Ok(&mut buffer.as_mut_slice()[offset..offset + len])
    }

    /// Copy every plane into fresh owned buffers.
    ///
    /// Needed when a consumer outlives the producer's frame pool: the deep
    /// clone keeps the geometry but drops all ties to foreign storage.
    pub fn clone_deep(&self) -> Result<Self> {
        let mut planes = Vec::with_capacity(self.planes.len());
        for (p, desc) in self.planes.iter().enumerate() {
            let len = self.plane_len(p);
            let src = &desc.buffer.as_slice()[desc.offset..desc.offset + len];
            planes.push(PlaneDesc {
                buffer: Arc::new(AlignedBuffer::from_bytes(src)?),
                offset: 0,
                stride: desc.stride,
            });
        }
        let mut copy = Self::with_planes(self.width, self.height, self.format, planes)?;
        copy.range = self.range;
        copy.primaries = self.primaries;
        Ok(copy)
    }
}
