//! Glint Buffer - Aligned pixel storage
//!
//! This crate provides the two storage types on the pixel hot path:
//! - [`AlignedBuffer`]: a 64-byte-aligned byte buffer that either owns its
//!   memory or wraps foreign memory with a deallocation callback
//! - [`PixelBuffer`]: a typed multi-plane image view over shared
//!   [`AlignedBuffer`] storage
// Foreign decoder memory requires raw-pointer ownership.
#![allow(unsafe_code)]

pub mod aligned;
pub mod pixel;

pub use aligned::{AlignedBuffer, DeallocFn, SharedBuffer};
pub use pixel::{PixelBuffer, PlaneDesc};
