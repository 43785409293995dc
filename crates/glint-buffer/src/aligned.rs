//! Cache-line-aligned byte buffers with a destructor hook.
//!
//! External decode engines (AV1, H.264, NVENC surfaces) write directly into
//! these buffers, so the base address must sit on a 64-byte boundary. The
//! buffer either owns its allocation or wraps memory owned by a foreign
//! frame pool, in which case releasing the last reference invokes the
//! pool's deallocation callback exactly once.

use std::iter;
use std::ptr::NonNull;
use std::sync::Arc;

use aligned_vec::{ABox, AVec, ConstAlign};

use glint_core::{align_up, GlintError, Result, BUFFER_ALIGNMENT};

/// Deallocation callback for foreign memory.
///
/// Invoked as `dtor(ptr, len, cookie)` with the exact values passed to
/// [`AlignedBuffer::wrap`].
pub type DeallocFn = unsafe fn(ptr: *mut u8, len: usize, cookie: usize);

enum Storage {
    Owned(ABox<[u8], ConstAlign<BUFFER_ALIGNMENT>>),
    Foreign {
        ptr: NonNull<u8>,
        len: usize,
        dtor: DeallocFn,
        cookie: usize,
    },
}

/// A fixed-length byte buffer whose base address is aligned to 64 bytes.
///
/// Shared ownership goes through [`SharedBuffer`]; the contents are only
/// writable while the handle is unique.
pub struct AlignedBuffer {
    storage: Storage,
}

/// Reference-counted handle to an [`AlignedBuffer`].
pub type SharedBuffer = Arc<AlignedBuffer>;

// SAFETY: Owned storage is plain bytes. Foreign storage is exclusively
// owned per the `wrap` contract, which also requires the destructor to be
// callable from any thread.
unsafe impl Send for AlignedBuffer {}
// SAFETY: shared access only hands out `&[u8]`; mutation requires `&mut`.
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate a zero-initialised buffer of `len` bytes.
    ///
    /// # Errors
    /// - [`GlintError::OutOfMemory`] if the request cannot be represented
    ///   or satisfied. No partial allocation takes place.
    pub fn allocate(len: usize) -> Result<Self> {
        // A length the layout cannot express will never allocate.
        if len > isize::MAX as usize - BUFFER_ALIGNMENT {
            return Err(GlintError::OutOfMemory(len));
        }
        let data: AVec<u8, ConstAlign<BUFFER_ALIGNMENT>> =
            AVec::from_iter(BUFFER_ALIGNMENT, iter::repeat(0u8).take(len));
        Ok(Self {
            storage: Storage::Owned(data.into_boxed_slice()),
        })
    }

    /// Allocate a buffer holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = Self::allocate(bytes.len())?;
        buf.as_mut_slice().copy_from_slice(bytes);
        Ok(buf)
    }

    /// Round `size` up to the next alignment multiple.
    #[inline]
    pub const fn pad(size: usize) -> usize {
        align_up(size)
    }

    /// Take ownership of foreign memory.
    ///
    /// Dropping the buffer invokes `dtor(ptr, len, cookie)` exactly once,
    /// on whichever thread releases the last reference.
    ///
    /// # Safety
    /// - `ptr` must point to `len` readable and writable bytes that stay
    ///   valid until `dtor` runs, and nothing else may free them.
    /// - `dtor` must be safe to call from any thread.
    ///
    /// # Errors
    /// - [`GlintError::InvalidArgument`] if `ptr` is null.
    pub unsafe fn wrap(ptr: *mut u8, len: usize, dtor: DeallocFn, cookie: usize) -> Result<Self> {
        let Some(ptr) = NonNull::new(ptr) else {
            return Err(GlintError::invalid("cannot wrap a null pointer"));
        };
        Ok(Self {
            storage: Storage::Foreign {
                ptr,
                len,
                dtor,
                cookie,
            },
        })
    }

    /// Length in bytes. Fixed for the lifetime of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(data) => data.len(),
            Storage::Foreign { len, .. } => *len,
        }
    }

    /// Whether the buffer holds zero bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Base address of the buffer.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        match &self.storage {
            Storage::Owned(data) => data.as_ptr(),
            Storage::Foreign { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Read-only view of the contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(data) => data,
            // SAFETY: the `wrap` contract guarantees `ptr` points to `len`
            // valid bytes for the buffer's lifetime.
            Storage::Foreign { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
        }
    }

    /// Mutable view of the contents.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Owned(data) => data,
            // SAFETY: `&mut self` proves unique access; the `wrap` contract
            // guarantees the memory is valid and writable.
            Storage::Foreign { ptr, len, .. } => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), *len)
            },
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        if let Storage::Foreign {
            ptr,
            len,
            dtor,
            cookie,
        } = self.storage
        {
            tracing::trace!(len, cookie, "releasing foreign buffer");
            // SAFETY: drop runs once, and the `wrap` contract guarantees
            // the callback frees exactly this allocation.
            unsafe { dtor(ptr.as_ptr(), len, cookie) };
        }
    }
}

impl std::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.storage {
            Storage::Owned(_) => "owned",
            Storage::Foreign { .. } => "foreign",
        };
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len())
            .field("kind", &kind)
            .finish()
    }
}
