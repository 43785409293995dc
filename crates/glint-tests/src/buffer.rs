//! Integration tests for buffer lifecycle.
//!
//! Exercises the foreign-memory destructor contract across threads, the
//! way a decoder frame pool would see it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use glint_buffer::{AlignedBuffer, PixelBuffer, SharedBuffer};
use glint_core::{PixelFormat, BUFFER_ALIGNMENT};

// ── Destructor delivery ────────────────────────────────────────

static POOL_RETURNS: AtomicUsize = AtomicUsize::new(0);

unsafe fn return_to_pool(_ptr: *mut u8, len: usize, cookie: usize) {
    POOL_RETURNS.fetch_add(1, Ordering::SeqCst);
    // The cookie carries the pool slot; report it over the channel the
    // test registered.
    REPORT.with_borrow(|tx| {
        if let Some(tx) = tx {
            let _ = tx.send((len, cookie));
        }
    });
}

thread_local! {
    static REPORT: std::cell::RefCell<Option<crossbeam_channel::Sender<(usize, usize)>>> =
        const { std::cell::RefCell::new(None) };
}

#[test]
fn foreign_destructor_runs_once_on_the_dropping_thread() {
    let (tx, rx) = crossbeam_channel::unbounded();
    REPORT.with_borrow_mut(|slot| *slot = Some(tx));

    let mut backing = vec![0u8; 256];
    let ptr = backing.as_mut_ptr();
    // SAFETY: `backing` outlives the wrapped buffer and the callback does
    // not free it.
    let buf = unsafe { AlignedBuffer::wrap(ptr, 256, return_to_pool, 0xABCD).unwrap() };
    let shared: SharedBuffer = Arc::new(buf);

    let before = POOL_RETURNS.load(Ordering::SeqCst);
    let clone = Arc::clone(&shared);
    drop(shared);
    assert_eq!(POOL_RETURNS.load(Ordering::SeqCst), before);

    drop(clone);
    assert_eq!(POOL_RETURNS.load(Ordering::SeqCst), before + 1);
    assert_eq!(rx.try_recv().unwrap(), (256, 0xABCD));

    REPORT.with_borrow_mut(|slot| *slot = None);
}

#[test]
fn shared_buffer_crosses_threads() {
    let shared: SharedBuffer = Arc::new(AlignedBuffer::allocate(4096).unwrap());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let reader = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            assert_eq!(reader.as_ptr() as usize % BUFFER_ALIGNMENT, 0);
            reader.as_slice().iter().map(|&b| b as usize).sum::<usize>()
        }));
    }
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }
}

// ── PixelBuffer over shared storage ────────────────────────────

#[test]
fn deep_clone_detaches_from_shared_storage() {
    let storage: SharedBuffer = Arc::new(AlignedBuffer::allocate(64 * 16).unwrap());
    let holder = Arc::clone(&storage);
    let buf = PixelBuffer::packed(16, 16, 64, PixelFormat::Bgrx, storage).unwrap();

    // The original cannot be written while the pool still holds storage,
    // but the deep clone owns its planes outright.
    let mut copy = buf.clone_deep().unwrap();
    assert!(copy.plane_mut(0).is_ok());
    drop(holder);
    assert_eq!(copy.plane(0).unwrap(), buf.plane(0).unwrap());
}

#[test]
fn consumers_read_planes_concurrently() {
    let mut buf = PixelBuffer::allocate(64, 64, PixelFormat::Yuv420p).unwrap();
    for p in 0..3 {
        let fill = (p as u8 + 1) * 40;
        buf.plane_mut(p).unwrap().fill(fill);
    }
    let shared = Arc::new(buf);
    let mut handles = Vec::new();
    for p in 0..3usize {
        let reader = Arc::clone(&shared);
        handles.push(thread::spawn(move || {
            let expected = (p as u8 + 1) * 40;
            reader.plane(p).unwrap().iter().all(|&b| b == expected)
        }));
    }
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
