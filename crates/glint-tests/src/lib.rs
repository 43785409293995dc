//! Integration test crate for the Glint pixel pipeline.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every glint crate to verify they work together.

#[cfg(test)]
mod buffer;

#[cfg(test)]
mod convert;

#[cfg(test)]
mod scroll;

#[cfg(test)]
mod wire;

/// Install a tracing subscriber for test output; safe to call repeatedly.
#[cfg(test)]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
