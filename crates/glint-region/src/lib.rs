//! Glint Region - rectangle set algebra
//!
//! Maintains the damage tracker's list of dirty rectangles under the
//! invariant that no two members overlap. Subtraction prefers wide
//! rectangles, which compress better downstream.

pub mod region;

pub use region::{subtract, RegionSet};
