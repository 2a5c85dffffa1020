//! # Geo
//! Axis-aligned hyper-rectangle geometry used by the point-region index.
//!
//! Everything here is pure and synchronous: there is no I/O and no notion of
//! a backend. `Bound` and `Point` are plain data, cheap to clone, and the
//! arithmetic on them (containment, intersection, child subdivision) is the
//! same regardless of how many dimensions they carry.

mod axis;
mod bound;
mod point;

pub use axis::Axis;
pub use bound::Bound;
pub use point::Point;
