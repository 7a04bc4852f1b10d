//! The trapezoidal map and its search structure.

use std::fmt;

mod bounding_box;
mod dag;
mod query;
mod trap_map;
mod trapezoid;

pub use bounding_box::BoundingBox;
pub use query::Response;
pub use trap_map::{Stats, TrapMap};
pub use trapezoid::{Neighbors, Trapezoid};

/// Index of a [`Trapezoid`] in a [`TrapMap`].
///
/// Indices of retired trapezoids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrapId(pub(crate) usize);

/// Index of a [`Segment`](crate::Segment) in a [`TrapMap`].
///
/// The four sides of the bounding box come first, in the order left, right, top, bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub(crate) usize);

impl TrapId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl SegmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TrapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
