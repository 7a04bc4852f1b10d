use smallvec::SmallVec;

use crate::dcel::VertexId;
use crate::trapezoidal_map::{SegmentId, TrapId};

/// The neighbors of a trapezoid on one of its vertical sides.
///
/// A vertical side has at most two neighbors: the vertex bounding it splits it into a lower and
/// an upper part. When the vertex lies on the top segment, only the lower part exists, and the
/// single neighbor is stored as `lower`. Likewise it is stored as `upper` when the vertex lies on
/// the bottom segment.
///
/// Adjacency is symmetric slot by slot: if `a.right.lower == Some(b)` then
/// `b.left.lower == Some(a)`, and the same goes for `upper`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub lower: Option<TrapId>,
    pub upper: Option<TrapId>,
}

impl Neighbors {
    /// The neighbors ordered bottom-then-top.
    pub fn list(&self) -> SmallVec<[TrapId; 2]> {
        self.lower.iter().chain(self.upper.iter()).copied().collect()
    }

    pub(crate) fn get(&self, slot: Slot) -> Option<TrapId> {
        match slot {
            Slot::Lower => self.lower,
            Slot::Upper => self.upper,
        }
    }

    pub(crate) fn get_mut(&mut self, slot: Slot) -> &mut Option<TrapId> {
        match slot {
            Slot::Lower => &mut self.lower,
            Slot::Upper => &mut self.upper,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Slot {
    Lower,
    Upper,
}

/// A trapezoid of the map.
///
/// It is bounded above by the segment `top`, below by the segment `bottom`, and horizontally by
/// the vertical lines through `leftp` and `rightp` (vertical in the lexicographic sense: two
/// points with the same abscissa are ordered by their ordinate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trapezoid {
    pub leftp: VertexId,
    pub rightp: VertexId,
    pub bottom: SegmentId,
    pub top: SegmentId,
    pub left: Neighbors,
    pub right: Neighbors,
    /// The leaf of the search DAG representing this trapezoid.
    pub(crate) node: usize,
}

impl Trapezoid {
    pub(crate) fn new(leftp: VertexId, rightp: VertexId, bottom: SegmentId, top: SegmentId) -> Self {
        Self {
            leftp,
            rightp,
            bottom,
            top,
            left: Neighbors::default(),
            right: Neighbors::default(),
            node: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_listed_bottom_then_top() {
        let both = Neighbors {
            lower: Some(TrapId(3)),
            upper: Some(TrapId(1)),
        };

        assert_eq!(both.list().as_slice(), &[TrapId(3), TrapId(1)]);
        let upper = Neighbors {
            lower: None,
            upper: Some(TrapId(2)),
        };
        assert_eq!(upper.list().as_slice(), &[TrapId(2)]);
        assert!(Neighbors::default().list().is_empty());
    }

    #[test]
    fn slots() {
        let mut neighbors = Neighbors {
            lower: Some(TrapId(0)),
            upper: None,
        };

        *neighbors.get_mut(Slot::Upper) = Some(TrapId(5));

        assert_eq!(neighbors.get(Slot::Lower), Some(TrapId(0)));
        assert_eq!(neighbors.get(Slot::Upper), Some(TrapId(5)));
    }
}
