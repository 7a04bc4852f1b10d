use std::fmt;

use thiserror::Error;

use crate::dcel::HedgeId;
use crate::trapezoidal_map::{SegmentId, TrapId};

/// Errors raised while building a trapezoidal map.
///
/// Malformed input is reported before any construction work is done. Invariant violations abort
/// the insertion that triggered them, and with it the whole build: no partially built map is ever
/// handed out.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("half-edge {hedge} has no twin")]
    MissingTwin { hedge: HedgeId },

    #[error("half-edge {hedge} has twin {twin}, whose own twin is not {hedge}")]
    AsymmetricTwin { hedge: HedgeId, twin: HedgeId },

    #[error("{what} {index} does not exist")]
    DanglingReference { what: &'static str, index: usize },

    #[error("the planar graph has no unbounded face")]
    NoUnboundedFace,

    #[error("segment between {p:?} and {q:?} has coincident endpoints")]
    DegenerateSegment { p: [f64; 2], q: [f64; 2] },

    #[error("invariant violated while inserting segment {segment}: {kind}")]
    Invariant {
        segment: SegmentId,
        kind: InvariantKind,
    },
}

/// The internal invariants that segment insertion checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantKind {
    /// The new segment does not cross any trapezoid.
    EmptyCrossing,
    /// A trapezoid was expected to have a neighbor on the given side, but has none.
    MissingNeighbor { trap: TrapId, side: Side },
    /// A neighbor of a split trapezoid does not point back at it.
    NeighborMismatch {
        trap: TrapId,
        side: Side,
        expected: TrapId,
    },
    /// A trapezoid was used after being retired.
    RetiredTrapezoid { trap: TrapId },
    /// Walking along the segment did not end in the trapezoid containing its right endpoint.
    EndpointMismatch { reached: TrapId, expected: TrapId },
    /// Trapezoids merged into one do not share the same bounding segment.
    BoundaryMismatch { trap: TrapId },
    /// A trapezoid's DAG node is not a leaf pointing back at it.
    NotALeaf { trap: TrapId },
    /// Adjacency is not symmetric between two trapezoids.
    Asymmetric { trap: TrapId, neighbor: TrapId },
    /// Two neighbors do not share the vertical line through the same vertex.
    WallMismatch { trap: TrapId, neighbor: TrapId },
    /// A search node is unreachable, or does not have the children its kind requires.
    MalformedNode { node: usize },
}

/// Side of a trapezoid, or of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantKind::EmptyCrossing => write!(f, "the segment crosses no trapezoid"),
            InvariantKind::MissingNeighbor { trap, side } => {
                write!(f, "trapezoid {} has no {} neighbor", trap, side)
            }
            InvariantKind::NeighborMismatch {
                trap,
                side,
                expected,
            } => write!(
                f,
                "{} neighbor of trapezoid {} is not {}",
                side, trap, expected
            ),
            InvariantKind::RetiredTrapezoid { trap } => {
                write!(f, "trapezoid {} is no longer part of the map", trap)
            }
            InvariantKind::EndpointMismatch { reached, expected } => write!(
                f,
                "walk ended in trapezoid {} instead of {}",
                reached, expected
            ),
            InvariantKind::BoundaryMismatch { trap } => write!(
                f,
                "trapezoid {} does not share the boundary of the run it is merged into",
                trap
            ),
            InvariantKind::NotALeaf { trap } => {
                write!(f, "trapezoid {} is not represented by a leaf", trap)
            }
            InvariantKind::Asymmetric { trap, neighbor } => write!(
                f,
                "trapezoid {} lists {} as a neighbor but not the other way around",
                trap, neighbor
            ),
            InvariantKind::WallMismatch { trap, neighbor } => write!(
                f,
                "trapezoids {} and {} are neighbors but do not share a vertical side",
                trap, neighbor
            ),
            InvariantKind::MalformedNode { node } => {
                write!(f, "search node {} is isolated or has the wrong children", node)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
