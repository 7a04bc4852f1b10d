//! Point location in planar subdivisions using a trapezoidal map.
//!
//! A [`TrapMap`] decomposes the bounding box of a subdivision into trapezoids, and records the
//! decomposition in a search DAG. A query then walks the DAG from its root and reports whether
//! the point coincides with a vertex, lies on a segment or falls inside a trapezoid (see
//! [`Response`]). [`TrapMap::face_of`] turns that answer into a face of the subdivision.
//!
//! Subdivisions are given as a [`Dcel`], which can be read from text, built from a polygon
//! [`Mesh`], or assembled by hand. A bare set of segments works too, through
//! [`TrapMap::from_segments`].
//!
//! ```
//! use traploc::{Mesh, Options, PointLocator, Response, TrapMap};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mesh = Mesh::grid(0., 2., 0., 1., 2, 1)?;
//! let trap_map = TrapMap::from_mesh(&mesh, &Options::default())?;
//!
//! assert_eq!(trap_map.locate_one(&[0.5, 0.5]), Some(0));
//! assert_eq!(trap_map.locate_one(&[1.5, 0.5]), Some(1));
//! assert_eq!(trap_map.locate_one(&[3., 0.5]), None);
//! assert!(matches!(trap_map.query(&[1., 0.5]), Response::Segment(..)));
//! # Ok(())
//! # }
//! ```

mod dcel;
mod error;
mod geometry;
mod mesh;
mod options;
mod point_locator;
mod trapezoidal_map;

pub use dcel::{Cycle, Dcel, Face, FaceId, Hedge, HedgeId, Vertex, VertexId};
pub use error::{Error, InvariantKind, Result, Side};
pub use geometry::{Point, Segment};
pub use mesh::{Cells, Mesh};
pub use options::{InsertionOrder, Options, DEFAULT_EPSILON, DEFAULT_MARGIN};
pub use point_locator::PointLocator;
pub use trapezoidal_map::{
    BoundingBox, Neighbors, Response, SegmentId, Stats, TrapId, TrapMap, Trapezoid,
};
