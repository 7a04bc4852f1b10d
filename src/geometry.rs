use std::cmp::Ordering;

use itertools::Itertools;

use crate::dcel::{FaceId, HedgeId, VertexId};

/// A point of the 2D plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<&Point> for [f64; 2] {
    fn from(val: &Point) -> Self {
        [val.x, val.y]
    }
}

impl From<Point> for [f64; 2] {
    fn from(val: Point) -> Self {
        (&val).into()
    }
}

impl From<&[f64; 2]> for Point {
    fn from(value: &[f64; 2]) -> Self {
        Self {
            x: value[0],
            y: value[1],
        }
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self::from(&value)
    }
}

/// Positioning of a `Point` with respect to a line.
#[derive(Debug, PartialEq)]
pub(crate) enum Positioning {
    Left,
    On,
    Right,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Tests if a point is Left|On|Right of an infinite 2D line defined by two points.
    ///
    /// For a line directed from a lexicographically smaller point to a larger one, `Left` means
    /// above and `Right` means below. This also holds for vertical lines once the plane is
    /// (symbolically) sheared, which is what the lexicographic order models.
    pub(crate) fn position<T>(&self, p1: T, p2: T) -> Positioning
    where
        T: Into<[f64; 2]>,
    {
        let Self { x: x0, y: y0 } = self;
        let [x1, y1] = p1.into();
        let [x2, y2] = p2.into();
        match ((x2 - x1) * (y0 - y1) - (x0 - x1) * (y2 - y1)).total_cmp(&0.) {
            Ordering::Greater => Positioning::Left,
            Ordering::Less => Positioning::Right,
            Ordering::Equal => Positioning::On,
        }
    }

    /// Lexicographic comparison: x first, ties broken by y.
    ///
    /// This is the only vertex order used by the crate. It amounts to a symbolic shear of the
    /// plane, so that no two distinct vertices ever share a vertical line.
    pub(crate) fn lex_cmp(&self, other: &Point) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }

    pub(crate) fn is_right_of(&self, other: &Point) -> bool {
        matches!(self.lex_cmp(other), Ordering::Greater)
    }

    /// Epsilon-tolerant coincidence.
    pub(crate) fn approx_eq(&self, other: &Point, eps: f64) -> bool {
        (self.x - other.x).abs() < eps && (self.y - other.y).abs() < eps
    }

    /// Returns `true` if the point lies on the closed segment `[p, q]`, within `eps`.
    pub(crate) fn is_on_segment(&self, p: Point, q: Point, eps: f64) -> bool {
        let dx = q.x - p.x;
        let dy = q.y - p.y;
        if dx.abs() < eps {
            // Vertical segment: compare coordinates directly
            let (ymin, ymax) = if p.y < q.y { (p.y, q.y) } else { (q.y, p.y) };
            return (self.x - p.x).abs() < eps && self.y > ymin - eps && self.y < ymax + eps;
        }
        let len = dx.hypot(dy);
        let along = ((self.x - p.x) * dx + (self.y - p.y) * dy) / len;
        if along < -eps || along > len + eps {
            return false;
        }
        let across = (dx * (self.y - p.y) - (self.x - p.x) * dy) / len;
        across.abs() < eps
    }

    /// Computes the winding number for a [`Point`] in a polygon (defined by a slice of [`Point`]s).
    ///
    /// This number can be:
    /// - `0` if the [`Point`] is not inside the polygon
    /// - `> 0` if the [`Point`] is inside the polygon and the polygon "winds" at least once around the [`Point`] counter-clockwise
    /// - `< 0` if the [`Point`] is inside the polygon and the polygon "winds" at least once around the [`Point`] clockwise
    ///
    /// For more information, see <https://web.archive.org/web/20130126163405/http://geomalgorithms.com/a03-_inclusion.html>.
    pub fn wn<I>(&self, poly: I) -> isize
    where
        I: IntoIterator,
        <I as IntoIterator>::IntoIter: Clone,
        <I as IntoIterator>::IntoIter: ExactSizeIterator,
        <I as IntoIterator>::Item: Into<[f64; 2]>,
        <I as IntoIterator>::Item: Clone,
    {
        let mut wn = 0;
        for (a, b) in poly.into_iter().circular_tuple_windows() {
            let [_, ya] = a.clone().into();
            let [_, yb] = b.clone().into();
            if ya <= self.y {
                // `a` is below self
                if yb > self.y {
                    // an upward crossing
                    if matches!(self.position(a, b), Positioning::Left) {
                        wn += 1;
                    }
                }
            } else {
                // `a` is above self
                if yb <= self.y {
                    // a downward crossing
                    if matches!(self.position(a, b), Positioning::Right) {
                        wn -= 1;
                    }
                }
            }
        }
        wn
    }

    /// Returns `true` if the point is inside the input polygon.
    pub fn is_inside<I>(&self, poly: I) -> bool
    where
        I: IntoIterator,
        <I as IntoIterator>::IntoIter: Clone,
        <I as IntoIterator>::IntoIter: ExactSizeIterator,
        <I as IntoIterator>::Item: Into<[f64; 2]>,
        <I as IntoIterator>::Item: Clone,
    {
        self.wn(poly) != 0
    }
}

/// A segment of the planar subdivision.
///
/// The endpoints are stored in canonical order: `p` is lexicographically smaller than `q`, so
/// that `p` is always to the left of (or directly below) `q`. All the "above"/"below" reasoning
/// of the trapezoidal map relies on this.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Segment {
    pub p: VertexId,
    pub q: VertexId,
    /// The half-edges the segment was made of, `p -> q` first.
    pub hedges: Option<[HedgeId; 2]>,
    pub face_above: Option<FaceId>,
    pub face_below: Option<FaceId>,
}

impl Segment {
    /// Creates a segment between `a` and `b`, ordering the endpoints canonically.
    pub(crate) fn canonical((a, pa): (VertexId, Point), (b, pb): (VertexId, Point)) -> Self {
        let (p, q) = if pb.is_right_of(&pa) { (a, b) } else { (b, a) };
        Self {
            p,
            q,
            hedges: None,
            face_above: None,
            face_below: None,
        }
    }

    /// Returns `true` if `v` is one of the endpoints of the segment.
    pub fn has_endpoint(&self, v: VertexId) -> bool {
        self.p == v || self.q == v
    }
}
