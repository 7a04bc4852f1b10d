use tracing::trace;

use crate::dcel::{FaceId, VertexId};
use crate::geometry::{Point, Positioning};
use crate::point_locator::PointLocator;
use crate::trapezoidal_map::trap_map::{Node, BOTTOM, LEFT, RIGHT, TOP};
use crate::trapezoidal_map::{BoundingBox, SegmentId, TrapId, TrapMap};

/// What a query point was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Response {
    /// The point coincides with a vertex (within the map's epsilon).
    Vertex(VertexId),
    /// The point lies on a segment (within the map's epsilon), away from its endpoints.
    Segment(SegmentId),
    /// The point lies inside a trapezoid.
    Trapezoid(TrapId),
    /// The point lies outside the bounding box.
    OutsideBoundingBox,
}

impl TrapMap {
    /// Locates a point in the map.
    ///
    /// Coincidence with a vertex takes precedence over lying on a segment, which takes precedence
    /// over lying inside a trapezoid. Points on the boundary of the bounding box are reported on
    /// its corners or sides.
    pub fn query(&self, point: &[f64; 2]) -> Response {
        let point = Point::from(point);
        if !self.bbox.contains(&point) {
            return Response::OutsideBoundingBox;
        }
        if self.bbox.on_boundary(&point, self.epsilon) {
            return self.boundary_response(&point);
        }

        let eps = self.epsilon;
        let mut idx = 0;
        loop {
            let node = &self.dag[idx];
            let child = match node.data {
                Node::Leaf(trap) => return Response::Trapezoid(trap),
                Node::X(v) => {
                    if point.approx_eq(&self.point(v), eps) {
                        return Response::Vertex(v);
                    }
                    usize::from(point.is_right_of(&self.point(v)))
                }
                Node::Y(s) => {
                    let segment = &self.segments[s.0];
                    let (p, q) = (self.point(segment.p), self.point(segment.q));
                    if point.approx_eq(&p, eps) {
                        return Response::Vertex(segment.p);
                    }
                    if point.approx_eq(&q, eps) {
                        return Response::Vertex(segment.q);
                    }
                    if point.is_on_segment(p, q, eps) {
                        return Response::Segment(s);
                    }
                    usize::from(matches!(point.position(p, q), Positioning::Right))
                }
            };
            idx = node.children[child];
            trace!(node = idx, "Query step");
        }
    }

    /// Answers a point within epsilon of the box boundary: a corner, or else the closest side.
    fn boundary_response(&self, point: &Point) -> Response {
        for (corner, id) in self.bbox.corners().iter().zip(self.corners) {
            if point.approx_eq(corner, self.epsilon) {
                return Response::Vertex(id);
            }
        }
        let BoundingBox {
            xmin,
            xmax,
            ymin,
            ymax,
        } = self.bbox;
        let sides = [
            (point.x - xmin, LEFT),
            (xmax - point.x, RIGHT),
            (ymax - point.y, TOP),
            (point.y - ymin, BOTTOM),
        ];
        let side = sides
            .into_iter()
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map_or(BOTTOM, |(_, side)| side);
        Response::Segment(side)
    }

    /// The face of the subdivision a query response belongs to.
    ///
    /// A segment belongs to the bounded face on either side of it (the one above first), and only
    /// to the unbounded face when there is none. Returns [`None`] outside the bounding box, and
    /// for maps built without face information.
    pub fn face_of(&self, response: &Response) -> Option<FaceId> {
        match *response {
            Response::Vertex(v) => self.vertices.get(v.0).and_then(|vertex| vertex.face),
            Response::Segment(s) => {
                let segment = self.segments.get(s.0)?;
                [segment.face_above, segment.face_below]
                    .into_iter()
                    .flatten()
                    .find(|&face| Some(face) != self.unbounded)
                    .or(segment.face_above)
                    .or(segment.face_below)
            }
            Response::Trapezoid(t) => {
                let trap = self.trapezoid(t)?;
                self.segments[trap.bottom.0].face_above
            }
            Response::OutsideBoundingBox => None,
        }
    }

    /// A human-readable description of a query response.
    pub fn describe(&self, response: &Response) -> String {
        let coords = |v: VertexId| {
            let Point { x, y } = self.point(v);
            format!("({}, {})", x, y)
        };
        match *response {
            Response::Vertex(v) => coords(v),
            Response::Segment(s) => match s {
                LEFT => "L".to_string(),
                RIGHT => "R".to_string(),
                TOP => "T".to_string(),
                BOTTOM => "B".to_string(),
                _ => {
                    let segment = &self.segments[s.0];
                    format!("({}, {})", coords(segment.p), coords(segment.q))
                }
            },
            Response::Trapezoid(t) => match self.trapezoid(t) {
                Some(trap) => [trap.top, trap.bottom]
                    .into_iter()
                    .map(|s| self.describe(&Response::Segment(s)))
                    .chain([coords(trap.leftp), coords(trap.rightp)])
                    .collect::<Vec<_>>()
                    .join("\n"),
                None => format!("retired trapezoid {}", t),
            },
            Response::OutsideBoundingBox => "outside the bounding box".to_string(),
        }
    }
}

impl PointLocator for TrapMap {
    /// Returns the index of the bounded face containing `point`.
    fn locate_one(&self, point: &[f64; 2]) -> Option<usize> {
        self.face_of(&self.query(point))
            .filter(|&face| Some(face) != self.unbounded)
            .map(FaceId::index)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use proptest::prelude::*;

    use super::*;
    use crate::mesh::Mesh;
    use crate::options::{InsertionOrder, Options};

    prop_compose! {
        fn coords_in_range(xmin: f64, xmax: f64, ymin: f64, ymax: f64)
                          (x in xmin..xmax, y in ymin..ymax) -> [f64; 2] {
           [x, y]
        }
    }

    fn from_mesh(points: Vec<[f64; 2]>, cells: Vec<usize>, stride: usize) -> Result<TrapMap> {
        let mesh = Mesh::with_stride(points, cells, stride)?;
        TrapMap::from_mesh(&mesh, &Options::default().check_each_insertion(true))
    }

    #[test]
    fn locate_one_in_empty_trapezoidal_map() {
        let trap_map = TrapMap::empty();

        assert_eq!(trap_map.query(&[0., 0.]), Response::Trapezoid(TrapId(0)));
        assert_eq!(trap_map.locate_one(&[0., 0.]), None);
    }

    #[test]
    fn locate_points_in_single_triangle() -> Result<()> {
        let trap_map = from_mesh(vec![[0., 0.], [1., 0.], [0.5, 0.5]], vec![0, 1, 2], 3)?;

        // Locate a point inside the triangle
        assert_eq!(trap_map.locate_one(&[0.5, 0.1]), Some(0));

        // Edge cases
        assert_eq!(trap_map.locate_one(&[0.5, 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.25, 0.25]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.75, 0.25]), Some(0));

        // Corner cases
        assert_eq!(trap_map.locate_one(&[0., 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[1., 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.5, 0.5]), Some(0));

        // Locate points outside the triangle
        assert_eq!(trap_map.locate_one(&[0.5, -0.1]), None); // below
        assert_eq!(trap_map.locate_one(&[0.8, 0.8]), None); // above to the right
        assert_eq!(trap_map.locate_one(&[0.2, 0.8]), None); // above to the left
        assert_eq!(trap_map.locate_one(&[1.2, 0.8]), None); // to the right
        assert_eq!(trap_map.locate_one(&[-0.2, 0.8]), None); // to the left

        Ok(())
    }

    #[test]
    fn locate_points_with_3plus_intersections() -> Result<()> {
        let trap_map = from_mesh(
            vec![[0., 0.], [1., 0.], [2., 0.], [3., 1.]],
            vec![0, 1, 2, 3],
            4,
        )?;

        assert_eq!(trap_map.locate_one(&[1., 0.1]), Some(0));
        assert_eq!(trap_map.locate_one(&[2.5, 0.7]), Some(0));

        assert_eq!(trap_map.locate_one(&[0.5, -0.1]), None); // below
        assert_eq!(trap_map.locate_one(&[0.5, 3.8]), None); // above
        assert_eq!(trap_map.locate_one(&[3.5, 0.8]), None); // to the right
        assert_eq!(trap_map.locate_one(&[-0.2, 0.8]), None); // to the left

        Ok(())
    }

    #[test]
    fn locate_points_in_single_square() -> Result<()> {
        let trap_map = from_mesh(
            vec![[0., 0.], [1., 0.], [1., 1.], [0., 1.]],
            vec![0, 1, 2, 3],
            4,
        )?;

        // Locate points inside the square
        assert_eq!(trap_map.locate_one(&[0.5, 0.5]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.1, 0.1]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.1, 0.9]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.9, 0.9]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.9, 0.1]), Some(0));

        // Edge cases
        assert_eq!(trap_map.locate_one(&[0.5, 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[0., 0.5]), Some(0));
        assert_eq!(trap_map.locate_one(&[1., 0.5]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.5, 1.]), Some(0));

        // Corner cases
        assert_eq!(trap_map.locate_one(&[0., 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[1., 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[1., 1.]), Some(0));
        assert_eq!(trap_map.locate_one(&[0., 1.]), Some(0));

        // Locate points outside the square
        assert_eq!(trap_map.locate_one(&[0.5, -0.1]), None); // south
        assert_eq!(trap_map.locate_one(&[1.5, -0.1]), None); // south-east
        assert_eq!(trap_map.locate_one(&[1.5, 0.8]), None); // east
        assert_eq!(trap_map.locate_one(&[1.5, 1.8]), None); // north-east
        assert_eq!(trap_map.locate_one(&[0.5, 1.8]), None); // north
        assert_eq!(trap_map.locate_one(&[-0.5, 1.8]), None); // north-west
        assert_eq!(trap_map.locate_one(&[-0.5, 0.8]), None); // west
        assert_eq!(trap_map.locate_one(&[-0.5, -0.8]), None); // south-west

        Ok(())
    }

    #[test]
    fn locate_points_in_grid() -> Result<()> {
        let mesh = Mesh::grid(0., 1., 0., 1., 2, 2)?;

        let trap_map = TrapMap::from_mesh(&mesh, &Options::default())?;

        // Locate points in different cells
        assert_eq!(trap_map.locate_one(&[0.25, 0.25]), Some(0));
        assert_eq!(trap_map.locate_one(&[0.75, 0.25]), Some(1));
        assert_eq!(trap_map.locate_one(&[0.25, 0.75]), Some(2));
        assert_eq!(trap_map.locate_one(&[0.75, 0.75]), Some(3));

        Ok(())
    }

    #[test]
    fn locate_vertex() -> Result<()> {
        let trap_map = from_mesh(
            vec![[0., 0.], [1., 0.], [1., 1.], [0., 1.]],
            vec![0, 1, 3, 1, 2, 3],
            3,
        )?;

        // Points located on vertices yield the first cell in which they appear
        assert_eq!(trap_map.query(&[1., 0.]), Response::Vertex(VertexId(1)));
        assert_eq!(trap_map.locate_one(&[1., 0.]), Some(0));
        assert_eq!(trap_map.locate_one(&[0., 1.]), Some(0));
        assert_eq!(trap_map.locate_one(&[1., 1.]), Some(1));

        Ok(())
    }

    #[test]
    fn vertices_take_precedence_over_segments() -> Result<()> {
        let trap_map = from_mesh(vec![[0., 0.], [1., 0.], [0.5, 0.5]], vec![0, 1, 2], 3)?;

        assert_eq!(trap_map.query(&[0.5, 0.5]), Response::Vertex(VertexId(2)));
        assert_eq!(trap_map.query(&[0.5, 0.5 + 1e-7]), Response::Vertex(VertexId(2)));
        assert!(matches!(trap_map.query(&[0.5, 0.]), Response::Segment(..)));
        assert!(matches!(trap_map.query(&[0.5, 0.2]), Response::Trapezoid(..)));

        Ok(())
    }

    #[test]
    fn bounding_box_boundary() -> Result<()> {
        let trap_map = from_mesh(vec![[0., 0.], [1., 0.], [0.5, 0.5]], vec![0, 1, 2], 3)?;
        let bbox = *trap_map.bounding_box();

        assert_eq!(
            trap_map.query(&[bbox.xmin, bbox.ymin]),
            Response::Vertex(VertexId(3))
        );
        assert_eq!(
            trap_map.query(&[bbox.xmax, bbox.ymax]),
            Response::Vertex(VertexId(6))
        );
        assert_eq!(trap_map.query(&[bbox.xmin, 0.2]), Response::Segment(LEFT));
        assert_eq!(trap_map.query(&[bbox.xmax, 0.2]), Response::Segment(RIGHT));
        assert_eq!(trap_map.query(&[0.2, bbox.ymax]), Response::Segment(TOP));
        assert_eq!(trap_map.query(&[0.2, bbox.ymin]), Response::Segment(BOTTOM));
        assert_eq!(trap_map.query(&[0.2, bbox.ymin - 0.1]), Response::OutsideBoundingBox);

        // Within epsilon of the boundary, but strictly inside the box
        assert_eq!(
            trap_map.query(&[bbox.xmin + 1e-6, bbox.ymin + 2e-6]),
            Response::Vertex(VertexId(3))
        );
        assert_eq!(trap_map.query(&[bbox.xmin + 1e-6, 0.2]), Response::Segment(LEFT));
        assert_eq!(trap_map.query(&[0.2, bbox.ymax - 1e-6]), Response::Segment(TOP));
        assert!(matches!(
            trap_map.query(&[bbox.xmin + 1e-3, 0.2]),
            Response::Trapezoid(..)
        ));

        // The box belongs to the unbounded face, which is not a cell
        assert_eq!(trap_map.face_of(&Response::Segment(BOTTOM)), trap_map.unbounded_face());
        assert_eq!(trap_map.locate_one(&[bbox.xmin, 0.2]), None);
        assert_eq!(trap_map.locate_one(&[10., 10.]), None);

        Ok(())
    }

    #[test]
    fn segments_and_trapezoids_between_parallel_segments() -> Result<()> {
        let options = Options::default().check_each_insertion(true);
        let trap_map = TrapMap::from_segments(&[[[0., 0.], [4., 4.]], [[0., 4.], [4., 8.]]], &options)?;

        assert_eq!(trap_map.query(&[2., 2.]), Response::Segment(SegmentId(4)));
        assert_eq!(trap_map.query(&[2., 6.]), Response::Segment(SegmentId(5)));
        let Response::Trapezoid(between) = trap_map.query(&[2., 2.01]) else {
            panic!("expected a trapezoid");
        };
        let trap = trap_map.trapezoid(between).unwrap();
        assert_eq!((trap.bottom, trap.top), (SegmentId(4), SegmentId(5)));
        let Response::Trapezoid(below) = trap_map.query(&[2., 1.99]) else {
            panic!("expected a trapezoid");
        };
        assert_eq!(trap_map.trapezoid(below).unwrap().top, SegmentId(4));

        // No face information without a subdivision
        assert_eq!(trap_map.face_of(&Response::Trapezoid(between)), None);
        assert_eq!(trap_map.locate_one(&[2., 2.01]), None);

        Ok(())
    }

    #[test]
    fn describe_responses() -> Result<()> {
        let options = Options::default();
        let trap_map = TrapMap::from_segments(&[[[0., 0.], [1., 0.5]]], &options)?;

        assert_eq!(trap_map.describe(&Response::Vertex(VertexId(1))), "(1, 0.5)");
        assert_eq!(trap_map.describe(&Response::Segment(TOP)), "T");
        assert_eq!(
            trap_map.describe(&Response::Segment(SegmentId(4))),
            "((0, 0), (1, 0.5))"
        );
        let Response::Trapezoid(above) = trap_map.query(&[0.5, 0.4]) else {
            panic!("expected a trapezoid");
        };
        assert_eq!(
            trap_map.describe(&Response::Trapezoid(above)),
            "T\n((0, 0), (1, 0.5))\n(0, 0)\n(1, 0.5)"
        );
        assert_eq!(
            trap_map.describe(&Response::OutsideBoundingBox),
            "outside the bounding box"
        );

        Ok(())
    }

    #[test]
    fn trapezoidal_map_proptest() -> Result<()> {
        let (xmin, xmax) = (0., 10.);
        let (ymin, ymax) = (0., 10.);
        let (nx, ny) = (6, 6); // Use numbers that don't divide the sides evenly on purpose

        let mesh = Mesh::grid(xmin, xmax, ymin, ymax, nx, ny)?;
        let options = Options::default().with_order(InsertionOrder::Shuffled { seed: 1234 });
        let locator = TrapMap::from_mesh(&mesh, &options)?;

        // Select the number of points generated. The higher it is, the more time the test takes.
        let np = 20;
        proptest!(|(points in proptest::collection::vec(coords_in_range(xmin, xmax, ymin, ymax), np))| {
            let locations = locator.locate_many(&points);

            // Check results using the winding number
            for (point, idx) in points.iter().map(Point::from).zip(&locations) {
                let Some(idx) = idx else {
                    panic!("All points should be in a cell but {:?} is not", &point);
                };
                let cell = mesh.cell_vertices(*idx).unwrap();
                assert!(point.is_inside(cell));
            }
        });

        Ok(())
    }

    #[test]
    fn multiply_connected_triangulation() -> Result<()> {
        //
        //  5
        //  +          +
        //  |\         |\
        //  | \        |2\
        // 3+--+4      +--+
        //  |\ |\      |\ |\
        //  | \| \     |0\|1\
        //  +--+--+    +--+--+
        //  0  1  2
        //
        let trap_map = from_mesh(
            vec![[0., 0.], [1., 0.], [2., 0.], [0., 1.], [1., 1.], [0., 2.]],
            vec![0, 1, 3, 1, 2, 4, 3, 4, 5],
            3,
        )?;

        assert_eq!(trap_map.locate_one(&[1. / 3., 1. / 3.]), Some(0));
        assert_eq!(trap_map.locate_one(&[4. / 3., 1. / 3.]), Some(1));
        assert_eq!(trap_map.locate_one(&[1. / 3., 4. / 3.]), Some(2));
        // There is no triangle "3"
        assert_eq!(trap_map.locate_one(&[2. / 3., 2. / 3.]), None);

        Ok(())
    }
}
