use std::{collections::HashMap, f64::consts::TAU, fmt};

use anyhow::{anyhow, bail};
use itertools::Itertools;
use tracing::warn;

use crate::error::{Error, Result};
use crate::geometry::{Point, Segment};
use crate::mesh::Mesh;

mod reader;

macro_rules! index_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_type!(
    /// Index of a [`Vertex`] in a [`Dcel`].
    VertexId
);
index_type!(
    /// Index of a [`Hedge`] in a [`Dcel`].
    HedgeId
);
index_type!(
    /// Index of a [`Face`] in a [`Dcel`].
    FaceId
);

/// A doubly connected edge list, describing a planar subdivision.
///
/// Every edge of the subdivision is made of two half-edges (or hedges) pointing in opposite
/// directions. The face of a half-edge lies to its left, so bounded faces are traversed
/// counter-clockwise by following `next`.
#[derive(Clone, Debug, Default)]
pub struct Dcel {
    vertices: Vec<Vertex>,
    hedges: Vec<Hedge>,
    faces: Vec<Face>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub coords: [f64; 2],
    /// One of the half-edges whose origin is this vertex.
    pub hedge: Option<HedgeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hedge {
    pub origin: VertexId,
    pub twin: Option<HedgeId>,
    pub face: FaceId,
    pub next: HedgeId,
    pub prev: HedgeId,
}

/// A face of the subdivision.
///
/// The unbounded face is the one without an outer boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub outer: Option<HedgeId>,
    pub inner: Vec<HedgeId>,
}

/// Iterator over the half-edges of a cycle, following `next`.
pub struct Cycle<'a> {
    dcel: &'a Dcel,
    start: HedgeId,
    current: Option<HedgeId>,
    remaining: usize,
}

impl Iterator for Cycle<'_> {
    type Item = HedgeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        // A malformed `next` chain that never comes back to the start stops here
        self.remaining = self.remaining.checked_sub(1)?;
        let next = self.dcel.hedges[current.0].next;
        self.current = (next != self.start).then_some(next);
        Some(current)
    }
}

impl Dcel {
    /// Creates a [`Dcel`] from its records, checking that every reference points to an existing
    /// record.
    ///
    /// Twins are only checked when the segments are extracted, see [`Dcel::segments`].
    pub fn new(vertices: Vec<Vertex>, hedges: Vec<Hedge>, faces: Vec<Face>) -> Result<Self> {
        let check = |what: &'static str, index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(Error::DanglingReference { what, index })
            }
        };
        let (nv, nh, nf) = (vertices.len(), hedges.len(), faces.len());

        for vertex in &vertices {
            if let Some(hedge) = vertex.hedge {
                check("half-edge", hedge.0, nh)?;
            }
        }
        for hedge in &hedges {
            check("vertex", hedge.origin.0, nv)?;
            if let Some(twin) = hedge.twin {
                check("half-edge", twin.0, nh)?;
            }
            check("face", hedge.face.0, nf)?;
            check("half-edge", hedge.next.0, nh)?;
            check("half-edge", hedge.prev.0, nh)?;
        }
        for face in &faces {
            for hedge in face.outer.iter().chain(&face.inner) {
                check("half-edge", hedge.0, nh)?;
            }
        }

        Ok(Self {
            vertices,
            hedges,
            faces,
        })
    }

    /// Constructs a new [`Dcel`] from a [`Mesh`].
    ///
    /// Cells are reoriented counter-clockwise if needed, and cell `i` becomes face `i`. The
    /// boundary of the mesh is closed with half-edges belonging to one extra unbounded face,
    /// which holds one inner component per boundary loop (the outer boundary and the holes).
    pub fn from_mesh(mesh: &Mesh) -> anyhow::Result<Self> {
        let cell_count = mesh.cell_count();
        let exterior = FaceId(cell_count);

        let mut vertices: Vec<_> = mesh
            .points()
            .iter()
            .map(|&coords| Vertex {
                coords,
                hedge: None,
            })
            .collect();
        let mut hedges: Vec<Hedge> = Vec::new();
        let mut faces = Vec::with_capacity(cell_count + 1);
        let mut edges = HashMap::new();

        for (idx, cell) in mesh.cells().enumerate() {
            let mut cell = cell.to_vec();
            if signed_area(mesh, &cell) < 0. {
                cell.reverse();
            }

            let start = hedges.len();
            let n = cell.len();
            faces.push(Face {
                outer: Some(HedgeId(start)),
                inner: Vec::new(),
            });
            for (i, (&a, &b)) in cell.iter().circular_tuple_windows().enumerate() {
                if a == b {
                    bail!("Cell {} repeats vertex {}.", idx, a);
                }
                let id = HedgeId(start + i);
                if edges.insert((a, b), id).is_some() {
                    bail!(
                        "Edge ({}, {}) appears twice with the same orientation, cells overlap.",
                        a,
                        b
                    );
                }
                hedges.push(Hedge {
                    origin: VertexId(a),
                    twin: None,
                    face: FaceId(idx),
                    next: HedgeId(start + (i + 1) % n),
                    prev: HedgeId(start + (i + n - 1) % n),
                });
                vertices[a].hedge.get_or_insert(id);
            }
        }

        // Pair up interior half-edges, and close the boundary with half-edges of the exterior
        let interior_count = hedges.len();
        let mut leaving = HashMap::<usize, Vec<HedgeId>>::new();
        for idx in 0..interior_count {
            let a = hedges[idx].origin.0;
            let b = hedges[hedges[idx].next.0].origin.0;
            if let Some(&twin) = edges.get(&(b, a)) {
                hedges[idx].twin = Some(twin);
                continue;
            }
            let id = HedgeId(hedges.len());
            hedges[idx].twin = Some(id);
            hedges.push(Hedge {
                origin: VertexId(b),
                twin: Some(HedgeId(idx)),
                face: exterior,
                next: id,
                prev: id,
            });
            leaving.entry(b).or_default().push(id);
        }

        // A boundary half-edge ending at `a` continues with the boundary half-edge leaving `a`
        // that comes first clockwise. There is more than one candidate only where two boundary
        // loops touch.
        for idx in interior_count..hedges.len() {
            let b = hedges[idx].origin.0;
            let Some(twin) = hedges[idx].twin else {
                continue;
            };
            let a = hedges[twin.0].origin.0;
            let candidates = leaving
                .get(&a)
                .ok_or_else(|| anyhow!("Boundary loop broken at vertex {}.", a))?;
            let next = if let [single] = candidates.as_slice() {
                *single
            } else {
                let angle = |to: usize| {
                    let [xa, ya] = mesh.coords(a);
                    let [x, y] = mesh.coords(to);
                    (y - ya).atan2(x - xa)
                };
                let reference = angle(b);
                *candidates
                    .iter()
                    .min_by(|&&c1, &&c2| {
                        let clockwise = |c: HedgeId| {
                            let to = hedges[c.0].twin.map_or(a, |twin| hedges[twin.0].origin.0);
                            match (reference - angle(to)).rem_euclid(TAU) {
                                turn if turn == 0. => TAU,
                                turn => turn,
                            }
                        };
                        clockwise(c1).total_cmp(&clockwise(c2))
                    })
                    .ok_or_else(|| anyhow!("Boundary loop broken at vertex {}.", a))?
            };
            hedges[idx].next = next;
            hedges[next.0].prev = HedgeId(idx);
        }

        let mut inner = Vec::new();
        let mut visited = vec![false; hedges.len()];
        for idx in interior_count..hedges.len() {
            if visited[idx] {
                continue;
            }
            inner.push(HedgeId(idx));
            let mut current = idx;
            while !visited[current] {
                visited[current] = true;
                current = hedges[current].next.0;
            }
        }
        faces.push(Face { outer: None, inner });

        Ok(Self::new(vertices, hedges, faces)?)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn hedges(&self) -> &[Hedge] {
        &self.hedges
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0)
    }

    pub fn hedge(&self, id: HedgeId) -> Option<&Hedge> {
        self.hedges.get(id.0)
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id.0)
    }

    /// The half-edges of the cycle starting at `start`, following `next`.
    pub fn cycle(&self, start: HedgeId) -> Cycle<'_> {
        Cycle {
            dcel: self,
            start,
            current: (start.0 < self.hedges.len()).then_some(start),
            remaining: self.hedges.len(),
        }
    }

    /// The vertices of the outer boundary of a face, in order.
    pub fn face_vertices(&self, face: FaceId) -> Vec<VertexId> {
        self.face(face)
            .and_then(|face| face.outer)
            .map(|start| {
                self.cycle(start)
                    .map(|hedge| self.hedges[hedge.0].origin)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Extracts the undirected segments of the subdivision.
    ///
    /// Each pair of twin half-edges yields one segment, visited once. The face to the left of
    /// the half-edge going from `p` to `q` is the face above the segment.
    pub fn segments(&self) -> Result<Vec<Segment>> {
        let mut visited = vec![false; self.hedges.len()];
        let mut segments = Vec::with_capacity(self.hedges.len() / 2);
        for (idx, hedge) in self.hedges.iter().enumerate() {
            if visited[idx] {
                continue;
            }
            let id = HedgeId(idx);
            let twin_id = hedge.twin.ok_or(Error::MissingTwin { hedge: id })?;
            let twin = &self.hedges[twin_id.0];
            if twin.twin != Some(id) || twin_id == id {
                return Err(Error::AsymmetricTwin {
                    hedge: id,
                    twin: twin_id,
                });
            }
            visited[idx] = true;
            visited[twin_id.0] = true;

            let a = (hedge.origin, self.point(hedge.origin));
            let b = (twin.origin, self.point(twin.origin));
            if a.1 == b.1 {
                return Err(Error::DegenerateSegment {
                    p: a.1.into(),
                    q: b.1.into(),
                });
            }
            let mut segment = Segment::canonical(a, b);
            let (forward, backward) = if segment.p == hedge.origin {
                ((id, hedge), (twin_id, twin))
            } else {
                ((twin_id, twin), (id, hedge))
            };
            segment.hedges = Some([forward.0, backward.0]);
            segment.face_above = Some(forward.1.face);
            segment.face_below = Some(backward.1.face);
            segments.push(segment);
        }
        Ok(segments)
    }

    /// Finds the unbounded face, i.e. the face without an outer boundary.
    pub fn unbounded_face(&self) -> Result<FaceId> {
        let mut unbounded = self
            .faces
            .iter()
            .positions(|face| face.outer.is_none())
            .map(FaceId);
        let first = unbounded.next().ok_or(Error::NoUnboundedFace)?;
        let others = unbounded.count();
        if others > 0 {
            warn!(
                "{} faces have no outer boundary, using face {} as the unbounded face",
                others + 1,
                first
            );
        }
        Ok(first)
    }

    pub(crate) fn point(&self, id: VertexId) -> Point {
        Point::from(self.vertices[id.0].coords)
    }
}

fn signed_area(mesh: &Mesh, cell: &[usize]) -> f64 {
    cell.iter()
        .circular_tuple_windows()
        .map(|(&a, &b)| {
            let [xa, ya] = mesh.coords(a);
            let [xb, yb] = mesh.coords(b);
            xa * yb - xb * ya
        })
        .sum::<f64>()
        / 2.
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_ids<const N: usize>(idx: [usize; N]) -> Vec<VertexId> {
        idx.into_iter().map(VertexId).collect()
    }

    fn hedge_ids<const N: usize>(idx: [usize; N]) -> Vec<HedgeId> {
        idx.into_iter().map(HedgeId).collect()
    }

    fn one_triangle() -> Mesh {
        //
        //                             Half-edges
        //   2                |
        //   +                |        +
        //   |\               |        |\
        //   | \              |        | \
        //   |  \             |        |  \
        //   |   \            |       5|  1\4
        //   |    \           |        |2   \
        //   |  0  \          |        |     \
        //   |      \         |        |   0  \
        //   +-------+        |        +-------+
        //   0       1        |            3
        //
        let points = vec![[0., 0.], [1., 0.], [0., 1.]];
        let cells = vec![0, 1, 2];
        Mesh::with_stride(points, cells, 3).expect("This should be a valid input")
    }

    fn two_triangles() -> Mesh {
        //
        //                             Half-edges
        //   3       2        |            9
        //   +-------+        |        +-------+
        //   |\      |        |        |\  4   |
        //   | \  1  |        |        | \     |
        //   |  \    |        |        |  \   3|
        //   |   \   |        |       7|  1\5  |8
        //   |    \  |        |        |2   \  |
        //   |  0  \ |        |        |     \ |
        //   |      \|        |        |   0  \|
        //   +-------+        |        +-------+
        //   0       1        |            6
        //
        let points = vec![[0., 0.], [1., 0.], [1., 1.], [0., 1.]];
        let cells = vec![
            0, 1, 3, // first tri
            1, 2, 3, // second tri
        ];
        Mesh::with_stride(points, cells, 3).expect("This should be a valid input")
    }

    fn four_quadrangles() -> Mesh {
        //
        //         7
        // 6 +-----+-----+ 8
        //   |     |     |
        //   |  2  |  3  |
        //   |     |     |
        // 3 +-----4-----+ 5
        //   |     |     |
        //   |  0  |  1  |
        //   |     |     |
        //   +-----+-----+
        //   0     1     2
        //
        Mesh::grid(0., 2., 0., 2., 2, 2).expect("This should be a valid input")
    }

    fn check_links(dcel: &Dcel) {
        for (idx, hedge) in dcel.hedges().iter().enumerate() {
            let twin = hedge.twin.expect("Every half-edge should have a twin");
            assert_eq!(dcel.hedges[twin.0].twin, Some(HedgeId(idx)));
            assert_eq!(dcel.hedges[twin.0].origin, dcel.hedges[hedge.next.0].origin);
            assert_eq!(dcel.hedges[hedge.next.0].prev, HedgeId(idx));
            assert_eq!(dcel.hedges[hedge.next.0].face, hedge.face);
        }
    }

    #[test]
    fn create_one_triangle_dcel() -> anyhow::Result<()> {
        let dcel = Dcel::from_mesh(&one_triangle())?;

        assert_eq!(dcel.face_vertices(FaceId(0)), vertex_ids([0, 1, 2]));
        assert_eq!(dcel.faces().len(), 2);
        assert_eq!(dcel.hedges().len(), 6);
        check_links(&dcel);

        Ok(())
    }

    #[test]
    fn clockwise_cells_are_reoriented() -> anyhow::Result<()> {
        let mesh = Mesh::with_stride(vec![[0., 0.], [1., 0.], [0., 1.]], vec![0, 2, 1], 3)?;

        let dcel = Dcel::from_mesh(&mesh)?;

        assert_eq!(dcel.face_vertices(FaceId(0)), vertex_ids([1, 2, 0]));

        Ok(())
    }

    #[test]
    fn create_two_triangle_dcel() -> anyhow::Result<()> {
        let dcel = Dcel::from_mesh(&two_triangles())?;

        assert_eq!(dcel.face_vertices(FaceId(0)), vertex_ids([0, 1, 3]));
        assert_eq!(dcel.face_vertices(FaceId(1)), vertex_ids([1, 2, 3]));

        let nexts: Vec<_> = dcel.cycle(HedgeId(3)).map(|h| dcel.hedges[h.0].next).collect();
        assert_eq!(nexts, hedge_ids([4, 5, 3]));

        let twins: Vec<_> = dcel.hedges().iter().filter_map(|h| h.twin).collect();
        assert_eq!(twins, hedge_ids([6, 5, 7, 8, 9, 1, 0, 2, 3, 4]));

        // The exterior face has a single boundary loop
        let exterior = &dcel.faces()[2];
        assert_eq!(exterior.outer, None);
        assert_eq!(exterior.inner, vec![HedgeId(6)]);
        let origins: Vec<_> = dcel
            .cycle(HedgeId(6))
            .map(|h| dcel.hedges[h.0].origin)
            .collect();
        assert_eq!(origins, vertex_ids([1, 0, 3, 2]));
        check_links(&dcel);

        Ok(())
    }

    #[test]
    fn create_four_quadrangle_dcel() -> anyhow::Result<()> {
        let dcel = Dcel::from_mesh(&four_quadrangles())?;

        assert_eq!(dcel.face_vertices(FaceId(0)), vertex_ids([0, 1, 4, 3]));
        assert_eq!(dcel.face_vertices(FaceId(1)), vertex_ids([1, 2, 5, 4]));
        assert_eq!(dcel.face_vertices(FaceId(2)), vertex_ids([3, 4, 7, 6]));
        assert_eq!(dcel.face_vertices(FaceId(3)), vertex_ids([4, 5, 8, 7]));

        let exterior = &dcel.faces()[4];
        assert_eq!(exterior.inner.len(), 1);
        let origins: Vec<_> = dcel
            .cycle(exterior.inner[0])
            .map(|h| dcel.hedges[h.0].origin)
            .collect();
        assert_eq!(origins, vertex_ids([1, 0, 3, 6, 7, 8, 5, 2]));
        check_links(&dcel);

        Ok(())
    }

    #[test]
    fn boundary_loops_touching_at_vertices() -> anyhow::Result<()> {
        //
        //  5
        //  +
        //  |\
        //  | \
        // 3+--+4
        //  |\ |\
        //  | \| \
        //  +--+--+
        //  0  1  2
        //
        let mesh = Mesh::with_stride(
            vec![[0., 0.], [1., 0.], [2., 0.], [0., 1.], [1., 1.], [0., 2.]],
            vec![0, 1, 3, 1, 2, 4, 3, 4, 5],
            3,
        )?;

        let dcel = Dcel::from_mesh(&mesh)?;

        let exterior = &dcel.faces()[3];
        assert_eq!(exterior.inner.len(), 2);
        let loops: Vec<Vec<_>> = exterior
            .inner
            .iter()
            .map(|&start| {
                dcel.cycle(start)
                    .map(|h| dcel.hedges[h.0].origin.0)
                    .collect()
            })
            .collect();
        assert_eq!(loops[0], vec![1, 0, 3, 5, 4, 2]);
        assert_eq!(loops[1], vec![3, 1, 4]);
        check_links(&dcel);

        Ok(())
    }

    #[test]
    fn overlapping_cells_are_rejected() -> anyhow::Result<()> {
        let mesh = Mesh::with_stride(
            vec![[0., 0.], [1., 0.], [0., 1.]],
            vec![0, 1, 2, 0, 1, 2],
            3,
        )?;

        assert!(Dcel::from_mesh(&mesh).is_err());

        Ok(())
    }

    #[test]
    fn segments() -> anyhow::Result<()> {
        let dcel = Dcel::from_mesh(&two_triangles())?;

        let segments = dcel.segments()?;

        assert_eq!(segments.len(), 5);
        // The diagonal, shared by both triangles
        let diagonal = segments
            .iter()
            .find(|s| s.has_endpoint(VertexId(1)) && s.has_endpoint(VertexId(3)))
            .expect("The diagonal should be a segment");
        assert_eq!((diagonal.p, diagonal.q), (VertexId(3), VertexId(1)));
        assert_eq!(diagonal.face_above, Some(FaceId(1)));
        assert_eq!(diagonal.face_below, Some(FaceId(0)));
        // The bottom side
        let bottom = &segments[0];
        assert_eq!((bottom.p, bottom.q), (VertexId(0), VertexId(1)));
        assert_eq!(bottom.face_above, Some(FaceId(0)));
        assert_eq!(bottom.face_below, Some(FaceId(2)));

        assert_eq!(dcel.unbounded_face()?, FaceId(2));

        Ok(())
    }

    #[test]
    fn malformed_graphs() -> anyhow::Result<()> {
        let vertices = vec![
            Vertex {
                coords: [0., 0.],
                hedge: Some(HedgeId(0)),
            },
            Vertex {
                coords: [1., 0.],
                hedge: Some(HedgeId(1)),
            },
        ];
        let hedge = |origin, twin: Option<usize>, next| Hedge {
            origin: VertexId(origin),
            twin: twin.map(HedgeId),
            face: FaceId(0),
            next: HedgeId(next),
            prev: HedgeId(next),
        };
        let faces = vec![Face::default()];

        let dcel = Dcel::new(
            vertices.clone(),
            vec![hedge(0, None, 1), hedge(1, Some(0), 0)],
            faces.clone(),
        )?;
        assert_eq!(
            dcel.segments(),
            Err(Error::MissingTwin { hedge: HedgeId(0) })
        );

        let dcel = Dcel::new(
            vertices.clone(),
            vec![hedge(0, Some(1), 1), hedge(1, Some(1), 0)],
            faces.clone(),
        )?;
        assert_eq!(
            dcel.segments(),
            Err(Error::AsymmetricTwin {
                hedge: HedgeId(0),
                twin: HedgeId(1)
            })
        );

        assert_eq!(
            Dcel::new(
                vertices.clone(),
                vec![hedge(2, Some(1), 1), hedge(1, Some(0), 0)],
                faces
            )
            .err(),
            Some(Error::DanglingReference {
                what: "vertex",
                index: 2
            })
        );

        let bounded = vec![Face {
            outer: Some(HedgeId(0)),
            inner: Vec::new(),
        }];
        let dcel = Dcel::new(
            vertices,
            vec![hedge(0, Some(1), 1), hedge(1, Some(0), 0)],
            bounded,
        )?;
        assert_eq!(dcel.unbounded_face(), Err(Error::NoUnboundedFace));

        Ok(())
    }
}
