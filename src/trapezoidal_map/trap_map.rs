use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;
use tracing::{debug, info, trace};

use crate::dcel::{Dcel, FaceId, VertexId};
use crate::error::{Error, InvariantKind, Result, Side};
use crate::geometry::{Point, Positioning, Segment};
use crate::mesh::Mesh;
use crate::options::{InsertionOrder, Options};
use crate::trapezoidal_map::dag::Dag;
use crate::trapezoidal_map::trapezoid::{Slot, Trapezoid};
use crate::trapezoidal_map::{BoundingBox, SegmentId, TrapId};

pub(crate) const LEFT: SegmentId = SegmentId(0);
pub(crate) const RIGHT: SegmentId = SegmentId(1);
pub(crate) const TOP: SegmentId = SegmentId(2);
pub(crate) const BOTTOM: SegmentId = SegmentId(3);

/// Result of the internal steps of an insertion.
type Invariant<T> = std::result::Result<T, InvariantKind>;

/// A node of the search structure.
///
/// The children of an x-node are `[left, right]`, those of a y-node are `[above, below]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Node {
    X(VertexId),
    Y(SegmentId),
    Leaf(TrapId),
}

/// A vertex of the map, along with the face reported when a query lands on it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct MapVertex {
    pub(crate) point: Point,
    pub(crate) face: Option<FaceId>,
}

/// Which end of a segment is being located.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Left,
    Right,
}

/// A trapezoidal map, used to locate points in a planar subdivision.
///
/// The map is built once, by inserting the segments of the subdivision one at a time inside a
/// bounding box. Every insertion replaces the trapezoids crossed by the new segment and records
/// the replacement in a search DAG, which is then used to answer queries in logarithmic expected
/// time (when the segments are inserted in random order).
///
/// Vertices keep the indices they have in the subdivision, the four corners of the bounding box
/// being appended after them.
#[derive(Debug)]
pub struct TrapMap {
    pub(crate) dag: Dag<Node>,
    pub(crate) vertices: Vec<MapVertex>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) traps: Vec<Option<Trapezoid>>,
    live: usize,
    pub(crate) bbox: BoundingBox,
    pub(crate) corners: [VertexId; 4],
    pub(crate) unbounded: Option<FaceId>,
    pub(crate) epsilon: f64,
}

impl Default for TrapMap {
    fn default() -> Self {
        Self::empty()
    }
}

impl TrapMap {
    /// A map without any segment: a single trapezoid filling the bounding box.
    pub fn empty() -> Self {
        Self::init(Vec::new(), None, &Options::default())
    }

    /// Builds the trapezoidal map of a planar subdivision.
    ///
    /// # Errors
    ///
    /// Fails if the subdivision is inconsistent (see [`Dcel::segments`] and
    /// [`Dcel::unbounded_face`]), or if an insertion breaks the invariants of the map, which
    /// happens when segments cross or overlap.
    pub fn build(dcel: &Dcel, options: &Options) -> Result<Self> {
        let segments = dcel.segments()?;
        let unbounded = dcel.unbounded_face()?;
        let vertices = dcel
            .vertices()
            .iter()
            .map(|vertex| MapVertex {
                point: vertex.coords.into(),
                face: vertex
                    .hedge
                    .and_then(|hedge| dcel.hedge(hedge))
                    .map(|hedge| hedge.face),
            })
            .collect();

        let mut trap_map = Self::init(vertices, Some(unbounded), options);
        trap_map.insert_all(segments, options)?;
        Ok(trap_map)
    }

    /// Builds the trapezoidal map of a mesh, through its [`Dcel`].
    pub fn from_mesh(mesh: &Mesh, options: &Options) -> anyhow::Result<Self> {
        let dcel = Dcel::from_mesh(mesh)?;
        Ok(Self::build(&dcel, options)?)
    }

    /// Builds the trapezoidal map of a bare set of segments.
    ///
    /// Endpoints with identical coordinates become a single vertex, numbered by first
    /// appearance. Repeated segments are inserted once. No face information is available, so
    /// [`face_of`](Self::face_of) always returns [`None`] for such a map.
    pub fn from_segments(segments: &[[[f64; 2]; 2]], options: &Options) -> Result<Self> {
        let mut ids: HashMap<(u64, u64), VertexId> = HashMap::new();
        let mut vertices = Vec::new();
        let mut vertex_id = |coords: [f64; 2]| {
            // `+ 0.` folds -0 into 0
            let key = ((coords[0] + 0.).to_bits(), (coords[1] + 0.).to_bits());
            *ids.entry(key).or_insert_with(|| {
                vertices.push(MapVertex {
                    point: coords.into(),
                    face: None,
                });
                VertexId(vertices.len() - 1)
            })
        };

        let mut seen = HashSet::new();
        let mut edges = Vec::with_capacity(segments.len());
        for &[a, b] in segments {
            if a == b {
                return Err(Error::DegenerateSegment { p: a, q: b });
            }
            let (va, vb) = (vertex_id(a), vertex_id(b));
            let segment = Segment::canonical((va, a.into()), (vb, b.into()));
            if seen.insert((segment.p, segment.q)) {
                edges.push(segment);
            }
        }

        let mut trap_map = Self::init(vertices, None, options);
        trap_map.insert_all(edges, options)?;
        Ok(trap_map)
    }

    /// Creates the bounding box and the single trapezoid filling it.
    fn init(mut vertices: Vec<MapVertex>, unbounded: Option<FaceId>, options: &Options) -> Self {
        // No vertex may lie within epsilon of the boundary
        let margin = options.margin.max(2. * options.epsilon);
        let bbox = BoundingBox::around(vertices.iter().map(|v| v.point), margin);
        let n = vertices.len();
        let corners = [VertexId(n), VertexId(n + 1), VertexId(n + 2), VertexId(n + 3)];
        vertices.extend(bbox.corners().map(|point| MapVertex {
            point,
            face: unbounded,
        }));

        let [bl, br, tl, tr] = corners;
        let side = |p, q, face_above, face_below| Segment {
            p,
            q,
            hedges: None,
            face_above,
            face_below,
        };
        // Only the inner side of each box edge belongs to the unbounded face
        let segments = vec![
            side(bl, tl, None, unbounded),
            side(br, tr, unbounded, None),
            side(tl, tr, None, unbounded),
            side(bl, br, unbounded, None),
        ];

        let mut trap_map = Self {
            dag: Dag::new(),
            vertices,
            segments,
            traps: Vec::new(),
            live: 0,
            bbox,
            corners,
            unbounded,
            epsilon: options.epsilon,
        };
        trap_map.add_trap(Trapezoid::new(bl, br, BOTTOM, TOP));
        trap_map
    }

    fn insert_all(&mut self, mut segments: Vec<Segment>, options: &Options) -> Result<()> {
        if let InsertionOrder::Shuffled { seed } = options.order {
            segments.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
        }

        for segment in segments {
            let id = SegmentId(self.segments.len());
            self.segments.push(segment);
            self.insert(id)?;
            if options.check_each_insertion {
                self.check()?;
            }
        }

        let stats = self.stats();
        info!(
            segments = self.segments.len() - 4,
            trapezoids = stats.trapezoids,
            x_nodes = stats.x_nodes,
            y_nodes = stats.y_nodes,
            max_depth = stats.max_depth,
            "Trapezoidal map built"
        );
        Ok(())
    }

    /// Inserts an already registered segment in the map.
    fn insert(&mut self, id: SegmentId) -> Result<()> {
        self.try_insert(id)
            .map_err(|kind| Error::Invariant { segment: id, kind })
    }

    fn try_insert(&mut self, id: SegmentId) -> Invariant<()> {
        let crossed = self.follow_segment(id)?;
        match crossed[..] {
            [] => Err(InvariantKind::EmptyCrossing),
            [trap] => {
                debug!(segment = %id, %trap, "Inserting segment inside a single trapezoid");
                self.split_one(id, trap)
            }
            _ => {
                debug!(
                    segment = %id,
                    crossed = crossed.len(),
                    "Inserting segment across several trapezoids"
                );
                self.split_many(id, &crossed)
            }
        }
    }

    pub(crate) fn point(&self, v: VertexId) -> Point {
        self.vertices[v.0].point
    }

    fn trap(&self, id: TrapId) -> Invariant<&Trapezoid> {
        self.traps
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(InvariantKind::RetiredTrapezoid { trap: id })
    }

    fn trap_mut(&mut self, id: TrapId) -> Invariant<&mut Trapezoid> {
        self.traps
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(InvariantKind::RetiredTrapezoid { trap: id })
    }

    /// Stores a new trapezoid along with its leaf in the DAG.
    fn add_trap(&mut self, mut trap: Trapezoid) -> TrapId {
        let id = TrapId(self.traps.len());
        trap.node = self.dag.add(Node::Leaf(id));
        self.traps.push(Some(trap));
        self.live += 1;
        id
    }

    /// Removes a trapezoid from the map. Its leaf stays in the DAG, ready to be overwritten.
    fn retire(&mut self, id: TrapId) -> Invariant<Trapezoid> {
        let node = self.trap(id)?.node;
        if self.dag.get(node).map(|node| node.data) != Some(Node::Leaf(id)) {
            return Err(InvariantKind::NotALeaf { trap: id });
        }
        let trap = self.traps[id.0]
            .take()
            .ok_or(InvariantKind::RetiredTrapezoid { trap: id })?;
        self.live -= 1;
        Ok(trap)
    }

    /// Locates the trapezoid containing the part of segment `s` that starts at its left (or
    /// ends at its right) endpoint.
    ///
    /// An endpoint shared with the segment stored in a y-node lies on it, in which case the
    /// other endpoint of the new segment decides on which side it goes.
    pub(crate) fn locate_endpoint(&self, s: SegmentId, end: Endpoint) -> Invariant<TrapId> {
        let segment = &self.segments[s.0];
        let (p, q) = (self.point(segment.p), self.point(segment.q));
        let (v, point, other_end) = match end {
            Endpoint::Left => (segment.p, p, q),
            Endpoint::Right => (segment.q, q, p),
        };

        let mut idx = 0;
        loop {
            let node = &self.dag[idx];
            let child = match node.data {
                Node::Leaf(trap) => return Ok(trap),
                Node::X(w) => {
                    let go_right = if w == v || self.point(w) == point {
                        // The segment lies right of its left endpoint, left of its right one
                        end == Endpoint::Left
                    } else {
                        point.is_right_of(&self.point(w))
                    };
                    usize::from(go_right)
                }
                Node::Y(other) => {
                    let other = &self.segments[other.0];
                    let (a, b) = (self.point(other.p), self.point(other.q));
                    let above = match point.position(a, b) {
                        Positioning::Left => true,
                        Positioning::Right => false,
                        Positioning::On => other_end.position(a, b) == Positioning::Left,
                    };
                    usize::from(!above)
                }
            };
            idx = node.children[child];
        }
    }

    /// Lists the trapezoids crossed by segment `s`, from left to right.
    pub(crate) fn follow_segment(&self, s: SegmentId) -> Invariant<Vec<TrapId>> {
        let segment = &self.segments[s.0];
        let (p, q) = (self.point(segment.p), self.point(segment.q));

        let mut current = self.locate_endpoint(s, Endpoint::Left)?;
        let mut crossed = vec![current];
        let mut trap = self.trap(current)?;
        while trap.rightp != segment.q && self.point(trap.rightp).lex_cmp(&q).is_lt() {
            let next = if matches!(self.point(trap.rightp).position(p, q), Positioning::Right) {
                trap.right.upper
            } else {
                trap.right.lower
            };
            current = next.ok_or(InvariantKind::MissingNeighbor {
                trap: current,
                side: Side::Right,
            })?;
            trace!(segment = %s, trap = %current, "Crossing");
            crossed.push(current);
            trap = self.trap(current)?;
        }

        let expected = self.locate_endpoint(s, Endpoint::Right)?;
        if current != expected {
            return Err(InvariantKind::EndpointMismatch {
                reached: current,
                expected,
            });
        }
        Ok(crossed)
    }

    /// Links two new trapezoids across the vertical side they share.
    fn link(&mut self, left: TrapId, right: TrapId, slot: Slot) -> Invariant<()> {
        *self.trap_mut(left)?.right.get_mut(slot) = Some(right);
        *self.trap_mut(right)?.left.get_mut(slot) = Some(left);
        Ok(())
    }

    /// Makes `neighbor` point to `new` instead of `old`.
    ///
    /// `side` is the side of `neighbor` on which `old` was.
    fn relink(
        &mut self,
        neighbor: Option<TrapId>,
        side: Side,
        slot: Slot,
        old: TrapId,
        new: TrapId,
    ) -> Invariant<()> {
        let Some(neighbor) = neighbor else {
            return Ok(());
        };
        let trap = self.trap_mut(neighbor)?;
        let neighbors = match side {
            Side::Left => &mut trap.left,
            Side::Right => &mut trap.right,
        };
        let link = neighbors.get_mut(slot);
        if *link != Some(old) {
            return Err(InvariantKind::NeighborMismatch {
                trap: neighbor,
                side,
                expected: old,
            });
        }
        *link = Some(new);
        Ok(())
    }

    /// Hands the left neighbors of the retired trapezoid `old_id` over to `lower` and `upper`.
    fn take_left_neighbors(
        &mut self,
        old_id: TrapId,
        old: &Trapezoid,
        lower: TrapId,
        upper: TrapId,
    ) -> Invariant<()> {
        self.relink(old.left.lower, Side::Right, Slot::Lower, old_id, lower)?;
        self.relink(old.left.upper, Side::Right, Slot::Upper, old_id, upper)?;
        self.trap_mut(lower)?.left.lower = old.left.lower;
        self.trap_mut(upper)?.left.upper = old.left.upper;
        Ok(())
    }

    /// Hands the right neighbors of the retired trapezoid `old_id` over to `lower` and `upper`.
    fn take_right_neighbors(
        &mut self,
        old_id: TrapId,
        old: &Trapezoid,
        lower: TrapId,
        upper: TrapId,
    ) -> Invariant<()> {
        self.relink(old.right.lower, Side::Left, Slot::Lower, old_id, lower)?;
        self.relink(old.right.upper, Side::Left, Slot::Upper, old_id, upper)?;
        self.trap_mut(lower)?.right.lower = old.right.lower;
        self.trap_mut(upper)?.right.upper = old.right.upper;
        Ok(())
    }

    /// Inserts segment `s`, which lies entirely inside trapezoid `old_id`.
    ///
    /// The trapezoid is split in two (above and below `s`), three or four, depending on whether
    /// the endpoints of `s` are new vertices.
    fn split_one(&mut self, s: SegmentId, old_id: TrapId) -> Invariant<()> {
        let Segment { p, q, .. } = self.segments[s.0];
        let old = self.retire(old_id)?;

        let above = self.add_trap(Trapezoid::new(p, q, s, old.top));
        let below = self.add_trap(Trapezoid::new(p, q, old.bottom, s));

        let left = if p != old.leftp {
            let left = self.add_trap(Trapezoid::new(old.leftp, p, old.bottom, old.top));
            self.take_left_neighbors(old_id, &old, left, left)?;
            self.link(left, below, Slot::Lower)?;
            self.link(left, above, Slot::Upper)?;
            Some(left)
        } else {
            self.take_left_neighbors(old_id, &old, below, above)?;
            None
        };

        let right = if q != old.rightp {
            let right = self.add_trap(Trapezoid::new(q, old.rightp, old.bottom, old.top));
            self.take_right_neighbors(old_id, &old, right, right)?;
            self.link(below, right, Slot::Lower)?;
            self.link(above, right, Slot::Upper)?;
            Some(right)
        } else {
            self.take_right_neighbors(old_id, &old, below, above)?;
            None
        };

        self.replace_leaf(old.node, s, left, right, above, below)
    }

    /// Inserts segment `s`, which crosses the trapezoids `crossed` (at least two).
    ///
    /// Every crossed trapezoid is split into a part above `s` and a part below it. Consecutive
    /// parts are merged as long as the vertical side between them does not reach `s`: the parts
    /// above are separated only where the side's vertex lies above `s`, the parts below only
    /// where it lies below.
    fn split_many(&mut self, s: SegmentId, crossed: &[TrapId]) -> Invariant<()> {
        let Segment { p, q, .. } = self.segments[s.0];
        let (pp, qp) = (self.point(p), self.point(q));
        let mut old = Vec::with_capacity(crossed.len());
        for &id in crossed {
            old.push((id, self.retire(id)?));
        }
        let k = old.len() - 1;

        // Whether the vertex separating old[i] from old[i + 1] lies above s
        let above_s: Vec<bool> = old[..k]
            .iter()
            .map(|(_, trap)| {
                !matches!(
                    self.point(trap.rightp).position(pp, qp),
                    Positioning::Right
                )
            })
            .collect();

        let upper = self.merge_runs(s, &old, &above_s, Slot::Upper)?;
        let lower = self.merge_runs(s, &old, &above_s, Slot::Lower)?;

        let (first_id, first) = &old[0];
        let left = if p != first.leftp {
            let cap = self.add_trap(Trapezoid::new(first.leftp, p, first.bottom, first.top));
            self.take_left_neighbors(*first_id, first, cap, cap)?;
            self.link(cap, lower[0], Slot::Lower)?;
            self.link(cap, upper[0], Slot::Upper)?;
            Some(cap)
        } else {
            self.take_left_neighbors(*first_id, first, lower[0], upper[0])?;
            None
        };

        let (last_id, last) = &old[k];
        let right = if q != last.rightp {
            let cap = self.add_trap(Trapezoid::new(q, last.rightp, last.bottom, last.top));
            self.take_right_neighbors(*last_id, last, cap, cap)?;
            self.link(lower[k], cap, Slot::Lower)?;
            self.link(upper[k], cap, Slot::Upper)?;
            Some(cap)
        } else {
            self.take_right_neighbors(*last_id, last, lower[k], upper[k])?;
            None
        };

        // Vertical sides between crossed trapezoids
        for i in 0..k {
            let ((a_id, a), (b_id, b)) = (&old[i], &old[i + 1]);
            if above_s[i] {
                // old[i + 1] is the lower right neighbor of old[i]
                self.link(upper[i], upper[i + 1], Slot::Lower)?;
                self.relink(a.right.upper, Side::Left, Slot::Upper, *a_id, upper[i])?;
                self.trap_mut(upper[i])?.right.upper = a.right.upper;
                self.relink(b.left.upper, Side::Right, Slot::Upper, *b_id, upper[i + 1])?;
                self.trap_mut(upper[i + 1])?.left.upper = b.left.upper;
            } else {
                self.link(lower[i], lower[i + 1], Slot::Upper)?;
                self.relink(a.right.lower, Side::Left, Slot::Lower, *a_id, lower[i])?;
                self.trap_mut(lower[i])?.right.lower = a.right.lower;
                self.relink(b.left.lower, Side::Right, Slot::Lower, *b_id, lower[i + 1])?;
                self.trap_mut(lower[i + 1])?.left.lower = b.left.lower;
            }
        }

        for (i, (_, trap)) in old.iter().enumerate() {
            let left = if i == 0 { left } else { None };
            let right = if i == k { right } else { None };
            self.replace_leaf(trap.node, s, left, right, upper[i], lower[i])?;
        }
        Ok(())
    }

    /// Creates the trapezoids on one side of `s` (above for [`Slot::Upper`], below for
    /// [`Slot::Lower`]), returning the one covering each crossed trapezoid.
    fn merge_runs(
        &mut self,
        s: SegmentId,
        old: &[(TrapId, Trapezoid)],
        above_s: &[bool],
        side: Slot,
    ) -> Invariant<Vec<TrapId>> {
        let Segment { p, q, .. } = self.segments[s.0];
        let k = old.len() - 1;
        let upper = side == Slot::Upper;

        let mut merged = Vec::with_capacity(old.len());
        let mut start = 0;
        for i in 0..=k {
            if i < k && above_s[i] != upper {
                continue;
            }
            let first = &old[start].1;
            let (bottom, top) = if upper {
                (s, first.top)
            } else {
                (first.bottom, s)
            };
            if let Some((id, _)) = old[start..=i].iter().find(|(_, trap)| {
                if upper {
                    trap.top != top
                } else {
                    trap.bottom != bottom
                }
            }) {
                return Err(InvariantKind::BoundaryMismatch { trap: *id });
            }

            let leftp = if start == 0 { p } else { first.leftp };
            let rightp = if i == k { q } else { old[i].1.rightp };
            let id = self.add_trap(Trapezoid::new(leftp, rightp, bottom, top));
            merged.extend(std::iter::repeat(id).take(i + 1 - start));
            start = i + 1;
        }
        Ok(merged)
    }

    /// Turns the leaf of a retired trapezoid into the sub-DAG locating its replacements.
    ///
    /// Depending on the caps: `Y(s)`, `X(p)[left, Y(s)]`, `X(q)[Y(s), right]` or
    /// `X(p)[left, X(q)[Y(s), right]]`, where `Y(s)` has children `[above, below]`.
    fn replace_leaf(
        &mut self,
        leaf: usize,
        s: SegmentId,
        left: Option<TrapId>,
        right: Option<TrapId>,
        above: TrapId,
        below: TrapId,
    ) -> Invariant<()> {
        let Segment { p, q, .. } = self.segments[s.0];
        let above = self.trap(above)?.node;
        let below = self.trap(below)?.node;
        let left = left.map(|id| self.trap(id).map(|trap| trap.node)).transpose()?;
        let right = right.map(|id| self.trap(id).map(|trap| trap.node)).transpose()?;

        let malformed = InvariantKind::MalformedNode { node: leaf };
        let y_node = match (left, right) {
            (None, None) => {
                self.dag.entry(leaf).and_modify(|node| *node = Node::Y(s));
                leaf
            }
            (Some(left), None) => {
                let mut entry = self.dag.entry(leaf).and_modify(|node| *node = Node::X(p));
                entry.append(left);
                entry.append_new(Node::Y(s)).ok_or(malformed)?
            }
            (None, Some(right)) => {
                let mut entry = self.dag.entry(leaf).and_modify(|node| *node = Node::X(q));
                let y_node = entry.append_new(Node::Y(s)).ok_or(malformed)?;
                entry.append(right);
                y_node
            }
            (Some(left), Some(right)) => {
                let mut entry = self.dag.entry(leaf).and_modify(|node| *node = Node::X(p));
                entry.append(left);
                let q_node = entry.append_new(Node::X(q)).ok_or(malformed)?;
                let mut entry = self.dag.entry(q_node);
                let y_node = entry.append_new(Node::Y(s)).ok_or(malformed)?;
                entry.append(right);
                y_node
            }
        };
        self.dag.entry(y_node).append(above);
        self.dag.entry(y_node).append(below);
        Ok(())
    }

    /// Checks the invariants of the map.
    ///
    /// These are:
    /// - adjacency is symmetric, slot by slot, and neighbors share a vertical side;
    /// - every live trapezoid is represented by exactly one leaf of the DAG and vice versa;
    /// - the DAG has no isolated node, and its inner nodes have two children.
    ///
    /// Violations are reported against the last inserted segment.
    pub fn check(&self) -> Result<()> {
        let segment = SegmentId(self.segments.len() - 1);
        self.check_invariants()
            .map_err(|kind| Error::Invariant { segment, kind })
    }

    fn check_invariants(&self) -> Invariant<()> {
        for (id, trap) in self.trapezoids() {
            if self.dag.get(trap.node).map(|node| node.data) != Some(Node::Leaf(id)) {
                return Err(InvariantKind::NotALeaf { trap: id });
            }
            for slot in [Slot::Lower, Slot::Upper] {
                if let Some(neighbor) = trap.right.get(slot) {
                    let other = self.trap(neighbor)?;
                    if other.left.get(slot) != Some(id) {
                        return Err(InvariantKind::Asymmetric { trap: id, neighbor });
                    }
                    if other.leftp != trap.rightp {
                        return Err(InvariantKind::WallMismatch { trap: id, neighbor });
                    }
                }
                if let Some(neighbor) = trap.left.get(slot) {
                    if self.trap(neighbor)?.right.get(slot) != Some(id) {
                        return Err(InvariantKind::Asymmetric { trap: id, neighbor });
                    }
                }
            }
        }

        for (idx, node) in self.dag.iter().enumerate() {
            let children = match node.data {
                Node::Leaf(id) => {
                    if self.trap(id)?.node != idx {
                        return Err(InvariantKind::NotALeaf { trap: id });
                    }
                    0
                }
                Node::X(..) | Node::Y(..) => 2,
            };
            if node.children.len() != children || (idx != 0 && node.parents.is_empty()) {
                return Err(InvariantKind::MalformedNode { node: idx });
            }
        }
        Ok(())
    }

    /// Returns the number of live trapezoids.
    pub fn trapezoid_count(&self) -> usize {
        self.live
    }

    /// Returns the number of x-nodes in the DAG.
    pub fn x_node_count(&self) -> usize {
        self.dag
            .iter()
            .filter(|&node| matches!(node.data, Node::X(..)))
            .count()
    }

    /// Returns the number of y-nodes in the DAG.
    pub fn y_node_count(&self) -> usize {
        self.dag
            .iter()
            .filter(|&node| matches!(node.data, Node::Y(..)))
            .count()
    }

    /// Returns the number of segments, including the four sides of the bounding box.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Computes some statistics of the map.
    ///
    /// These are the number of x-nodes, y-nodes and trapezoids, and the average and max depth
    /// of the leaves.
    pub fn stats(&self) -> Stats {
        let depths = self.dag.depths();
        let mut stats = Stats::default();
        let mut total_depth = 0;
        for (node, depth) in self.dag.iter().zip(depths) {
            match node.data {
                Node::X(..) => stats.x_nodes += 1,
                Node::Y(..) => stats.y_nodes += 1,
                Node::Leaf(..) => {
                    stats.trapezoids += 1;
                    let depth = depth.unwrap_or_default();
                    total_depth += depth;
                    stats.max_depth = stats.max_depth.max(depth);
                }
            }
        }
        if stats.trapezoids > 0 {
            stats.average_depth = total_depth as f64 / stats.trapezoids as f64;
        }
        stats
    }

    /// The coordinates of a vertex. Corners of the bounding box come after the subdivision's
    /// own vertices.
    pub fn vertex(&self, id: VertexId) -> Option<Point> {
        self.vertices.get(id.0).map(|vertex| vertex.point)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    /// Returns the trapezoid with index `id`, unless it has been retired.
    pub fn trapezoid(&self, id: TrapId) -> Option<&Trapezoid> {
        self.traps.get(id.0).and_then(Option::as_ref)
    }

    /// An iterator over the live trapezoids.
    pub fn trapezoids(&self) -> impl Iterator<Item = (TrapId, &Trapezoid)> + '_ {
        self.traps
            .iter()
            .enumerate()
            .filter_map(|(idx, trap)| trap.as_ref().map(|trap| (TrapId(idx), trap)))
    }

    /// The neighbors on the left side of a live trapezoid, bottom first.
    pub fn left_neighbors(&self, id: TrapId) -> SmallVec<[TrapId; 2]> {
        self.trapezoid(id)
            .map(|trap| trap.left.list())
            .unwrap_or_default()
    }

    /// The neighbors on the right side of a live trapezoid, bottom first.
    pub fn right_neighbors(&self, id: TrapId) -> SmallVec<[TrapId; 2]> {
        self.trapezoid(id)
            .map(|trap| trap.right.list())
            .unwrap_or_default()
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// The face outside of every bounded face, if the map was built from a subdivision.
    pub fn unbounded_face(&self) -> Option<FaceId> {
        self.unbounded
    }
}

/// Size and depth of a [`TrapMap`]'s search structure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub x_nodes: usize,
    pub y_nodes: usize,
    pub trapezoids: usize,
    pub max_depth: usize,
    pub average_depth: f64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trapezoidal map counts:\n\t{} X node(s)\n\t{} Y node(s)\n\t{} trapezoid(s)",
            self.x_nodes, self.y_nodes, self.trapezoids,
        )?;
        writeln!(f)?;
        write!(
            f,
            "Depth:\n\tmax {}\n\taverage {:.2}",
            self.max_depth, self.average_depth
        )
    }
}
