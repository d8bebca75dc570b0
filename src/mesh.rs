//! Half-edge mesh arena.
//!
//! Vertices, half-edges and faces live in dense `Vec` arenas addressed
//! by `Copy` id handles; every `next`/`prev`/`opposite`/`face`/`outside`
//! slot is a handle rather than an owning reference, with `None` as the
//! absent-link sentinel. Faces are never removed from the arena during
//! construction; they are marked [`Mark::Deleted`] and pruned from the
//! builder's face list at the end.

use glam::DVec3;

use crate::error::HullError;

/// Handle into the vertex arena. Vertices are pushed once, in input
/// order, and never moved, so the handle doubles as the original input
/// index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VertexId(pub(crate) usize);

/// Handle into the half-edge arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeId(pub(crate) usize);

/// Handle into the face arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FaceId(pub(crate) usize);

/// An input point together with its linked-list membership and the face
/// currently claiming it as an outside vertex.
#[derive(Debug)]
pub(crate) struct Vertex {
    pub(crate) point: DVec3,
    pub(crate) prev: Option<VertexId>,
    pub(crate) next: Option<VertexId>,
    pub(crate) face: Option<FaceId>,
}

impl Vertex {
    pub(crate) fn new(point: DVec3) -> Self {
        Self {
            point,
            prev: None,
            next: None,
            face: None,
        }
    }
}

/// A directed edge of a face ring. `next`/`prev` close the ring from
/// construction on; `opposite` is the matching half-edge in the
/// neighboring face, traversed in reverse orientation, and is only
/// absent while a face is being stitched in.
#[derive(Debug)]
pub(crate) struct HalfEdge {
    pub(crate) head: VertexId,
    pub(crate) face: FaceId,
    pub(crate) next: EdgeId,
    pub(crate) prev: EdgeId,
    pub(crate) opposite: Option<EdgeId>,
}

/// Face lifecycle mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mark {
    /// Part of the hull under construction.
    Visible,
    /// Flagged concave by the first merge pass; revisited by the second.
    NonConvex,
    /// Absorbed or destroyed; must not be traversed via `opposite`.
    Deleted,
}

/// A planar polygonal face of the hull.
#[derive(Debug)]
pub(crate) struct Face {
    /// One edge of the face's ring.
    pub(crate) edge: EdgeId,
    /// Ring length; 3 until merges enlarge the face.
    pub(crate) num_vertices: usize,
    /// Outward unit normal.
    pub(crate) normal: DVec3,
    pub(crate) centroid: DVec3,
    /// Plane offset, `normal . centroid`.
    pub(crate) offset: f64,
    /// Length of the Newell sum; twice the polygon area for triangles.
    /// Used for relative comparison only.
    pub(crate) area: f64,
    pub(crate) mark: Mark,
    /// Head of this face's run in the claimed list.
    pub(crate) outside: Option<VertexId>,
}

impl Face {
    /// Signed distance from the face plane; positive means outside.
    pub(crate) fn distance_to_plane(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }
}

#[derive(Debug, Default)]
pub(crate) struct Mesh {
    pub(crate) verts: Vec<Vertex>,
    pub(crate) edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
}

impl Mesh {
    pub(crate) fn vert(&self, v: VertexId) -> &Vertex {
        &self.verts[v.0]
    }

    pub(crate) fn vert_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.verts[v.0]
    }

    pub(crate) fn edge(&self, e: EdgeId) -> &HalfEdge {
        &self.edges[e.0]
    }

    pub(crate) fn edge_mut(&mut self, e: EdgeId) -> &mut HalfEdge {
        &mut self.edges[e.0]
    }

    pub(crate) fn face(&self, f: FaceId) -> &Face {
        &self.faces[f.0]
    }

    pub(crate) fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f.0]
    }

    /// The opposite half-edge, or an invariant error where the mesh is
    /// supposed to be closed.
    pub(crate) fn opposite(&self, edge: EdgeId) -> Result<EdgeId, HullError> {
        self.edges[edge.0]
            .opposite
            .ok_or(HullError::InternalInvariant("half-edge is missing its opposite"))
    }

    /// Links `a` and `b` as opposites of each other.
    pub(crate) fn set_opposite(&mut self, a: EdgeId, b: EdgeId) {
        self.edges[a.0].opposite = Some(b);
        self.edges[b.0].opposite = Some(a);
    }

    /// Tail vertex of `edge`, the head of its ring predecessor.
    pub(crate) fn tail(&self, edge: EdgeId) -> VertexId {
        let prev = self.edges[edge.0].prev;
        self.edges[prev.0].head
    }

    pub(crate) fn edge_length_squared(&self, edge: EdgeId) -> f64 {
        let head = self.vert(self.edge(edge).head).point;
        let tail = self.vert(self.tail(edge)).point;
        head.distance_squared(tail)
    }

    /// Walks `steps` signed steps from the face's reference edge along
    /// `next` (positive) or `prev` (negative).
    pub(crate) fn edge_at(&self, face: FaceId, steps: isize) -> EdgeId {
        let mut edge = self.faces[face.0].edge;
        if steps >= 0 {
            for _ in 0..steps {
                edge = self.edges[edge.0].next;
            }
        } else {
            for _ in 0..(-steps) {
                edge = self.edges[edge.0].prev;
            }
        }
        edge
    }

    /// The face's boundary as original input indices, in ring order.
    pub(crate) fn face_ring(&self, face: FaceId) -> Vec<usize> {
        let first = self.faces[face.0].edge;
        let mut ring = Vec::with_capacity(self.faces[face.0].num_vertices);
        let mut edge = first;
        loop {
            ring.push(self.edges[edge.0].head.0);
            edge = self.edges[edge.0].next;
            if edge == first {
                break;
            }
        }
        ring
    }

    /// Builds a triangular face whose edge ring `e0 -> e1 -> e2` has the
    /// head sequence `v0, v1, v2`, leaving the opposites unset.
    pub(crate) fn create_triangle(
        &mut self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
        min_area: f64,
    ) -> FaceId {
        let face = FaceId(self.faces.len());
        let e0 = EdgeId(self.edges.len());
        let e1 = EdgeId(e0.0 + 1);
        let e2 = EdgeId(e0.0 + 2);
        self.edges.push(HalfEdge { head: v0, face, next: e1, prev: e2, opposite: None });
        self.edges.push(HalfEdge { head: v1, face, next: e2, prev: e0, opposite: None });
        self.edges.push(HalfEdge { head: v2, face, next: e0, prev: e1, opposite: None });
        self.faces.push(Face {
            edge: e0,
            num_vertices: 3,
            normal: DVec3::ZERO,
            centroid: DVec3::ZERO,
            offset: 0.0,
            area: 0.0,
            mark: Mark::Visible,
            outside: None,
        });
        self.compute_normal_and_centroid(face, min_area);
        face
    }

    /// Newell-style normal accumulation over the edge ring. Recomputes
    /// `num_vertices` in the same pass and leaves `area` as the length
    /// of the unnormalized sum.
    pub(crate) fn compute_normal(&mut self, face: FaceId) {
        let e0 = self.faces[face.0].edge;
        let e1 = self.edges[e0.0].next;
        let mut e2 = self.edges[e1.0].next;
        let p0 = self.vert(self.edges[e0.0].head).point;
        let mut v2 = self.vert(self.edges[e1.0].head).point - p0;
        let mut normal = DVec3::ZERO;
        let mut num_vertices = 2;
        while e2 != e0 {
            let v1 = v2;
            v2 = self.vert(self.edges[e2.0].head).point - p0;
            normal += v1.cross(v2);
            e2 = self.edges[e2.0].next;
            num_vertices += 1;
        }
        let area = normal.length();
        let f = &mut self.faces[face.0];
        f.num_vertices = num_vertices;
        f.area = area;
        f.normal = if area > 0.0 { normal / area } else { DVec3::ZERO };
    }

    /// Normal computation with a sliver correction: when the Newell area
    /// falls below `min_area`, the normal is recomputed as if the ring's
    /// longest edge were absent, so a nearly collinear vertex cannot
    /// amplify noise into the plane orientation.
    pub(crate) fn compute_normal_min_area(&mut self, face: FaceId, min_area: f64) {
        self.compute_normal(face);
        if self.faces[face.0].area < min_area {
            let first = self.faces[face.0].edge;
            let mut max_edge = first;
            let mut max_squared = 0.0;
            let mut edge = first;
            loop {
                let length_squared = self.edge_length_squared(edge);
                if length_squared > max_squared {
                    max_edge = edge;
                    max_squared = length_squared;
                }
                edge = self.edges[edge.0].next;
                if edge == first {
                    break;
                }
            }
            let head = self.vert(self.edge(max_edge).head).point;
            let tail = self.vert(self.tail(max_edge)).point;
            let direction = (head - tail) / max_squared.sqrt();
            let f = &mut self.faces[face.0];
            let projection = f.normal.dot(direction);
            f.normal = (f.normal - projection * direction).normalize_or_zero();
        }
    }

    /// Arithmetic mean of the ring's head vertices.
    pub(crate) fn compute_centroid(&mut self, face: FaceId) {
        let first = self.faces[face.0].edge;
        let mut centroid = DVec3::ZERO;
        let mut edge = first;
        loop {
            centroid += self.vert(self.edges[edge.0].head).point;
            edge = self.edges[edge.0].next;
            if edge == first {
                break;
            }
        }
        let f = &mut self.faces[face.0];
        f.centroid = centroid / f.num_vertices as f64;
    }

    pub(crate) fn compute_normal_and_centroid(&mut self, face: FaceId, min_area: f64) {
        if min_area > 0.0 {
            self.compute_normal_min_area(face, min_area);
        } else {
            self.compute_normal(face);
        }
        self.compute_centroid(face);
        let f = &mut self.faces[face.0];
        f.offset = f.normal.dot(f.centroid);
    }

    /// Absorbs the face on the opposite side of `edge` into `face`.
    ///
    /// The absorbed face is marked deleted and pushed onto `discarded`,
    /// together with any neighbor that the boundary stitching collapses.
    /// The survivor's normal and centroid are recomputed at the end.
    pub(crate) fn merge_adjacent_faces(
        &mut self,
        face: FaceId,
        edge: EdgeId,
        discarded: &mut Vec<FaceId>,
    ) -> Result<(), HullError> {
        let opposite = self.opposite(edge)?;
        let opposite_face = self.edge(opposite).face;

        discarded.push(opposite_face);
        self.face_mut(opposite_face).mark = Mark::Deleted;

        // The two faces may share a run of edges, not just `edge`.
        // Extend the run leftward from `edge` and rightward from
        // `edge.next`; the mirrored cursors walk the absorbed ring.
        let mut adjacent_prev = self.edge(edge).prev;
        let mut adjacent_next = self.edge(edge).next;
        let mut opposite_prev = self.edge(opposite).prev;
        let mut opposite_next = self.edge(opposite).next;

        while self.edge(self.opposite(adjacent_prev)?).face == opposite_face {
            adjacent_prev = self.edge(adjacent_prev).prev;
            opposite_next = self.edge(opposite_next).next;
        }
        while self.edge(self.opposite(adjacent_next)?).face == opposite_face {
            adjacent_next = self.edge(adjacent_next).next;
            opposite_prev = self.edge(opposite_prev).prev;
        }

        // The absorbed face's non-shared edges now belong to `face`.
        let stop = self.edge(opposite_prev).next;
        let mut adopted = opposite_next;
        while adopted != stop {
            self.edge_mut(adopted).face = face;
            adopted = self.edge(adopted).next;
        }

        // `adjacent_next` is guaranteed to survive the stitch.
        self.face_mut(face).edge = adjacent_next;

        if let Some(collapsed) = self.connect_half_edges(face, opposite_prev, adjacent_next)? {
            discarded.push(collapsed);
        }
        if let Some(collapsed) = self.connect_half_edges(face, adjacent_prev, opposite_next)? {
            discarded.push(collapsed);
        }

        self.compute_normal_and_centroid(face, 0.0);
        Ok(())
    }

    /// Relinks `prev -> next` across a merged boundary.
    ///
    /// When both extremes point into the same neighbor, `prev` would
    /// duplicate an edge into that neighbor; the redundant edge is
    /// dropped and the neighbor collapses: a triangle neighbor is
    /// destroyed outright (returned as discarded), a larger neighbor has
    /// the redundant edge spliced out of its ring.
    fn connect_half_edges(
        &mut self,
        face: FaceId,
        prev: EdgeId,
        next: EdgeId,
    ) -> Result<Option<FaceId>, HullError> {
        let prev_opposite = self.opposite(prev)?;
        let next_opposite = self.opposite(next)?;
        let mut discarded = None;

        if self.edge(prev_opposite).face == self.edge(next_opposite).face {
            let neighbor = self.edge(next_opposite).face;
            if self.face(face).edge == prev {
                self.face_mut(face).edge = next;
            }
            let new_opposite;
            if self.face(neighbor).num_vertices == 3 {
                // The neighbor is reduced to two edges; destroy it.
                new_opposite = self.opposite(self.edge(next_opposite).prev)?;
                self.face_mut(neighbor).mark = Mark::Deleted;
                discarded = Some(neighbor);
            } else {
                new_opposite = self.edge(next_opposite).next;
                let redundant = self.edge(new_opposite).prev;
                if self.face(neighbor).edge == redundant {
                    self.face_mut(neighbor).edge = new_opposite;
                }
                let before = self.edge(redundant).prev;
                self.edge_mut(new_opposite).prev = before;
                self.edge_mut(before).next = new_opposite;
            }
            let prev_prev = self.edge(prev).prev;
            self.edge_mut(next).prev = prev_prev;
            self.edge_mut(prev_prev).next = next;
            self.set_opposite(next, new_opposite);
            if discarded.is_none() {
                self.compute_normal_and_centroid(neighbor, 0.0);
            }
        } else {
            self.edge_mut(prev).next = next;
            self.edge_mut(next).prev = prev;
        }
        Ok(discarded)
    }
}
