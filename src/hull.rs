//! Quickhull builder and hull output.

use glam::DVec3;

use crate::error::{Degeneracy, HullError};
use crate::list::VertexList;
use crate::math::{point_line_distance, triangle_normal};
use crate::mesh::{EdgeId, FaceId, Mark, Mesh, Vertex, VertexId};
use crate::point::HullPoint;

/// Which concave pairs a merge pass is allowed to collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergePolicy {
    /// Merge only when the larger of the two faces sees the pair as
    /// non-convex; concave pairs seen only from the smaller face are
    /// left for the second pass.
    NonConvexWrtLargerFace,
    /// Merge when either face sees the pair as non-convex.
    NonConvex,
}

/// Incremental Quickhull builder over a half-edge mesh.
///
/// The builder computes a classification tolerance from the input
/// extents, constructs an initial tetrahedron, and then folds in one
/// outside point at a time: the faces visible from the point are
/// deleted, new triangles are fanned around the resulting horizon, and
/// two merge passes restore strict convexity in the presence of
/// near-coplanar faces. Construction is one-shot and single-threaded.
///
/// ```
/// use hull3d::QuickHull;
///
/// let points = [
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
///     [0.0, 0.0, 1.0],
/// ];
/// let hull = QuickHull::new(&points).unwrap().build().unwrap();
/// assert_eq!(hull.faces().len(), 4);
/// ```
#[derive(Debug)]
pub struct QuickHull {
    mesh: Mesh,
    /// All outside vertices, grouped in contiguous per-face runs.
    claimed: VertexList,
    /// Vertices orphaned by face deletion, awaiting reassignment. Empty
    /// outside the window between horizon computation and orphan
    /// resolution.
    unclaimed: VertexList,
    /// Every face ever created; pruned down to the hull by `reindex`.
    hull_faces: Vec<FaceId>,
    /// Faces created for the outside point currently being added.
    new_faces: Vec<FaceId>,
    tolerance: f64,
    triangulate: bool,
}

impl QuickHull {
    /// Prepares a builder for the given points.
    ///
    /// ## Errors
    /// [`HullError::TooFewPoints`] for fewer than four points, and
    /// [`HullError::BadInput`] for a NaN or infinite coordinate.
    pub fn new<P: HullPoint>(points: &[P]) -> Result<Self, HullError> {
        if points.len() < 4 {
            return Err(HullError::TooFewPoints(points.len()));
        }

        let mut mesh = Mesh::default();
        mesh.verts.reserve(points.len());
        for (index, candidate) in points.iter().enumerate() {
            let point = candidate.coords();
            for value in point.to_array() {
                if !value.is_finite() {
                    return Err(HullError::BadInput { index, value });
                }
            }
            mesh.verts.push(Vertex::new(point));
        }

        Ok(Self {
            mesh,
            claimed: VertexList::new(),
            unclaimed: VertexList::new(),
            hull_faces: Vec::new(),
            new_faces: Vec::new(),
            tolerance: 0.0,
            triangulate: true,
        })
    }

    /// Emits polygonal faces as-is instead of fan-triangulating them.
    #[must_use]
    pub fn skip_triangulation(mut self, skip: bool) -> Self {
        self.triangulate = !skip;
        self
    }

    /// Runs the algorithm and emits the hull.
    ///
    /// ## Errors
    /// [`HullError::Degenerate`] when the points are coincident,
    /// collinear or coplanar within tolerance (a flat simplex is not
    /// accepted), and [`HullError::InternalInvariant`] if a builder
    /// consistency check fails.
    pub fn build(mut self) -> Result<ConvexHull, HullError> {
        self.create_initial_simplex()?;

        let mut additions = 0usize;
        while let Some(eye) = self.next_vertex_to_add() {
            additions += 1;
            self.add_vertex_to_hull(eye)?;
        }
        self.reindex();
        log::debug!(
            "hull complete: {} faces after {} point additions",
            self.hull_faces.len(),
            additions
        );

        let faces = self.collect_faces()?;
        let points = self.mesh.verts.into_iter().map(|v| v.point).collect();
        Ok(ConvexHull { points, faces, tolerance: self.tolerance })
    }

    /// One pass over all points: per-axis extreme vertices, plus the
    /// classification tolerance scaled to the input extents.
    fn compute_extremes(&mut self) -> ([VertexId; 3], [VertexId; 3]) {
        let mut min = self.mesh.verts[0].point;
        let mut max = min;
        let mut min_vertices = [VertexId(0); 3];
        let mut max_vertices = [VertexId(0); 3];

        for (i, vertex) in self.mesh.verts.iter().enumerate().skip(1) {
            let point = vertex.point;
            for axis in 0..3 {
                if point[axis] < min[axis] {
                    min[axis] = point[axis];
                    min_vertices[axis] = VertexId(i);
                }
                if point[axis] > max[axis] {
                    max[axis] = point[axis];
                    max_vertices[axis] = VertexId(i);
                }
            }
        }

        self.tolerance = 3.0
            * f64::EPSILON
            * (min.x.abs().max(max.x.abs())
                + min.y.abs().max(max.y.abs())
                + min.z.abs().max(max.z.abs()));
        (min_vertices, max_vertices)
    }

    fn create_initial_simplex(&mut self) -> Result<(), HullError> {
        let (min_vertices, max_vertices) = self.compute_extremes();
        log::trace!("tolerance: {:e}", self.tolerance);

        // v0, v1: the extreme pair along the axis of largest extent.
        let mut max_extent = 0.0;
        let mut axis = 0;
        for i in 0..3 {
            let extent =
                self.mesh.vert(max_vertices[i]).point[i] - self.mesh.vert(min_vertices[i]).point[i];
            if extent > max_extent {
                max_extent = extent;
                axis = i;
            }
        }
        if max_extent <= self.tolerance {
            return Err(HullError::Degenerate(Degeneracy::Coincident));
        }
        let v0 = min_vertices[axis];
        let v1 = max_vertices[axis];
        let p0 = self.mesh.vert(v0).point;
        let p1 = self.mesh.vert(v1).point;

        // v2: the point farthest from the line through v0 and v1.
        let mut v2 = None;
        let mut max_distance = self.tolerance;
        for i in 0..self.mesh.verts.len() {
            let id = VertexId(i);
            if id == v0 || id == v1 {
                continue;
            }
            let distance = point_line_distance(self.mesh.verts[i].point, p0, p1);
            if distance > max_distance {
                max_distance = distance;
                v2 = Some(id);
            }
        }
        let v2 = v2.ok_or(HullError::Degenerate(Degeneracy::Collinear))?;
        let p2 = self.mesh.vert(v2).point;

        // v3: the point farthest from the plane through v0, v1 and v2.
        let normal = triangle_normal(p0, p1, p2);
        let plane_offset = normal.dot(p0);
        let mut v3 = None;
        let mut max_distance = self.tolerance;
        for i in 0..self.mesh.verts.len() {
            let id = VertexId(i);
            if id == v0 || id == v1 || id == v2 {
                continue;
            }
            let distance = (self.mesh.verts[i].point.dot(normal) - plane_offset).abs();
            if distance > max_distance {
                max_distance = distance;
                v3 = Some(id);
            }
        }
        let v3 = v3.ok_or(HullError::Degenerate(Degeneracy::Coplanar))?;
        log::trace!("initial tetrahedron: {} {} {} {}", v0.0, v1.0, v2.0, v3.0);

        // Orient the tetrahedron so every face normal points outward,
        // then stitch the twelve half-edge opposites.
        let faces: [FaceId; 4];
        if self.mesh.vert(v3).point.dot(normal) - plane_offset < 0.0 {
            faces = [
                self.mesh.create_triangle(v0, v1, v2, 0.0),
                self.mesh.create_triangle(v3, v1, v0, 0.0),
                self.mesh.create_triangle(v3, v2, v1, 0.0),
                self.mesh.create_triangle(v3, v0, v2, 0.0),
            ];
            for i in 0..3 {
                let j = (i + 1) % 3;
                let side = self.mesh.edge_at(faces[i + 1], 2);
                let base = self.mesh.edge_at(faces[0], j as isize);
                self.mesh.set_opposite(side, base);
                let side = self.mesh.edge_at(faces[i + 1], 1);
                let next = self.mesh.edge_at(faces[j + 1], 0);
                self.mesh.set_opposite(side, next);
            }
        } else {
            faces = [
                self.mesh.create_triangle(v0, v2, v1, 0.0),
                self.mesh.create_triangle(v3, v0, v1, 0.0),
                self.mesh.create_triangle(v3, v1, v2, 0.0),
                self.mesh.create_triangle(v3, v2, v0, 0.0),
            ];
            for i in 0..3 {
                let j = (i + 1) % 3;
                let side = self.mesh.edge_at(faces[i + 1], 2);
                let base = self.mesh.edge_at(faces[0], ((3 - i) % 3) as isize);
                self.mesh.set_opposite(side, base);
                let side = self.mesh.edge_at(faces[i + 1], 0);
                let next = self.mesh.edge_at(faces[j + 1], 1);
                self.mesh.set_opposite(side, next);
            }
        }
        self.hull_faces.extend(faces);

        // Claim every non-simplex point by the face it sees from
        // farthest out; ties go to the first face scanned.
        for i in 0..self.mesh.verts.len() {
            let id = VertexId(i);
            if id == v0 || id == v1 || id == v2 || id == v3 {
                continue;
            }
            let point = self.mesh.verts[i].point;
            let mut max_distance = self.tolerance;
            let mut max_face = None;
            for &face in &faces {
                let distance = self.mesh.face(face).distance_to_plane(point);
                if distance > max_distance {
                    max_distance = distance;
                    max_face = Some(face);
                }
            }
            if let Some(face) = max_face {
                self.add_vertex_to_face(id, face);
            }
        }
        Ok(())
    }

    /// The farthest outside vertex of the first claimed face's run, or
    /// `None` once every point is inside the hull.
    fn next_vertex_to_add(&self) -> Option<VertexId> {
        let first = self.claimed.first()?;
        let eye_face = self.mesh.vert(first).face?;

        let mut eye = None;
        let mut max_distance = 0.0;
        let mut vertex = self.mesh.face(eye_face).outside;
        while let Some(id) = vertex {
            if self.mesh.vert(id).face != Some(eye_face) {
                break;
            }
            let distance = self.mesh.face(eye_face).distance_to_plane(self.mesh.vert(id).point);
            if distance > max_distance {
                max_distance = distance;
                eye = Some(id);
            }
            vertex = self.mesh.vert(id).next;
        }
        eye
    }

    fn add_vertex_to_hull(&mut self, eye: VertexId) -> Result<(), HullError> {
        debug_assert!(self.unclaimed.is_empty());
        let eye_point = self.mesh.vert(eye).point;
        let eye_face = self
            .mesh
            .vert(eye)
            .face
            .ok_or(HullError::InternalInvariant("eye vertex claims no face"))?;
        log::trace!(
            "adding point {} at distance {:e}",
            eye.0,
            self.mesh.face(eye_face).distance_to_plane(eye_point)
        );

        // Detach the eye vertex first so the horizon sweep cannot carry
        // it into the unclaimed list.
        self.remove_vertex_from_face(eye, eye_face);

        let mut horizon = Vec::new();
        self.compute_horizon(eye_point, eye_face, &mut horizon)?;
        log::trace!("horizon of {} edges", horizon.len());

        self.add_new_faces(eye, &horizon)?;

        // First pass: merge concave pairs as judged from the larger
        // face; pairs only the smaller face complains about are marked
        // for the second pass.
        for i in 0..self.new_faces.len() {
            let face = self.new_faces[i];
            if self.mesh.face(face).mark == Mark::Visible {
                while self.do_adjacent_merge(face, MergePolicy::NonConvexWrtLargerFace)? {}
            }
        }
        // Second pass: revisit what the first pass could not merge
        // safely.
        for i in 0..self.new_faces.len() {
            let face = self.new_faces[i];
            if self.mesh.face(face).mark == Mark::NonConvex {
                self.mesh.face_mut(face).mark = Mark::Visible;
                while self.do_adjacent_merge(face, MergePolicy::NonConvex)? {}
            }
        }

        self.resolve_unclaimed_points();
        Ok(())
    }

    /// Depth-first sweep of the faces visible from `eye_point`, starting
    /// at `start`. Visited faces are deleted and their outside vertices
    /// swept into `unclaimed`; the edges bounding the visible region are
    /// appended to `horizon` in counterclockwise order.
    ///
    /// The traversal keeps an explicit stack of ring cursors so that an
    /// adversarial input cannot exhaust the thread stack.
    fn compute_horizon(
        &mut self,
        eye_point: DVec3,
        start: FaceId,
        horizon: &mut Vec<EdgeId>,
    ) -> Result<(), HullError> {
        struct Frame {
            stop: EdgeId,
            cursor: EdgeId,
            first: bool,
        }

        self.delete_face_vertices(start, None);
        self.mesh.face_mut(start).mark = Mark::Deleted;

        let seed = self.mesh.face(start).edge;
        let mut stack = vec![Frame { stop: seed, cursor: seed, first: true }];

        while !stack.is_empty() {
            let top = stack.len() - 1;
            if !stack[top].first && stack[top].cursor == stack[top].stop {
                stack.pop();
                continue;
            }
            stack[top].first = false;
            let edge = stack[top].cursor;
            stack[top].cursor = self.mesh.edge(edge).next;

            let opposite = self.mesh.opposite(edge)?;
            let neighbor = self.mesh.edge(opposite).face;
            if self.mesh.face(neighbor).mark != Mark::Visible {
                continue;
            }
            if self.mesh.face(neighbor).distance_to_plane(eye_point) > self.tolerance {
                // The neighbor is visible too; descend through the
                // crossed edge and resume here afterwards.
                self.delete_face_vertices(neighbor, None);
                self.mesh.face_mut(neighbor).mark = Mark::Deleted;
                let cursor = self.mesh.edge(opposite).next;
                stack.push(Frame { stop: opposite, cursor, first: false });
            } else {
                horizon.push(edge);
            }
        }
        Ok(())
    }

    /// Fans new triangles from `eye` over every horizon edge, linking
    /// each outward side to the surviving neighbor across the horizon
    /// and the lateral sides to each other around the apex.
    fn add_new_faces(&mut self, eye: VertexId, horizon: &[EdgeId]) -> Result<(), HullError> {
        self.new_faces.clear();

        let mut first_side = None;
        let mut previous_side = None;
        for &horizon_edge in horizon {
            let outward_opposite = self.mesh.opposite(horizon_edge)?;
            let tail = self.mesh.tail(horizon_edge);
            let head = self.mesh.edge(horizon_edge).head;

            let face = self.mesh.create_triangle(eye, tail, head, 0.0);
            self.hull_faces.push(face);
            self.new_faces.push(face);

            let outward = self.mesh.edge_at(face, -1);
            self.mesh.set_opposite(outward, outward_opposite);

            let side = self.mesh.face(face).edge;
            match previous_side {
                None => first_side = Some(side),
                Some(previous) => {
                    let lateral = self.mesh.edge(side).next;
                    self.mesh.set_opposite(lateral, previous);
                }
            }
            previous_side = Some(side);
        }
        // Close the fan.
        if let (Some(first), Some(previous)) = (first_side, previous_side) {
            let lateral = self.mesh.edge(first).next;
            self.mesh.set_opposite(lateral, previous);
        }
        Ok(())
    }

    /// Distance of the opposite face's centroid above `edge`'s face
    /// plane. Greater than `-tolerance` means the pair bends inward.
    fn opposite_face_distance(&self, edge: EdgeId) -> Result<f64, HullError> {
        let opposite = self.mesh.opposite(edge)?;
        let opposite_face = self.mesh.edge(opposite).face;
        let face = self.mesh.edge(edge).face;
        Ok(self.mesh.face(face).distance_to_plane(self.mesh.face(opposite_face).centroid))
    }

    /// Walks the face's ring looking for a neighbor to merge under the
    /// given policy. Returns `true` when a merge happened, so the caller
    /// re-enters with the enlarged face.
    fn do_adjacent_merge(&mut self, face: FaceId, policy: MergePolicy) -> Result<bool, HullError> {
        let first = self.mesh.face(face).edge;
        let mut edge = first;
        let mut convex = true;
        let mut visited = 0;
        loop {
            if visited >= self.mesh.face(face).num_vertices {
                return Err(HullError::InternalInvariant("merge iteration bound exceeded"));
            }
            visited += 1;

            let opposite = self.mesh.opposite(edge)?;
            let merge = match policy {
                MergePolicy::NonConvex => {
                    self.opposite_face_distance(edge)? > -self.tolerance
                        || self.opposite_face_distance(opposite)? > -self.tolerance
                }
                MergePolicy::NonConvexWrtLargerFace => {
                    let opposite_face = self.mesh.edge(opposite).face;
                    // Judge from the larger face of the pair.
                    let (reference, other) =
                        if self.mesh.face(face).area > self.mesh.face(opposite_face).area {
                            (edge, opposite)
                        } else {
                            (opposite, edge)
                        };
                    if self.opposite_face_distance(reference)? > -self.tolerance {
                        true
                    } else {
                        if self.opposite_face_distance(other)? > -self.tolerance {
                            // Concave, but not safely mergeable here.
                            convex = false;
                        }
                        false
                    }
                }
            };

            if merge {
                log::trace!("merging face across edge {}", edge.0);
                let mut discarded = Vec::new();
                self.mesh.merge_adjacent_faces(face, edge, &mut discarded)?;
                for absorbed in discarded {
                    self.delete_face_vertices(absorbed, Some(face));
                }
                return Ok(true);
            }

            edge = self.mesh.edge(edge).next;
            if edge == first {
                break;
            }
        }

        if !convex {
            self.mesh.face_mut(face).mark = Mark::NonConvex;
        }
        Ok(false)
    }

    /// Makes `face` claim `vertex`, placing it at the head of the face's
    /// run in the claimed list.
    fn add_vertex_to_face(&mut self, vertex: VertexId, face: FaceId) {
        self.mesh.vert_mut(vertex).face = Some(face);
        match self.mesh.face(face).outside {
            None => self.claimed.add(&mut self.mesh.verts, vertex),
            Some(head) => self.claimed.insert_before(&mut self.mesh.verts, head, vertex),
        }
        self.mesh.face_mut(face).outside = Some(vertex);
    }

    fn remove_vertex_from_face(&mut self, vertex: VertexId, face: FaceId) {
        if self.mesh.face(face).outside == Some(vertex) {
            let successor = match self.mesh.vert(vertex).next {
                Some(next) if self.mesh.vert(next).face == Some(face) => Some(next),
                _ => None,
            };
            self.mesh.face_mut(face).outside = successor;
        }
        self.claimed.remove(&mut self.mesh.verts, vertex);
    }

    /// Detaches `face`'s outside run from the claimed list. With an
    /// absorbing face, vertices still outside it move into its run;
    /// everything else joins `unclaimed`.
    fn delete_face_vertices(&mut self, face: FaceId, absorbing: Option<FaceId>) {
        let Some(head) = self.mesh.face(face).outside else {
            return;
        };
        self.mesh.face_mut(face).outside = None;

        let mut tail = head;
        while let Some(next) = self.mesh.vert(tail).next {
            if self.mesh.vert(next).face != Some(face) {
                break;
            }
            tail = next;
        }
        self.claimed.remove_chain(&mut self.mesh.verts, head, tail);

        match absorbing {
            None => self.unclaimed.add_all(&mut self.mesh.verts, head),
            Some(absorbing_face) => {
                let mut vertex = Some(head);
                while let Some(id) = vertex {
                    let next = self.mesh.vert(id).next;
                    let distance =
                        self.mesh.face(absorbing_face).distance_to_plane(self.mesh.vert(id).point);
                    if distance > self.tolerance {
                        self.add_vertex_to_face(id, absorbing_face);
                    } else {
                        self.unclaimed.add(&mut self.mesh.verts, id);
                    }
                    vertex = next;
                }
            }
        }
    }

    /// Reassigns orphaned vertices onto the new faces by maximum
    /// distance. A best distance beyond `1000 * tolerance` is accepted
    /// immediately; vertices below tolerance everywhere are inside the
    /// new hull and dropped. Leaves `unclaimed` empty.
    fn resolve_unclaimed_points(&mut self) {
        let mut vertex = self.unclaimed.first();
        while let Some(id) = vertex {
            // Reclaiming rewrites the vertex links, so the successor is
            // captured up front.
            let next = self.mesh.vert(id).next;

            let point = self.mesh.vert(id).point;
            let mut max_distance = self.tolerance;
            let mut max_face = None;
            for &face in &self.new_faces {
                if self.mesh.face(face).mark == Mark::Visible {
                    let distance = self.mesh.face(face).distance_to_plane(point);
                    if distance > max_distance {
                        max_distance = distance;
                        max_face = Some(face);
                    }
                    if max_distance > 1000.0 * self.tolerance {
                        break;
                    }
                }
            }

            match max_face {
                Some(face) => self.add_vertex_to_face(id, face),
                None => self.mesh.vert_mut(id).face = None,
            }
            vertex = next;
        }
        self.unclaimed.clear();
    }

    /// Drops every face that did not survive to the final hull.
    fn reindex(&mut self) {
        let mesh = &self.mesh;
        self.hull_faces.retain(|&face| mesh.face(face).mark == Mark::Visible);
    }

    fn collect_faces(&self) -> Result<Vec<Vec<usize>>, HullError> {
        let mut collected = Vec::with_capacity(self.hull_faces.len());
        for &face in &self.hull_faces {
            if self.mesh.face(face).mark != Mark::Visible {
                return Err(HullError::InternalInvariant("destroyed face reached emission"));
            }
            let ring = self.mesh.face_ring(face);
            if self.triangulate && ring.len() > 3 {
                for k in 1..ring.len() - 1 {
                    collected.push(vec![ring[0], ring[k], ring[k + 1]]);
                }
            } else {
                collected.push(ring);
            }
        }
        Ok(collected)
    }
}

/// A 3D convex hull: the smallest convex set containing all points of
/// the input set.
///
/// Faces index into the original input sequence and wind
/// counterclockwise viewed from outside.
#[derive(Debug, Clone)]
pub struct ConvexHull {
    points: Vec<DVec3>,
    faces: Vec<Vec<usize>>,
    tolerance: f64,
}

impl ConvexHull {
    /// Computes the triangulated convex hull of the given points.
    ///
    /// Duplicate input points are never both emitted: whichever copy the
    /// extreme scan or face claiming reaches first may end up on the
    /// hull, and the other is classified as interior.
    ///
    /// ## Errors
    /// See [`QuickHull::new`] and [`QuickHull::build`].
    pub fn try_new<P: HullPoint>(points: &[P]) -> Result<Self, HullError> {
        QuickHull::new(points)?.build()
    }

    /// The normalized input points. Faces index into this slice.
    #[must_use]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// The hull boundary: for each face, the input indices of its
    /// vertices in counterclockwise order viewed from outside.
    #[must_use]
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    /// The hull boundary as triangles, fanning each polygonal face from
    /// its first vertex. The identity of [`Self::faces`] when the hull
    /// was built triangulated.
    #[must_use]
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut triangles = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            for k in 1..face.len() - 1 {
                triangles.push([face[0], face[k], face[k + 1]]);
            }
        }
        triangles
    }

    /// The classification tolerance the hull was built with.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Computes the volume of the convex hull by summing signed
    /// tetrahedron volumes against a reference vertex.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let triangles = self.triangles();
        let Some(&[first, _, _]) = triangles.first() else {
            return 0.0;
        };
        let reference = self.points[first];
        let mut volume = 0.0;
        for [i0, i1, i2] in triangles {
            let a = self.points[i0] - reference;
            let b = self.points[i1] - reference;
            let c = self.points[i2] - reference;
            volume += a.dot(b.cross(c));
        }
        volume / 6.0
    }

    /// The point of the hull farthest in the given direction.
    #[must_use]
    pub fn support_point(&self, direction: DVec3) -> DVec3 {
        let mut max = self.points[0].dot(direction);
        let mut index = 0;

        for (i, point) in self.points.iter().enumerate().skip(1) {
            let dot_product = point.dot(direction);
            if dot_product > max {
                max = dot_product;
                index = i;
            }
        }

        self.points[index]
    }
}
