//! Edge collapse decimation
//!
//! Greedy quadric error metric (QEM) simplification: every vertex carries the
//! quadric of its incident face planes, every edge is priced by the error of
//! merging its endpoints at the quadric optimum, and the cheapest edge is
//! collapsed until the face budget is met.
//!
//! Topology is tracked with vertex-face incidence lists. A collapse is only
//! performed when it keeps the surface a manifold (link condition, no duplicate
//! faces) and does not fold any surviving face over.

use crate::quadric::Quadric;
use crate::MeshSimplifier;
use meshdensity_core::{face_edges, to_f32, to_f64, Error, Point3d, Result, TriangleMesh};
use priority_queue::PriorityQueue;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fewest vertices a mesh may have and still admit an edge collapse.
pub const MIN_VERTICES: usize = 4;

/// Floor for an explicit face budget; a tetrahedron is the smallest closed surface.
pub const MIN_TRIANGLES: usize = 4;

/// Faces whose area falls below this fraction of the squared mean edge length
/// count as collapsed.
const AREA_EPSILON: f64 = 1e-12;

const PROGRESS_INTERVAL: usize = 10_000;

type Edge = (usize, usize);

// ============================================================
// Edge Cost for Priority Queue
// ============================================================

#[derive(Debug, Clone, Copy)]
struct EdgeCost {
    edge: Edge,
    position: Point3d,
    /// Quadric error scaled by the aggressiveness length bias
    key: f64,
}

impl PartialEq for EdgeCost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for EdgeCost {}

impl PartialOrd for EdgeCost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCost {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-queue pops this first when it has the smaller key, then the
        // smaller vertex pair
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

/// Priority key of a collapse. Aggressiveness makes long edges dearer than
/// short ones of equal error.
fn priority_key(cost: f64, length: f64, mean_edge_length: f64, aggressiveness: f64) -> f64 {
    cost * (1.0 + aggressiveness * length / mean_edge_length)
}

// ============================================================
// Collapse State
// ============================================================

struct CollapseState {
    positions: Vec<Point3d>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    /// Faces incident to each vertex; may still list faces removed since
    vertex_faces: Vec<Vec<usize>>,
    quadrics: Vec<Quadric>,
    vertex_alive: Vec<bool>,
    /// Vertices whose edges are never collapsed
    locked: Vec<bool>,
    active_faces: usize,
    mean_edge_length: f64,
}

impl CollapseState {
    fn new(mesh: &TriangleMesh, preserve_boundary: bool) -> Self {
        let positions: Vec<Point3d> = mesh.vertices.iter().map(to_f64).collect();
        let nv = positions.len();

        let mut vertex_faces = vec![Vec::new(); nv];
        let mut quadrics = vec![Quadric::default(); nv];
        let mut edge_faces: HashMap<Edge, usize> = HashMap::with_capacity(mesh.faces.len() * 3 / 2);
        let mut edge_length_sum = 0.0;

        for (fi, face) in mesh.faces.iter().enumerate() {
            let [p0, p1, p2] = face.map(|vi| positions[vi]);
            let plane = Quadric::from_triangle(&p0, &p1, &p2);
            for (k, &vi) in face.iter().enumerate() {
                if face[..k].contains(&vi) {
                    continue;
                }
                vertex_faces[vi].push(fi);
                if let Some(q) = plane {
                    quadrics[vi] += q;
                }
            }
            for (a, b) in face_edges(face) {
                *edge_faces.entry((a, b)).or_insert(0) += 1;
                edge_length_sum += (positions[b] - positions[a]).norm();
            }
        }

        let mut locked = vec![false; nv];
        for (&(a, b), &count) in &edge_faces {
            if count > 2 || (preserve_boundary && count == 1) {
                locked[a] = true;
                locked[b] = true;
            }
        }

        let mean_edge_length = edge_length_sum / (3 * mesh.faces.len().max(1)) as f64;
        Self {
            positions,
            faces: mesh.faces.clone(),
            face_alive: vec![true; mesh.faces.len()],
            vertex_faces,
            quadrics,
            vertex_alive: vec![true; nv],
            locked,
            active_faces: mesh.faces.len(),
            mean_edge_length: if mean_edge_length > 0.0 { mean_edge_length } else { 1.0 },
        }
    }

    fn live_faces(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v]
            .iter()
            .copied()
            .filter(move |&fi| self.face_alive[fi])
    }

    /// Sorted one-ring of `v`.
    fn neighbors(&self, v: usize) -> Vec<usize> {
        let mut ring: Vec<usize> = self
            .live_faces(v)
            .flat_map(|fi| self.faces[fi])
            .filter(|&u| u != v)
            .collect();
        ring.sort_unstable();
        ring.dedup();
        ring
    }

    fn shared_faces(&self, a: usize, b: usize) -> Vec<usize> {
        self.live_faces(a)
            .filter(|&fi| self.faces[fi].contains(&b))
            .collect()
    }

    fn is_boundary(&self, v: usize) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|u| self.shared_faces(v, u).len() == 1)
    }

    /// All live edges, sorted.
    fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = (0..self.faces.len())
            .filter(|&fi| self.face_alive[fi])
            .flat_map(|fi| face_edges(&self.faces[fi]))
            .filter(|(a, b)| a != b)
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Edges whose price or validity a collapse onto `v` may have changed.
    fn edges_around(&self, v: usize) -> Vec<Edge> {
        let mut edges = Vec::new();
        for &u in std::iter::once(&v).chain(self.neighbors(v).iter()) {
            for w in self.neighbors(u) {
                edges.push((u.min(w), u.max(w)));
            }
        }
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    fn candidate(&self, (a, b): Edge, aggressiveness: f64) -> Option<EdgeCost> {
        if self.locked[a] || self.locked[b] {
            return None;
        }
        let q = self.quadrics[a] + self.quadrics[b];
        let (pa, pb) = (self.positions[a], self.positions[b]);
        let midpoint = Point3d::from((pa.coords + pb.coords) * 0.5);
        let length = (pb - pa).norm();

        let (position, cost) = match q.minimizer().filter(|p| (p - midpoint).norm() <= length) {
            Some(optimum) => (optimum, q.evaluate(&optimum)),
            None => {
                // Midpoint first so it wins ties
                let mut best = (midpoint, q.evaluate(&midpoint));
                for p in [pa, pb] {
                    let cost = q.evaluate(&p);
                    if cost < best.1 {
                        best = (p, cost);
                    }
                }
                best
            }
        };

        Some(EdgeCost {
            edge: (a, b),
            position,
            key: priority_key(cost, length, self.mean_edge_length, aggressiveness),
        })
    }

    /// Whether merging `b` into `a` at `target` keeps a valid manifold.
    fn collapse_is_valid(&self, a: usize, b: usize, target: &Point3d, min_normal_dot: f64) -> bool {
        let shared = self.shared_faces(a, b);
        if shared.is_empty() || shared.len() > 2 {
            return false;
        }

        // Link condition: the only common neighbours are the apices of the
        // faces on the edge
        let ring_a = self.neighbors(a);
        let ring_b = self.neighbors(b);
        let common = ring_a
            .iter()
            .filter(|v| ring_b.binary_search(v).is_ok())
            .count();
        if common != shared.len() {
            return false;
        }

        // An interior edge between two boundary vertices would pinch the surface
        if shared.len() == 2 && self.is_boundary(a) && self.is_boundary(b) {
            return false;
        }

        let min_area = AREA_EPSILON * self.mean_edge_length * self.mean_edge_length;
        for v in [a, b] {
            for fi in self.live_faces(v).filter(|fi| !shared.contains(fi)) {
                let face = self.faces[fi];
                let before = face.map(|u| self.positions[u]);
                let after = face.map(|u| if u == v { *target } else { self.positions[u] });
                let n_before = (before[1] - before[0]).cross(&(before[2] - before[0]));
                let n_after = (after[1] - after[0]).cross(&(after[2] - after[0]));
                if n_after.norm() <= min_area {
                    return false;
                }
                if n_before.norm() > min_area
                    && n_before.normalize().dot(&n_after.normalize()) < min_normal_dot
                {
                    return false;
                }
            }
        }

        // Faces of `b` re-indexed onto `a` must not duplicate a face of `a`
        let sorted = |face: [usize; 3]| {
            let mut face = face;
            face.sort_unstable();
            face
        };
        let faces_a: Vec<[usize; 3]> = self
            .live_faces(a)
            .filter(|fi| !shared.contains(fi))
            .map(|fi| sorted(self.faces[fi]))
            .collect();
        !self
            .live_faces(b)
            .filter(|fi| !shared.contains(fi))
            .map(|fi| sorted(self.faces[fi].map(|u| if u == b { a } else { u })))
            .any(|face| faces_a.contains(&face))
    }

    /// Merge `b` into `a` at `target`, returning the number of faces removed.
    fn collapse(&mut self, a: usize, b: usize, target: Point3d) -> usize {
        self.positions[a] = target;
        let qb = self.quadrics[b];
        self.quadrics[a] += qb;

        let mut removed = 0;
        for fi in std::mem::take(&mut self.vertex_faces[b]) {
            if !self.face_alive[fi] {
                continue;
            }
            if self.faces[fi].contains(&a) {
                self.face_alive[fi] = false;
                self.active_faces -= 1;
                removed += 1;
            } else {
                for u in self.faces[fi].iter_mut() {
                    if *u == b {
                        *u = a;
                    }
                }
                self.vertex_faces[a].push(fi);
            }
        }
        self.vertex_alive[b] = false;

        let face_alive = &self.face_alive;
        self.vertex_faces[a].retain(|&fi| face_alive[fi]);
        removed
    }

    fn to_triangle_mesh(&self) -> TriangleMesh {
        let faces = (0..self.faces.len())
            .filter(|&fi| self.face_alive[fi])
            .map(|fi| self.faces[fi])
            .collect();
        TriangleMesh::from_vertices_and_faces(self.positions.iter().map(to_f32).collect(), faces)
            .compact()
    }
}

// ============================================================
// QEM Decimator
// ============================================================

/// Detailed outcome of a decimation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Decimation {
    pub mesh: TriangleMesh,
    pub original_triangles: usize,
    /// See [`QemDecimator::target_triangles`]
    pub target_triangles: usize,
    pub final_triangles: usize,
    pub collapses: usize,
    /// Candidate collapses refused by the manifold and fold-over checks
    pub rejected: usize,
    /// Ran out of valid collapses above the target
    pub halted_early: bool,
}

impl Decimation {
    fn unchanged(mesh: &TriangleMesh, target_triangles: usize) -> Self {
        Self {
            mesh: mesh.clone(),
            original_triangles: mesh.face_count(),
            target_triangles,
            final_triangles: mesh.face_count(),
            collapses: 0,
            rejected: 0,
            halted_early: false,
        }
    }
}

/// Quadric error edge collapse decimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QemDecimator {
    /// Fraction of triangles to keep, in `(0, 1]`
    pub target_ratio: f64,
    /// Length bias of the collapse order, `>= 0`
    pub aggressiveness: f64,
    /// Never move or remove vertices on open boundaries
    pub preserve_boundary: bool,
    /// Smallest allowed cosine between a face normal before and after a collapse
    pub min_normal_dot: f64,
    /// Explicit face budget, used instead of `target_ratio` when set
    pub target_count: Option<usize>,
}

impl Default for QemDecimator {
    fn default() -> Self {
        Self {
            target_ratio: 0.5,
            aggressiveness: 7.0,
            preserve_boundary: true,
            min_normal_dot: 0.2,
            target_count: None,
        }
    }
}

impl QemDecimator {
    pub fn new(target_ratio: f64, aggressiveness: f64) -> Self {
        Self {
            target_ratio,
            aggressiveness,
            ..Self::default()
        }
    }

    pub fn with_preserve_boundary(mut self, preserve_boundary: bool) -> Self {
        self.preserve_boundary = preserve_boundary;
        self
    }

    pub fn with_min_normal_dot(mut self, min_normal_dot: f64) -> Self {
        self.min_normal_dot = min_normal_dot;
        self
    }

    /// Aim for `target_count` faces instead of a ratio of the input.
    /// Budgets below [`MIN_TRIANGLES`] are raised to it.
    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = Some(target_count);
        self
    }

    /// Face budget for a mesh of `triangles` faces: the explicit target count
    /// if one is set, otherwise `round(triangles * target_ratio)`.
    pub fn target_triangles(&self, triangles: usize) -> usize {
        match self.target_count {
            Some(count) => count.max(MIN_TRIANGLES),
            None => (triangles as f64 * self.target_ratio).round() as usize,
        }
    }

    fn validate(&self, mesh: &TriangleMesh) -> Result<()> {
        if !(self.target_ratio > 0.0 && self.target_ratio <= 1.0) {
            return Err(Error::invalid_parameter(
                "target_ratio",
                self.target_ratio,
                "a ratio in (0, 1]",
                mesh.summary(),
            ));
        }
        if !(self.aggressiveness >= 0.0 && self.aggressiveness.is_finite()) {
            return Err(Error::invalid_parameter(
                "aggressiveness",
                self.aggressiveness,
                "a finite value >= 0",
                mesh.summary(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.min_normal_dot) {
            return Err(Error::invalid_parameter(
                "min_normal_dot",
                self.min_normal_dot,
                "a cosine in [-1, 1]",
                mesh.summary(),
            ));
        }
        Ok(())
    }

    /// Decimate `mesh` down to [`target_triangles`](Self::target_triangles) faces.
    ///
    /// Meshes without faces, and targets that would not remove anything, come
    /// back as an unchanged copy. When every remaining collapse is rejected the
    /// best mesh reached is returned with `halted_early` set.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] for an out of range ratio, aggressiveness or normal bound
    /// - [`Error::IndexOutOfRange`] if a face references a missing vertex
    /// - [`Error::InsufficientGeometry`] for meshes with fewer than [`MIN_VERTICES`] vertices
    #[tracing::instrument(skip_all, fields(faces = mesh.face_count(), target_ratio = self.target_ratio))]
    pub fn decimate(&self, mesh: &TriangleMesh) -> Result<Decimation> {
        self.validate(mesh)?;
        mesh.validate()?;
        if mesh.vertex_count() < MIN_VERTICES {
            return Err(Error::InsufficientGeometry {
                mesh: mesh.summary(),
                required: MIN_VERTICES,
            });
        }

        let original = mesh.face_count();
        let target = self.target_triangles(original);
        if original == 0 || target >= original {
            debug!(original, target_faces = target, "Target count >= original count, skipping reduction");
            return Ok(Decimation::unchanged(mesh, target));
        }

        let mut state = CollapseState::new(mesh, self.preserve_boundary);
        let mut queue: PriorityQueue<Edge, EdgeCost> = PriorityQueue::new();
        for edge in state.edges() {
            if let Some(cost) = state.candidate(edge, self.aggressiveness) {
                queue.push(edge, cost);
            }
        }
        debug!(candidates = queue.len(), target_faces = target, "Built collapse queue");

        let mut collapses = 0usize;
        let mut rejected = 0usize;
        while state.active_faces > target {
            let Some(((a, b), entry)) = queue.pop() else {
                break;
            };
            if !state.vertex_alive[a] || !state.vertex_alive[b] {
                continue;
            }
            if !state.collapse_is_valid(a, b, &entry.position, self.min_normal_dot) {
                rejected += 1;
                continue;
            }

            state.collapse(a, b, entry.position);
            collapses += 1;

            for edge in state.edges_around(a) {
                match state.candidate(edge, self.aggressiveness) {
                    Some(cost) => {
                        queue.push(edge, cost);
                    }
                    None => {
                        queue.remove(&edge);
                    }
                }
            }

            if collapses % PROGRESS_INTERVAL == 0 {
                debug!(collapses, faces = state.active_faces, target_faces = target, "Decimation progress");
            }
        }

        let halted_early = state.active_faces > target;
        if halted_early {
            warn!(
                faces = state.active_faces,
                target_faces = target,
                rejected,
                "No valid collapses remain; returning partially decimated mesh"
            );
        }

        let mesh = state.to_triangle_mesh();
        debug!(collapses, rejected, faces = mesh.face_count(), "Decimation finished");
        Ok(Decimation {
            final_triangles: mesh.face_count(),
            mesh,
            original_triangles: original,
            target_triangles: target,
            collapses,
            rejected,
            halted_early,
        })
    }
}

impl MeshSimplifier for QemDecimator {
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh> {
        self.decimate(mesh).map(|decimation| decimation.mesh)
    }
}

/// Decimate `mesh` to `round(n * target_ratio)` triangles with default
/// boundary preservation and fold-over bound.
pub fn decimate(mesh: &TriangleMesh, target_ratio: f64, aggressiveness: f64) -> Result<TriangleMesh> {
    QemDecimator::new(target_ratio, aggressiveness).simplify(mesh)
}
