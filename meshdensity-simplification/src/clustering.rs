//! Voxel clustering
//!
//! Rossignac & Borrel style vertex clustering on a uniform grid: every vertex
//! falling into the same cube is replaced by the cluster centroid and faces are
//! re-indexed through the merge. Faces that lose a corner are dropped.
//!
//! Lossier and faster than edge collapse. The result is not guaranteed to be
//! manifold or to preserve volume, so treat it as experimental.

use crate::MeshSimplifier;
use itertools::Itertools;
use meshdensity_core::{to_f32, to_f64, Bounded, Error, Point3d, Result, TriangleMesh};
use std::collections::HashMap;
use tracing::debug;

/// Uniform grid vertex clustering reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelReducer {
    /// Edge length of the grid cubes, in mesh units (mm)
    pub cell_size: f64,
}

impl VoxelReducer {
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size }
    }

    /// Group vertex indices by grid cell, anchored at `origin`. Clusters are
    /// ordered by the lowest vertex index they contain.
    fn cluster(&self, mesh: &TriangleMesh, origin: &Point3d) -> Vec<Vec<usize>> {
        let mut cells: HashMap<[i64; 3], usize> = HashMap::new();
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        for (vi, v) in mesh.vertices.iter().enumerate() {
            let offset = (to_f64(v) - origin) / self.cell_size;
            let key = [offset.x, offset.y, offset.z].map(|c| c.floor() as i64);
            let ci = *cells.entry(key).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[ci].push(vi);
        }
        clusters
    }

    /// # Errors
    /// - [`Error::InvalidParameter`] if `cell_size` is not a positive finite number
    /// - [`Error::IndexOutOfRange`] if a face references a missing vertex
    #[tracing::instrument(skip_all, fields(faces = mesh.face_count(), cell_size = self.cell_size))]
    pub fn reduce(&self, mesh: &TriangleMesh) -> Result<TriangleMesh> {
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(Error::invalid_parameter(
                "cell_size",
                self.cell_size,
                "a positive cell size",
                mesh.summary(),
            ));
        }
        mesh.validate()?;
        if mesh.faces.is_empty() {
            return Ok(mesh.clone());
        }

        let (min, _) = mesh.bounding_box();
        let clusters = self.cluster(mesh, &to_f64(&min));

        let mut vertex_to_cluster = vec![0usize; mesh.vertices.len()];
        let representatives: Vec<_> = clusters
            .iter()
            .enumerate()
            .map(|(ci, cluster)| {
                let mut sum = Point3d::origin().coords;
                for &vi in cluster {
                    vertex_to_cluster[vi] = ci;
                    sum += to_f64(&mesh.vertices[vi]).coords;
                }
                to_f32(&Point3d::from(sum / cluster.len() as f64))
            })
            .collect();

        let faces: Vec<[usize; 3]> = mesh
            .faces
            .iter()
            .map(|face| face.map(|vi| vertex_to_cluster[vi]))
            .filter(|[a, b, c]| a != b && b != c && c != a)
            .unique_by(|face| {
                let mut key = *face;
                key.sort_unstable();
                key
            })
            .collect();

        let reduced = TriangleMesh::from_vertices_and_faces(representatives, faces).compact();
        debug!(
            clusters = clusters.len(),
            faces = reduced.face_count(),
            vertices = reduced.vertex_count(),
            "Voxel clustering finished"
        );
        Ok(reduced)
    }
}

impl MeshSimplifier for VoxelReducer {
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh> {
        self.reduce(mesh)
    }
}

/// Cluster `mesh` on a grid of `cell_size` cubes.
pub fn voxel_reduce(mesh: &TriangleMesh, cell_size: f64) -> Result<TriangleMesh> {
    VoxelReducer::new(cell_size).reduce(mesh)
}
