//! Triangle mesh data structure

use crate::error::Error;
use crate::point::*;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An indexed triangle mesh: a vertex array plus faces referencing it.
///
/// Reduction stages never mutate a mesh in place; they build a new one so the
/// caller can keep the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

/// Vertex and triangle counts of a mesh, attached to errors and log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshSummary {
    pub vertices: usize,
    pub triangles: usize,
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vertices, {} triangles", self.vertices, self.triangles)
    }
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            vertices: self.vertices.len(),
            triangles: self.faces.len(),
        }
    }

    /// Check that every face index refers to an existing vertex.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&index) = face.iter().find(|&&i| i >= n) {
                return Err(Error::IndexOutOfRange {
                    face: fi,
                    index,
                    mesh: self.summary(),
                });
            }
        }
        Ok(())
    }

    /// Corner positions of face `fi` in double precision.
    ///
    /// Panics if `fi` or one of its indices is out of range; call
    /// [`TriangleMesh::validate`] first on untrusted input.
    #[inline]
    pub fn triangle(&self, fi: usize) -> [Point3d; 3] {
        let [a, b, c] = self.faces[fi];
        [
            to_f64(&self.vertices[a]),
            to_f64(&self.vertices[b]),
            to_f64(&self.vertices[c]),
        ]
    }

    /// Iterate over the corner positions of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3d; 3]> + '_ {
        (0..self.faces.len()).map(move |fi| self.triangle(fi))
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Drop vertices no face references and renumber the faces.
    pub fn compact(&self) -> TriangleMesh {
        const UNUSED: usize = usize::MAX;
        let mut remap = vec![UNUSED; self.vertices.len()];
        let mut vertices = Vec::new();
        let faces: Vec<[usize; 3]> = self
            .faces
            .iter()
            .map(|face| {
                face.map(|vi| {
                    if remap[vi] == UNUSED {
                        remap[vi] = vertices.len();
                        vertices.push(self.vertices[vi]);
                    }
                    remap[vi]
                })
            })
            .collect();
        TriangleMesh { vertices, faces }
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// The three undirected edges of a face, each as `(min, max)`.
#[inline]
pub fn face_edges(face: &[usize; 3]) -> [(usize, usize); 3] {
    let key = |a: usize, b: usize| if a < b { (a, b) } else { (b, a) };
    [
        key(face[0], face[1]),
        key(face[1], face[2]),
        key(face[2], face[0]),
    ]
}
