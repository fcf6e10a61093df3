//! Edge-incidence diagnostics
//!
//! The signed-tetrahedron volume is exact only on closed, consistently wound
//! manifolds. These counts tell the caller how much to trust it.

use meshdensity_core::TriangleMesh;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Default)]
struct EdgeUse {
    faces: usize,
    /// Faces traversing the edge from its lower to its higher vertex index
    forward: usize,
}

/// Counts of edges that break the closed-manifold assumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifoldDiagnostics {
    /// Edges with exactly one incident face (holes, open sheets)
    pub boundary_edges: usize,
    /// Edges shared by more than two faces
    pub non_manifold_edges: usize,
    /// Two-face edges traversed in the same direction by both faces
    pub inconsistent_edges: usize,
}

impl ManifoldDiagnostics {
    /// Scan every face edge of `mesh`. Faces must reference valid vertices.
    pub fn analyze(mesh: &TriangleMesh) -> Self {
        let mut edges: HashMap<(usize, usize), EdgeUse> = HashMap::with_capacity(mesh.faces.len() * 3 / 2);
        for face in &mesh.faces {
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                let entry = edges.entry((a.min(b), a.max(b))).or_default();
                entry.faces += 1;
                if a < b {
                    entry.forward += 1;
                }
            }
        }

        let mut diagnostics = Self::default();
        for edge in edges.values() {
            match edge.faces {
                1 => diagnostics.boundary_edges += 1,
                2 if edge.forward != 1 => diagnostics.inconsistent_edges += 1,
                2 => {}
                _ => diagnostics.non_manifold_edges += 1,
            }
        }
        diagnostics
    }

    /// True when every edge has exactly two oppositely oriented faces.
    pub fn is_closed_manifold(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0 && self.inconsistent_edges == 0
    }
}

impl fmt::Display for ManifoldDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} boundary, {} non-manifold, {} inconsistently wound edges",
            self.boundary_edges, self.non_manifold_edges, self.inconsistent_edges
        )
    }
}
