//! Mesh reduction algorithms
//!
//! This crate provides the two ways meshdensity reduces triangle count:
//! - Quadric error edge collapse (accurate, volume preserving)
//! - Uniform voxel clustering (fast, lossy, experimental)

pub mod quadric;
pub mod edge_collapse;
pub mod clustering;

pub use quadric::*;
pub use edge_collapse::*;
pub use clustering::*;

use meshdensity_core::{Result, TriangleMesh};

/// A reducer configured with its own parameters.
pub trait MeshSimplifier {
    /// Produce a new, reduced mesh. The input is never modified.
    fn simplify(&self, mesh: &TriangleMesh) -> Result<TriangleMesh>;
}
