//! Core data structures and traits for meshdensity
//!
//! This crate provides the fundamental types shared by the density analysis and
//! reduction crates: triangle meshes, point aliases, the error type, and a few
//! mesh generators used by tests and benchmarks.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod error;
pub mod primitives;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point3, Vector3};

/// Common result type for meshdensity operations
pub type Result<T> = std::result::Result<T, Error>;
