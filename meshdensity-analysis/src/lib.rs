//! Mesh density analysis
//!
//! This crate measures a triangle mesh and classifies how densely it is
//! tessellated:
//! - Geometric metrics (volume, surface area, edge length, aspect ratio, density)
//! - Manifold diagnostics for the volume integral
//! - Density tiers with fixed, configurable thresholds

pub mod metrics;
pub mod manifold;
pub mod classifier;

pub use metrics::*;
pub use manifold::*;
pub use classifier::*;
