//! Adaptive mesh reduction
//!
//! Measures a mesh, classifies its tessellation density and, when it is
//! over-tessellated, decimates it by an amount chosen from its density tier.
//!
//! ```no_run
//! use meshdensity_core::primitives::icosphere;
//! use meshdensity_reduction::ReductionOrchestrator;
//!
//! let mesh = icosphere(4.3, 4);
//! let reduction = ReductionOrchestrator::new().adaptive_reduce(&mesh)?;
//! println!("{}: {:.1}% fewer triangles", reduction.result.strategy_used, reduction.result.reduction_percentage);
//! # Ok::<(), meshdensity_core::Error>(())
//! ```

pub mod config;
pub mod strategy;
pub mod orchestrator;

pub use config::*;
pub use strategy::*;
pub use orchestrator::*;

pub use meshdensity_analysis::{DensityAssessment, DensityThresholds, DensityTier, GeometryMetrics};
pub use meshdensity_core::{Error, Result, TriangleMesh};
