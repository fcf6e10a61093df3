//! Analyze, decide, reduce, re-measure

use crate::config::ReductionConfig;
use crate::strategy::{ReductionStrategy, StrategySelector};
use meshdensity_analysis::{compute_metrics, round_to, DensityAssessment, DensityClassifier, GeometryMetrics};
use meshdensity_core::{Result, TriangleMesh};
use meshdensity_simplification::{QemDecimator, VoxelReducer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{info, warn};

/// Outcome of one reduction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReductionResult {
    pub original_metrics: GeometryMetrics,
    /// Equal to `original_metrics` when nothing was reduced
    pub reduced_metrics: GeometryMetrics,
    pub strategy_used: ReductionStrategy,
    pub was_reduced: bool,
    /// `100 * (n_original - n_reduced) / n_original`
    pub reduction_percentage: f64,
    /// QEM ran out of valid collapses above its target
    pub halted_early: bool,
}

impl ReductionResult {
    fn unchanged(metrics: GeometryMetrics) -> Self {
        Self {
            original_metrics: metrics,
            reduced_metrics: metrics,
            strategy_used: ReductionStrategy::Skip,
            was_reduced: false,
            reduction_percentage: 0.0,
            halted_early: false,
        }
    }

    pub fn reduced_count(&self) -> usize {
        self.reduced_metrics.triangle_count
    }

    pub fn new_density(&self) -> f64 {
        self.reduced_metrics.density
    }

    /// `reduce-auto` report rows.
    pub fn report_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("was_reduced", self.was_reduced.to_string()),
            ("reduced_count", self.reduced_count().to_string()),
            ("reduction_percentage", round_to(self.reduction_percentage, 2).to_string()),
            ("new_density", round_to(self.new_density(), 4).to_string()),
            ("strategy", self.strategy_used.to_string()),
        ]
    }
}

/// A reduced mesh together with its [`ReductionResult`].
///
/// When nothing was reduced `mesh` borrows the caller's input untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction<'a> {
    pub mesh: Cow<'a, TriangleMesh>,
    pub result: ReductionResult,
}

impl Reduction<'_> {
    pub fn into_mesh(self) -> TriangleMesh {
        self.mesh.into_owned()
    }
}

/// Drives metrics → classification → strategy → reduction → metrics.
///
/// Holds only configuration, so one orchestrator can serve any number of
/// meshes, concurrently if needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReductionOrchestrator {
    config: ReductionConfig,
    classifier: DensityClassifier,
    selector: StrategySelector,
}

impl Default for ReductionOrchestrator {
    fn default() -> Self {
        let config = ReductionConfig::default();
        Self {
            config,
            classifier: DensityClassifier::default(),
            selector: StrategySelector::from_config(&config),
        }
    }
}

impl ReductionOrchestrator {
    /// Orchestrator with the default thresholds, ratios and aggressiveness.
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// [`meshdensity_core::Error::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: ReductionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: DensityClassifier::new(config.thresholds)?,
            selector: StrategySelector::from_config(&config),
        })
    }

    pub fn config(&self) -> &ReductionConfig {
        &self.config
    }

    /// Measure `mesh` and assess its density tier.
    pub fn assess(&self, mesh: &TriangleMesh) -> Result<(GeometryMetrics, DensityAssessment)> {
        let metrics = compute_metrics(mesh)?;
        Ok((metrics, self.classifier.assess(&metrics)))
    }

    /// Reduce `mesh` by the amount its density tier calls for.
    ///
    /// Meshes at or below the moderate threshold come back borrowed and
    /// unchanged. Errors from measuring or decimating are returned as is, as
    /// in [`reduce_with`](Self::reduce_with).
    #[tracing::instrument(skip_all, fields(faces = mesh.face_count(), vertices = mesh.vertex_count()))]
    pub fn adaptive_reduce<'a>(&self, mesh: &'a TriangleMesh) -> Result<Reduction<'a>> {
        let (metrics, assessment) = self.assess(mesh)?;
        let strategy = self.selector.select(assessment.tier);
        info!(tier = %assessment.tier, density = metrics.density, %strategy, "{}", assessment);
        self.apply(mesh, metrics, strategy)
    }

    /// Reduce `mesh` with a caller chosen strategy, bypassing classification.
    ///
    /// The reduced mesh is measured again before it is returned. If that
    /// measurement fails, for example when coarse voxel cells leave no faces,
    /// the error describes the reduced mesh and the mesh itself is dropped.
    /// Use [`VoxelReducer`] or [`QemDecimator`] directly to keep such output.
    ///
    /// # Errors
    /// - [`meshdensity_core::Error::DegenerateMesh`] if the input or the reduced mesh encloses no volume
    /// - [`meshdensity_core::Error::InvalidParameter`] for strategy parameters out of range
    /// - [`meshdensity_core::Error::InsufficientGeometry`] if QEM gets fewer than four vertices
    #[tracing::instrument(skip_all, fields(faces = mesh.face_count(), strategy = %strategy))]
    pub fn reduce_with<'a>(&self, mesh: &'a TriangleMesh, strategy: ReductionStrategy) -> Result<Reduction<'a>> {
        let metrics = compute_metrics(mesh)?;
        self.apply(mesh, metrics, strategy)
    }

    /// Run [`adaptive_reduce`](Self::adaptive_reduce) on independent meshes in
    /// parallel. Results keep the input order.
    pub fn adaptive_reduce_batch<'a>(&self, meshes: &'a [TriangleMesh]) -> Vec<Result<Reduction<'a>>> {
        meshes.par_iter().map(|mesh| self.adaptive_reduce(mesh)).collect()
    }

    fn apply<'a>(
        &self,
        mesh: &'a TriangleMesh,
        original: GeometryMetrics,
        strategy: ReductionStrategy,
    ) -> Result<Reduction<'a>> {
        let (reduced_mesh, halted_early) = match strategy {
            ReductionStrategy::Skip => {
                info!(triangles = original.triangle_count, "No reduction needed");
                return Ok(Reduction {
                    mesh: Cow::Borrowed(mesh),
                    result: ReductionResult::unchanged(original),
                });
            }
            ReductionStrategy::Qem {
                target_ratio,
                aggressiveness,
                ..
            } => {
                let decimation = QemDecimator::new(target_ratio, aggressiveness)
                    .with_preserve_boundary(self.config.preserve_boundary)
                    .decimate(mesh)?;
                (decimation.mesh, decimation.halted_early)
            }
            ReductionStrategy::Voxel { cell_size } => {
                warn!(cell_size, "Voxel clustering is experimental; geometry preservation is not guaranteed");
                (VoxelReducer::new(cell_size).reduce(mesh)?, false)
            }
        };

        let reduced = compute_metrics(&reduced_mesh)?;
        let removed = original.triangle_count.saturating_sub(reduced.triangle_count);
        let reduction_percentage = 100.0 * removed as f64 / original.triangle_count as f64;
        info!(
            before = original.triangle_count,
            after = reduced.triangle_count,
            reduction_percentage,
            new_density = reduced.density,
            "Reduction complete"
        );

        Ok(Reduction {
            mesh: Cow::Owned(reduced_mesh),
            result: ReductionResult {
                original_metrics: original,
                reduced_metrics: reduced,
                strategy_used: strategy,
                was_reduced: true,
                reduction_percentage,
                halted_early,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshdensity_core::primitives::{cuboid, icosphere};
    use meshdensity_core::Error;

    #[test]
    fn test_with_config_validates() {
        let config = ReductionConfig::default().with_aggressiveness(-1.0);
        assert!(matches!(
            ReductionOrchestrator::with_config(config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_skip_borrows_input() {
        let mesh = cuboid([10.0, 10.0, 10.0], 2);
        let reduction = ReductionOrchestrator::new().adaptive_reduce(&mesh).unwrap();
        assert!(matches!(reduction.mesh, Cow::Borrowed(_)));
        assert!(!reduction.result.was_reduced);
        assert_eq!(reduction.result.strategy_used, ReductionStrategy::Skip);
        assert_eq!(reduction.result.original_metrics, reduction.result.reduced_metrics);
        assert_eq!(reduction.result.reduction_percentage, 0.0);
    }

    #[test]
    fn test_explicit_skip_on_dense_mesh() {
        let mesh = icosphere(2.0, 3);
        let reduction = ReductionOrchestrator::new()
            .reduce_with(&mesh, ReductionStrategy::Skip)
            .unwrap();
        assert!(!reduction.result.was_reduced);
        assert_eq!(reduction.into_mesh(), mesh);
    }

    #[test]
    fn test_degenerate_reduction_reports_reduced_mesh() {
        // One cell swallows the whole sphere, leaving no faces to measure
        let mesh = icosphere(1.0, 2);
        let err = ReductionOrchestrator::new()
            .reduce_with(&mesh, ReductionStrategy::Voxel { cell_size: 100.0 })
            .unwrap_err();
        assert!(matches!(err, Error::DegenerateMesh { .. }));
        let summary = err.mesh_summary().unwrap();
        assert_eq!(summary.triangles, 0);
        assert_ne!(summary, mesh.summary());
    }

    #[test]
    fn test_report_lines() {
        let mesh = icosphere(1.5, 3);
        let reduction = ReductionOrchestrator::new().adaptive_reduce(&mesh).unwrap();
        let lines = reduction.result.report_lines();
        let keys: Vec<&str> = lines.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["was_reduced", "reduced_count", "reduction_percentage", "new_density", "strategy"]
        );
        assert_eq!(lines[0].1, "true");
        assert_eq!(lines[1].1, reduction.mesh.face_count().to_string());
        assert_eq!(lines[4].1, "Aggressive QEM (70% reduction)");
    }

    #[test]
    fn test_custom_thresholds_change_tier() {
        // A coarse sphere is LOW by default but HIGH under these thresholds
        let mesh = icosphere(10.0, 2);
        let config = ReductionConfig::default().with_thresholds(meshdensity_analysis::DensityThresholds {
            low: 0.01,
            moderate: 0.02,
            moderate_high: 0.05,
            high: 1.0,
        });
        let orchestrator = ReductionOrchestrator::with_config(config).unwrap();
        let reduction = orchestrator.adaptive_reduce(&mesh).unwrap();
        assert_eq!(
            reduction.result.strategy_used,
            ReductionStrategy::Qem {
                target_ratio: 0.5,
                aggressiveness: 7.0,
                tier: Some(meshdensity_analysis::DensityTier::High),
            }
        );
        assert_eq!(reduction.result.reduced_count(), 160);
    }
}
