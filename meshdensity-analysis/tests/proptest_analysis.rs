//! Property-based tests for density analysis.
//!
//! Run with: cargo test -p meshdensity-analysis -- proptest

use meshdensity_analysis::{classify, compute_metrics, DensityThresholds, DensityTier};
use meshdensity_core::primitives::{cuboid, icosphere};
use meshdensity_core::{Bounded, TriangleMesh};
use proptest::prelude::*;

fn arb_box() -> impl Strategy<Value = TriangleMesh> {
    (prop::array::uniform3(0.5f32..20.0), 1usize..5).prop_map(|(extent, segments)| cuboid(extent, segments))
}

fn arb_sphere() -> impl Strategy<Value = TriangleMesh> {
    (0.5f32..25.0, 0u32..3).prop_map(|(radius, subdivisions)| icosphere(radius, subdivisions))
}

/// Reference tier computed from interval membership rather than ordered checks.
fn tier_by_interval(density: f64) -> DensityTier {
    let bounds = [0.0, 5.0, 10.0, 20.0, 50.0];
    let matching: Vec<usize> = (0..5)
        .filter(|&i| {
            let above_lower = i == 0 || density > bounds[i];
            let below_upper = i == 4 || density <= bounds[i + 1];
            above_lower && below_upper
        })
        .collect();
    assert_eq!(matching.len(), 1, "density {} matched {:?}", density, matching);
    DensityTier::ALL[matching[0]]
}

proptest! {
    #[test]
    fn proptest_tiers_partition_non_negative_reals(density in 0.0f64..200.0) {
        prop_assert_eq!(classify(density), tier_by_interval(density));
    }

    #[test]
    fn proptest_boundary_values_are_lower_tier(index in 0usize..4) {
        let t = DensityThresholds::default();
        let bound = [t.low, t.moderate, t.moderate_high, t.high][index];
        prop_assert_eq!(classify(bound), DensityTier::ALL[index]);
        prop_assert_eq!(classify(bound + 1e-9), DensityTier::ALL[index + 1]);
    }

    #[test]
    fn proptest_classify_is_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(lo) <= classify(hi));
    }

    #[test]
    fn proptest_metrics_idempotent(mesh in arb_sphere()) {
        let first = compute_metrics(&mesh).unwrap();
        let second = compute_metrics(&mesh).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn proptest_box_volume_matches_extent(mesh in arb_box()) {
        let (min, max) = mesh.bounding_box();
        let expected = ((max.x - min.x) * (max.y - min.y) * (max.z - min.z)) as f64;
        let metrics = compute_metrics(&mesh).unwrap();
        prop_assert!((metrics.volume - expected).abs() / expected < 1e-4);
        prop_assert!((metrics.density - metrics.triangle_count as f64 / metrics.volume).abs() < 1e-9);
        prop_assert_eq!(metrics.is_high_density, metrics.density > 10.0);
    }
}
