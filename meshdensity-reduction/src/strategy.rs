//! Strategy selection
//!
//! The adaptive path only ever picks between skipping and QEM decimation.
//! Voxel clustering is reachable through an explicit request alone.

use crate::config::{ReductionConfig, TierRatios};
use meshdensity_analysis::DensityTier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a mesh gets reduced. Chosen once per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReductionStrategy {
    /// Leave the mesh untouched
    Skip,
    /// Quadric error edge collapse keeping `target_ratio` of the triangles.
    /// `tier` is the density tier that selected it, if any.
    Qem {
        target_ratio: f64,
        aggressiveness: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tier: Option<DensityTier>,
    },
    /// Uniform grid vertex clustering (experimental)
    Voxel { cell_size: f64 },
}

impl ReductionStrategy {
    /// QEM requested directly rather than chosen for a tier.
    pub fn qem(target_ratio: f64, aggressiveness: f64) -> Self {
        ReductionStrategy::Qem {
            target_ratio,
            aggressiveness,
            tier: None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ReductionStrategy::Skip)
    }
}

impl fmt::Display for ReductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ReductionStrategy::Skip => f.write_str("No reduction"),
            ReductionStrategy::Qem {
                target_ratio,
                aggressiveness,
                tier,
            } => {
                let label = match tier {
                    Some(DensityTier::ModerateHigh) => "Light",
                    Some(DensityTier::High) => "Moderate",
                    Some(DensityTier::VeryHigh) => "Aggressive",
                    _ => {
                        return write!(
                            f,
                            "QEM (target ratio {}, aggressiveness {})",
                            target_ratio, aggressiveness
                        )
                    }
                };
                let removed = ((1.0 - target_ratio) * 100.0).round();
                write!(f, "{} QEM ({}% reduction)", label, removed)
            }
            ReductionStrategy::Voxel { cell_size } => {
                write!(f, "Voxel clustering ({} mm cells)", cell_size)
            }
        }
    }
}

/// Maps density tiers to reduction strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySelector {
    pub target_ratios: TierRatios,
    pub aggressiveness: f64,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::from_config(&ReductionConfig::default())
    }
}

impl StrategySelector {
    pub fn from_config(config: &ReductionConfig) -> Self {
        Self {
            target_ratios: config.target_ratios,
            aggressiveness: config.aggressiveness,
        }
    }

    pub fn select(&self, tier: DensityTier) -> ReductionStrategy {
        let target_ratio = match tier {
            DensityTier::Low | DensityTier::Moderate => return ReductionStrategy::Skip,
            DensityTier::ModerateHigh => self.target_ratios.moderate_high,
            DensityTier::High => self.target_ratios.high,
            DensityTier::VeryHigh => self.target_ratios.very_high,
        };
        ReductionStrategy::Qem {
            target_ratio,
            aggressiveness: self.aggressiveness,
            tier: Some(tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let selector = StrategySelector::default();
        assert_eq!(selector.select(DensityTier::Low), ReductionStrategy::Skip);
        assert_eq!(selector.select(DensityTier::Moderate), ReductionStrategy::Skip);
        assert_eq!(
            selector.select(DensityTier::ModerateHigh),
            ReductionStrategy::Qem {
                target_ratio: 0.7,
                aggressiveness: 7.0,
                tier: Some(DensityTier::ModerateHigh),
            }
        );
        assert_eq!(
            selector.select(DensityTier::High),
            ReductionStrategy::Qem {
                target_ratio: 0.5,
                aggressiveness: 7.0,
                tier: Some(DensityTier::High),
            }
        );
        assert_eq!(
            selector.select(DensityTier::VeryHigh),
            ReductionStrategy::Qem {
                target_ratio: 0.3,
                aggressiveness: 7.0,
                tier: Some(DensityTier::VeryHigh),
            }
        );
    }

    #[test]
    fn test_never_selects_voxel() {
        let selector = StrategySelector::default();
        for tier in DensityTier::ALL {
            assert!(!matches!(selector.select(tier), ReductionStrategy::Voxel { .. }));
        }
    }

    #[test]
    fn test_config_ratios_are_used() {
        let config = ReductionConfig::default()
            .with_aggressiveness(2.0)
            .with_target_ratios(TierRatios {
                high: 0.6,
                ..Default::default()
            });
        let selector = StrategySelector::from_config(&config);
        assert_eq!(
            selector.select(DensityTier::High),
            ReductionStrategy::Qem {
                target_ratio: 0.6,
                aggressiveness: 2.0,
                tier: Some(DensityTier::High),
            }
        );
    }

    #[test]
    fn test_labels() {
        let selector = StrategySelector::default();
        let labels: Vec<String> = DensityTier::ALL
            .iter()
            .map(|&tier| selector.select(tier).to_string())
            .collect();
        assert_eq!(
            labels,
            [
                "No reduction",
                "No reduction",
                "Light QEM (30% reduction)",
                "Moderate QEM (50% reduction)",
                "Aggressive QEM (70% reduction)",
            ]
        );
        assert_eq!(
            ReductionStrategy::qem(0.25, 1.0).to_string(),
            "QEM (target ratio 0.25, aggressiveness 1)"
        );
        assert_eq!(
            ReductionStrategy::Voxel { cell_size: 0.5 }.to_string(),
            "Voxel clustering (0.5 mm cells)"
        );
    }

    #[test]
    fn test_explicit_qem_has_no_tier_label() {
        // Same numbers as the MODERATE_HIGH default, but not chosen by a tier
        assert_eq!(
            ReductionStrategy::qem(0.7, 1.0).to_string(),
            "QEM (target ratio 0.7, aggressiveness 1)"
        );
    }

    #[test]
    fn test_custom_ratios_keep_tier_label() {
        let config = ReductionConfig::default().with_target_ratios(TierRatios {
            moderate_high: 0.6,
            very_high: 0.1,
            ..Default::default()
        });
        let selector = StrategySelector::from_config(&config);
        assert_eq!(
            selector.select(DensityTier::ModerateHigh).to_string(),
            "Light QEM (40% reduction)"
        );
        assert_eq!(
            selector.select(DensityTier::VeryHigh).to_string(),
            "Aggressive QEM (90% reduction)"
        );
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&ReductionStrategy::Voxel { cell_size: 2.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"voxel","cell_size":2.0}"#);
        let skip: ReductionStrategy = serde_json::from_str(r#"{"kind":"skip"}"#).unwrap();
        assert!(skip.is_skip());

        let json = serde_json::to_string(&ReductionStrategy::qem(0.5, 7.0)).unwrap();
        assert_eq!(json, r#"{"kind":"qem","target_ratio":0.5,"aggressiveness":7.0}"#);
        let tiered = StrategySelector::default().select(DensityTier::High);
        let back: ReductionStrategy = serde_json::from_str(&serde_json::to_string(&tiered).unwrap()).unwrap();
        assert_eq!(back, tiered);
    }
}
