//! Reduction configuration

use meshdensity_analysis::DensityThresholds;
use meshdensity_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fraction of triangles kept for each tier that gets reduced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRatios {
    pub moderate_high: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for TierRatios {
    fn default() -> Self {
        Self {
            moderate_high: 0.7,
            high: 0.5,
            very_high: 0.3,
        }
    }
}

impl TierRatios {
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [
            ("moderate_high", self.moderate_high),
            ("high", self.high),
            ("very_high", self.very_high),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(Error::InvalidConfig(format!(
                    "target ratio for tier {} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for density driven reduction.
///
/// Passed explicitly to the orchestrator; nothing is read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    /// Tier boundaries in triangles/mm³
    pub thresholds: DensityThresholds,
    /// Collapse order length bias used by every QEM tier
    pub aggressiveness: f64,
    pub target_ratios: TierRatios,
    /// Keep open boundary vertices fixed during decimation
    pub preserve_boundary: bool,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            thresholds: DensityThresholds::default(),
            aggressiveness: 7.0,
            target_ratios: TierRatios::default(),
            preserve_boundary: true,
        }
    }
}

impl ReductionConfig {
    pub fn with_aggressiveness(mut self, aggressiveness: f64) -> Self {
        self.aggressiveness = aggressiveness;
        self
    }

    pub fn with_thresholds(mut self, thresholds: DensityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_target_ratios(mut self, target_ratios: TierRatios) -> Self {
        self.target_ratios = target_ratios;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.target_ratios.validate()?;
        if !(self.aggressiveness >= 0.0 && self.aggressiveness.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "aggressiveness must be finite and >= 0, got {}",
                self.aggressiveness
            )));
        }
        Ok(())
    }
}
