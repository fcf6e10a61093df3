//! Density tiers
//!
//! Tiers partition `[0, ∞)` into half-open intervals `(lower, upper]` so a
//! density sitting exactly on a threshold belongs to the lower tier.

use crate::metrics::{round_to, GeometryMetrics};
use meshdensity_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete tessellation density classification, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DensityTier {
    /// `density <= low`
    Low,
    /// `low < density <= moderate`
    Moderate,
    /// `moderate < density <= moderate_high`
    ModerateHigh,
    /// `moderate_high < density <= high`
    High,
    /// `density > high`
    VeryHigh,
}

impl DensityTier {
    pub const ALL: [DensityTier; 5] = [
        DensityTier::Low,
        DensityTier::Moderate,
        DensityTier::ModerateHigh,
        DensityTier::High,
        DensityTier::VeryHigh,
    ];

    /// Upper-case label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            DensityTier::Low => "LOW",
            DensityTier::Moderate => "MODERATE",
            DensityTier::ModerateHigh => "MODERATE-HIGH",
            DensityTier::High => "HIGH",
            DensityTier::VeryHigh => "VERY HIGH",
        }
    }
}

impl fmt::Display for DensityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Upper bounds (inclusive) of the four lower tiers, in triangles/mm³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityThresholds {
    pub low: f64,
    pub moderate: f64,
    pub moderate_high: f64,
    pub high: f64,
}

impl Default for DensityThresholds {
    fn default() -> Self {
        Self {
            low: 5.0,
            moderate: 10.0,
            moderate_high: 20.0,
            high: 50.0,
        }
    }
}

impl DensityThresholds {
    /// Thresholds must be finite, non-negative and strictly ascending.
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.low, self.moderate, self.moderate_high, self.high];
        if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(Error::InvalidConfig(format!(
                "density thresholds must be finite and non-negative, got {:?}",
                bounds
            )));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(format!(
                "density thresholds must be strictly ascending, got {:?}",
                bounds
            )));
        }
        Ok(())
    }

    pub fn classify(&self, density: f64) -> DensityTier {
        if density <= self.low {
            DensityTier::Low
        } else if density <= self.moderate {
            DensityTier::Moderate
        } else if density <= self.moderate_high {
            DensityTier::ModerateHigh
        } else if density <= self.high {
            DensityTier::High
        } else {
            // NaN also lands here so the function stays total
            DensityTier::VeryHigh
        }
    }
}

/// Maps densities to tiers against a fixed set of thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DensityClassifier {
    thresholds: DensityThresholds,
}

impl DensityClassifier {
    pub fn new(thresholds: DensityThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &DensityThresholds {
        &self.thresholds
    }

    pub fn classify(&self, density: f64) -> DensityTier {
        self.thresholds.classify(density)
    }

    pub fn assess(&self, metrics: &GeometryMetrics) -> DensityAssessment {
        DensityAssessment {
            tier: self.classify(metrics.density),
            triangle_count: metrics.triangle_count,
            density: metrics.density,
        }
    }
}

/// Classify `density` against the default thresholds (5, 10, 20, 50).
pub fn classify(density: f64) -> DensityTier {
    DensityThresholds::default().classify(density)
}

/// One-line tier summary printed under the metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityAssessment {
    pub tier: DensityTier,
    pub triangle_count: usize,
    pub density: f64,
}

impl fmt::Display for DensityAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} DENSITY ({} triangles, {} tri/mm³)",
            self.tier,
            self.triangle_count,
            round_to(self.density, 4)
        )?;
        if self.tier == DensityTier::VeryHigh {
            f.write_str(" - Consider reduction")?;
        }
        Ok(())
    }
}
