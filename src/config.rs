use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SegmentError};

/// User-tunable weights for one segmentation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Multiplies the per-pixel data costs.
    pub data_term_scale: f64,
    /// Multiplies the pairwise contrast weights.
    pub smoothness_term_scale: f64,
    /// Force hinted definite pixels to their hinted label after the cut.
    pub apply_explicit_mask: bool,
    /// Add the temporal term when propagating through video frames.
    pub is_3d: bool,
    /// Penalty for flipping a pixel relative to the previous frame.
    pub energy_term_3d: f64,
    /// Upper bound on refinement rounds. The loop stops earlier once the
    /// labeling no longer changes.
    pub rounds: usize,
    pub gmm: GmmConfig,
    pub anneal: AnnealConfig,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            data_term_scale: 1.0,
            smoothness_term_scale: 1.0,
            apply_explicit_mask: false,
            is_3d: true,
            energy_term_3d: 3.0,
            rounds: 5,
            gmm: GmmConfig::default(),
            anneal: AnnealConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GmmConfig {
    pub components: usize,
    pub max_iterations: usize,
    /// EM stops once the mean log-likelihood improves by less than this.
    pub tolerance: f64,
    /// Added to every covariance diagonal so single-color regions stay invertible.
    pub covariance_floor: f64,
    pub seed: u64,
}

impl Default for GmmConfig {
    fn default() -> Self {
        Self {
            components: 5,
            max_iterations: 100,
            tolerance: 1e-3,
            covariance_floor: 0.01,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnealConfig {
    pub temperature: f64,
    /// Applied to the temperature after every single proposal.
    pub cooling_rate: f64,
    /// Number of raster sweeps over the grid.
    pub iterations: usize,
    pub seed: u64,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            cooling_rate: 0.99,
            iterations: 1,
            seed: 0,
        }
    }
}

impl SegmentationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: SegmentationConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(SegmentError::InvalidConfig(msg.into()))
        }

        if !(self.data_term_scale.is_finite() && self.data_term_scale > 0.0) {
            return invalid("data_term_scale must be positive");
        }
        if !(self.smoothness_term_scale.is_finite() && self.smoothness_term_scale >= 0.0) {
            return invalid("smoothness_term_scale must be non-negative");
        }
        if !(self.energy_term_3d.is_finite() && self.energy_term_3d >= 0.0) {
            return invalid("energy_term_3d must be non-negative");
        }
        if self.rounds == 0 {
            return invalid("rounds must be at least 1");
        }
        if self.gmm.components == 0 {
            return invalid("gmm.components must be at least 1");
        }
        if !(self.gmm.covariance_floor > 0.0) {
            return invalid("gmm.covariance_floor must be positive");
        }
        // Zero temperature turns annealing into a greedy descent.
        if !(self.anneal.temperature.is_finite() && self.anneal.temperature >= 0.0) {
            return invalid("anneal.temperature must be non-negative");
        }
        if !(self.anneal.cooling_rate > 0.0 && self.anneal.cooling_rate <= 1.0) {
            return invalid("anneal.cooling_rate must be in (0, 1]");
        }
        Ok(())
    }
}
