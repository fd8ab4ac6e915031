use image::RgbImage;

use crate::config::SegmentationConfig;
use crate::error::{Result, SegmentError};
use crate::graph::EnergyTerms;
use crate::grid::{ColorGrid, Mask};
use crate::model::AppearanceModel;

use super::types::{Refinement, Segmenter};

/// Carries a frozen appearance model across the frames of a sequence.
///
/// The models are never refit here: each frame is scored under the models
/// learned on the first frame and resolved with a single cut.
#[derive(Debug, Clone)]
pub struct FramePropagator {
    model: AppearanceModel,
    config: SegmentationConfig,
    previous: Option<Mask>,
}

impl FramePropagator {
    pub fn new(model: AppearanceModel, config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            previous: None,
        })
    }

    /// Continue from a refined first frame; its mask becomes the temporal
    /// reference for the next frame.
    pub fn from_refinement(refinement: &Refinement, config: SegmentationConfig) -> Result<Self> {
        let mut propagator = Self::new(refinement.model.clone(), config)?;
        propagator.previous = Some(refinement.mask.clone());
        Ok(propagator)
    }

    pub fn model(&self) -> &AppearanceModel {
        &self.model
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn previous_mask(&self) -> Option<&Mask> {
        self.previous.as_ref()
    }

    /// Segment `frame` with a penalty of `temporal_weight` for every pixel
    /// whose label differs from `previous`.
    pub fn propagate(
        &self,
        frame: &ColorGrid,
        previous: &Mask,
        temporal_weight: f64,
    ) -> Result<Mask> {
        let _span = tracing::debug_span!("propagate", temporal_weight).entered();

        if !temporal_weight.is_finite() || temporal_weight < 0.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "temporal weight must be finite and non-negative, got {temporal_weight}"
            )));
        }
        frame.ensure_dimensions("previous mask", previous.dimensions())?;

        let terms = EnergyTerms::new(frame, &self.model, &self.config)
            .with_temporal_prior(previous, temporal_weight)?;
        let result = terms.solve();

        tracing::debug!(
            energy = result.energy,
            foreground = result.mask.count_foreground(),
            "frame propagated"
        );
        Ok(result.mask)
    }

    /// Segment `frame` on its own with the frozen models.
    pub fn segment_independent(&self, frame: &ColorGrid) -> Mask {
        let _span = tracing::debug_span!("segment_independent").entered();
        EnergyTerms::new(frame, &self.model, &self.config)
            .solve()
            .mask
    }

    /// The 3-D path once a previous mask exists and the temporal term is on,
    /// otherwise the 2-D path.
    pub fn segment_frame(&mut self, frame: &ColorGrid) -> Result<Mask> {
        let mask = match (&self.previous, self.config.is_3d) {
            (Some(previous), true) => {
                self.propagate(frame, previous, self.config.energy_term_3d)?
            }
            (Some(previous), false) => {
                frame.ensure_dimensions("previous mask", previous.dimensions())?;
                self.segment_independent(frame)
            }
            (None, _) => self.segment_independent(frame),
        };
        self.previous = Some(mask.clone());
        Ok(mask)
    }
}

impl Segmenter for FramePropagator {
    fn segment(&mut self, frame: &RgbImage) -> Result<Mask> {
        self.segment_frame(&ColorGrid::from_rgb(frame))
    }

    fn reset_state(&mut self) {
        tracing::debug!("temporal state cleared");
        self.previous = None;
    }
}
