use image::RgbImage;

use crate::error::Result;
use crate::grid::{LabelGrid, Mask};
use crate::model::AppearanceModel;

/// Segments a stream of frames.
///
/// Implementations may carry state from one frame to the next.
pub trait Segmenter {
    /// Produce the binary mask for the next frame.
    fn segment(&mut self, frame: &RgbImage) -> Result<Mask>;

    /// Forget temporal state.
    ///
    /// Call this when:
    /// - Scene cuts detected
    /// - Starting a new sequence
    fn reset_state(&mut self) {}
}

/// Output of one refinement run on a single image.
#[derive(Debug, Clone)]
pub struct Refinement {
    /// Hinted labels plus probable labels from the last cut.
    pub labels: LabelGrid,
    /// Binary result, after the explicit-mask override when enabled.
    pub mask: Mask,
    /// Models used for the final cut.
    pub model: AppearanceModel,
    /// Energy of `mask` under `model`.
    pub energy: f64,
    /// Rounds actually run.
    pub rounds: usize,
}
