mod anneal;
mod refine;
pub mod types;
mod video;

pub use anneal::{anneal, Annealing};
pub use refine::{refine, GraphCut};
pub use types::{Refinement, Segmenter};
pub use video::FramePropagator;

use crate::config::SegmentationConfig;
use crate::error::Result;
use crate::grid::ColorGrid;
use crate::hint::RegionHint;

/// Refine the first frame of a sequence and hand back a propagator primed
/// with its mask and models.
pub fn create_propagator(
    first_frame: &ColorGrid,
    hint: &RegionHint,
    config: SegmentationConfig,
) -> Result<(Refinement, Box<dyn Segmenter>)> {
    let refinement = refine(first_frame, hint, &config)?;
    let propagator = FramePropagator::from_refinement(&refinement, config)?;
    Ok((refinement, Box::new(propagator)))
}
