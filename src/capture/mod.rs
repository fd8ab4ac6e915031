mod sequence;

pub use sequence::ImageSequence;

use anyhow::Result;
use image::RgbImage;

/// Trait for frame sources
pub trait FrameSource {
    /// Read the next frame, `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of the frames
    fn resolution(&self) -> (u32, u32);
}
