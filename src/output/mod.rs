mod png;

pub use png::PngSequence;

use anyhow::Result;
use cutout::Mask;
use image::RgbImage;

/// Trait for output destinations
pub trait FrameSink {
    /// Write a segmented frame to the output
    fn write_frame(&mut self, frame: &RgbImage, mask: &Mask) -> Result<()>;

    /// Number of frames written so far
    fn frames_written(&self) -> usize;
}
