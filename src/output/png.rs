use super::FrameSink;
use anyhow::{Context, Result};
use cutout::Mask;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes numbered `NNNNNN_cutout.png` (RGBA, mask as alpha) and
/// `NNNNNN_mask.png` (0/255 grayscale) files into a directory.
pub struct PngSequence {
    dir: PathBuf,
    written: usize,
    write_masks: bool,
}

impl PngSequence {
    pub fn new<P: AsRef<Path>>(dir: P, write_masks: bool) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tracing::info!("Writing frames to {}", dir.display());

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        Ok(Self {
            dir,
            written: 0,
            write_masks,
        })
    }

    fn frame_path(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{:06}_{}.png", self.written, kind))
    }
}

impl FrameSink for PngSequence {
    fn write_frame(&mut self, frame: &RgbImage, mask: &Mask) -> Result<()> {
        let cutout = mask
            .apply_as_alpha(frame)
            .context("Mask does not match frame")?;
        let path = self.frame_path("cutout");
        cutout
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        if self.write_masks {
            let path = self.frame_path("mask");
            mask.to_gray_image()
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        self.written += 1;
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn writes_cutout_and_mask() {
        let dir = std::env::temp_dir().join(format!("cutout-png-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut sink = PngSequence::new(&dir, true).unwrap();
        let frame = RgbImage::from_pixel(2, 1, Rgb([9, 8, 7]));
        let mask = Mask::from_fn(2, 1, |x, _| x == 1);
        sink.write_frame(&frame, &mask).unwrap();
        assert_eq!(sink.frames_written(), 1);

        let cutout = image::open(dir.join("000000_cutout.png")).unwrap().to_rgba8();
        assert_eq!(cutout.get_pixel(0, 0).0, [9, 8, 7, 0]);
        assert_eq!(cutout.get_pixel(1, 0).0, [9, 8, 7, 255]);
        let gray = image::open(dir.join("000000_mask.png")).unwrap().to_luma8();
        assert_eq!(gray.get_pixel(1, 0).0, [255]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn mismatched_mask_is_an_error() {
        let dir = std::env::temp_dir().join(format!("cutout-png-bad-{}", std::process::id()));
        let mut sink = PngSequence::new(&dir, false).unwrap();
        let frame = RgbImage::new(2, 2);
        assert!(sink.write_frame(&frame, &Mask::new(3, 2)).is_err());
        assert_eq!(sink.frames_written(), 0);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
