use super::FrameSource;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "ppm", "tif", "tiff"];

/// Frames read in file-name order from a directory of still images.
pub struct ImageSequence {
    pending: VecDeque<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequence {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!("Opening image sequence at {}", dir.display());

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list frames in {}", dir.display()))?
        {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();

        let Some(first) = paths.first() else {
            bail!("No image frames found in {}", dir.display());
        };
        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read {}", first.display()))?;

        tracing::info!("Found {} frames at {}x{}", paths.len(), width, height);

        Ok(Self {
            pending: paths.into(),
            width,
            height,
        })
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let frame = image::open(&path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();

        if frame.dimensions() != (self.width, self.height) {
            bail!(
                "Frame {} is {}x{}, sequence is {}x{}",
                path.display(),
                frame.width(),
                frame.height(),
                self.width,
                self.height
            );
        }

        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cutout-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn frames_come_back_in_name_order() {
        let dir = scratch_dir("order");
        let frames = [("frame_002.png", 20u8), ("frame_001.png", 10), ("frame_003.png", 30)];
        for (name, shade) in frames {
            RgbImage::from_pixel(3, 2, Rgb([shade, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequence::open(&dir).unwrap();
        assert_eq!(source.resolution(), (3, 2));

        let shades: Vec<u8> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|frame| frame.get_pixel(0, 0)[0])
            .collect();
        assert_eq!(shades, vec![10, 20, 30]);
        assert!(source.next_frame().unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        assert!(ImageSequence::open(&dir).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
