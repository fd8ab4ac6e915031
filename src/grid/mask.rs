use image::{GrayImage, Luma, RgbImage, Rgba, RgbaImage};

use crate::error::{Result, SegmentError};

use super::for_each_neighbor_pair;

/// Binary segmentation result: 1 = foreground, 0 = background, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.data[y as usize * width as usize + x as usize] = f(x, y) as u8;
            }
        }
        mask
    }

    pub(crate) fn from_data(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw 0/1 values.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn is_foreground(&self, idx: usize) -> bool {
        self.data[idx] != 0
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.is_foreground(y as usize * self.width as usize + x as usize)
    }

    pub(crate) fn set(&mut self, idx: usize, foreground: bool) {
        self.data[idx] = foreground as u8;
    }

    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn foreground_ratio(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.count_foreground() as f64 / self.data.len() as f64
    }

    /// Fraction of 4-adjacent pixel pairs that carry the same label.
    pub fn smoothness(&self) -> f64 {
        let mut pairs = 0usize;
        let mut equal = 0usize;
        for_each_neighbor_pair(self.width, self.height, |a, b| {
            pairs += 1;
            if self.data[a] == self.data[b] {
                equal += 1;
            }
        });
        if pairs == 0 {
            return 1.0;
        }
        equal as f64 / pairs as f64
    }

    /// Grayscale visualization: 255 where foreground.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    /// The source image with the mask as its alpha channel.
    pub fn apply_as_alpha(&self, image: &RgbImage) -> Result<RgbaImage> {
        if image.dimensions() != self.dimensions() {
            return Err(SegmentError::shape(
                "image",
                self.dimensions(),
                image.dimensions(),
            ));
        }

        Ok(RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = image.get_pixel(x, y);
            let alpha = if self.get(x, y) { 255 } else { 0 };
            Rgba([p[0], p[1], p[2], alpha])
        }))
    }
}
