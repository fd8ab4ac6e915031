use cutout::{ColorGrid, Mask, Rect};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const RED: [u8; 3] = [200, 40, 30];
pub const BLUE: [u8; 3] = [30, 50, 210];

/// A `fg` rectangle on a `bg` field, each channel jittered by up to `noise`.
pub fn block_image(width: u32, height: u32, block: Rect, noise: u8, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    RgbImage::from_fn(width, height, |x, y| {
        let base = if block.contains(x, y) { RED } else { BLUE };
        let mut pixel = [0u8; 3];
        for (c, value) in base.iter().enumerate() {
            let jitter = if noise > 0 {
                rng.random_range(-(noise as i16)..=noise as i16)
            } else {
                0
            };
            pixel[c] = (*value as i16 + jitter).clamp(0, 255) as u8;
        }
        Rgb(pixel)
    })
}

pub fn block_colors(width: u32, height: u32, block: Rect, noise: u8, seed: u64) -> ColorGrid {
    ColorGrid::from_rgb(&block_image(width, height, block, noise, seed))
}

pub fn block_mask(width: u32, height: u32, block: Rect) -> Mask {
    Mask::from_fn(width, height, |x, y| block.contains(x, y))
}

/// Number of 4-connected pairs with differing labels.
pub fn boundary_length(mask: &Mask) -> usize {
    let mut count = 0;
    for y in 0..mask.height() {
        for x in 0..mask.width() {
            if x + 1 < mask.width() && mask.get(x, y) != mask.get(x + 1, y) {
                count += 1;
            }
            if y + 1 < mask.height() && mask.get(x, y) != mask.get(x, y + 1) {
                count += 1;
            }
        }
    }
    count
}
