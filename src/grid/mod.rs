mod convert;
mod labels;
mod mask;

pub use convert::{colors_from_rgb, mask_from_gray};
pub use labels::{Label, LabelGrid};
pub use mask::Mask;

use image::RgbImage;
use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{Result, SegmentError};

/// Dense H×W grid of 3-channel colors, stored row-major as an `(H*W, 3)` matrix
/// so mixture scoring can run over every pixel in one pass.
#[derive(Debug, Clone)]
pub struct ColorGrid {
    width: u32,
    height: u32,
    colors: Array2<f64>,
}

impl ColorGrid {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            colors: colors_from_rgb(image),
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [f64; 3]) -> Self {
        let mut colors = Array2::zeros((width as usize * height as usize, 3));
        for y in 0..height {
            for x in 0..width {
                let c = f(x, y);
                let idx = y as usize * width as usize + x as usize;
                colors[[idx, 0]] = c[0];
                colors[[idx, 1]] = c[1];
                colors[[idx, 2]] = c[2];
            }
        }
        Self {
            width,
            height,
            colors,
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

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.colors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn colors(&self) -> ArrayView2<'_, f64> {
        self.colors.view()
    }

    pub fn color(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.colors.row(idx)
    }

    pub fn squared_distance(&self, a: usize, b: usize) -> f64 {
        self.colors
            .row(a)
            .iter()
            .zip(self.colors.row(b).iter())
            .map(|(p, q)| (p - q) * (p - q))
            .sum()
    }

    /// Gathers the colors of the selected pixels into a sample matrix.
    pub fn select(&self, mut keep: impl FnMut(usize) -> bool) -> Array2<f64> {
        let picked: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        self.colors.select(ndarray::Axis(0), &picked)
    }

    pub(crate) fn ensure_dimensions(&self, what: &'static str, actual: (u32, u32)) -> Result<()> {
        if actual != self.dimensions() {
            return Err(SegmentError::shape(what, self.dimensions(), actual));
        }
        Ok(())
    }
}

/// Visits each undirected 4-neighbor pair once, as `(pixel, right)` and
/// `(pixel, below)` in raster order.
pub(crate) fn for_each_neighbor_pair(width: u32, height: u32, mut f: impl FnMut(usize, usize)) {
    let (w, h) = (width as usize, height as usize);
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            if x + 1 < w {
                f(idx, idx + 1);
            }
            if y + 1 < h {
                f(idx, idx + w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_pairs_cover_grid_once() {
        let mut pairs = Vec::new();
        for_each_neighbor_pair(3, 2, |a, b| pairs.push((a, b)));
        // 2 rows * 2 horizontal + 3 columns * 1 vertical
        assert_eq!(pairs.len(), 7);
        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(2, 5)));
        assert!(!pairs.contains(&(2, 3)));
    }

    #[test]
    fn select_gathers_rows() {
        let grid = ColorGrid::from_fn(2, 2, |x, y| [x as f64, y as f64, 7.0]);
        let picked = grid.select(|i| i % 2 == 1);
        assert_eq!(picked.nrows(), 2);
        assert_eq!(picked[[0, 0]], 1.0);
        assert_eq!(picked[[1, 1]], 1.0);
        assert_eq!(grid.squared_distance(0, 3), 2.0);
    }
}
