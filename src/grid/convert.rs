use image::{GrayImage, RgbImage};
use ndarray::Array2;

use super::Mask;

/// Flatten an RGB image into an `(H*W, 3)` color matrix in row-major pixel order.
///
/// Channel values keep their 0..255 range; contrast and mixture parameters
/// are expressed in those units.
pub fn colors_from_rgb(image: &RgbImage) -> Array2<f64> {
    let _span = tracing::debug_span!("colors_from_rgb").entered();

    let (width, height) = image.dimensions();
    let mut colors = Array2::<f64>::zeros((width as usize * height as usize, 3));

    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = y as usize * width as usize + x as usize;
        colors[[idx, 0]] = pixel[0] as f64;
        colors[[idx, 1]] = pixel[1] as f64;
        colors[[idx, 2]] = pixel[2] as f64;
    }

    colors
}

/// Read a brush or mask image: any non-zero pixel counts as marked.
pub fn mask_from_gray(image: &GrayImage) -> Mask {
    let (width, height) = image.dimensions();
    Mask::from_fn(width, height, |x, y| image.get_pixel(x, y)[0] > 0)
}
