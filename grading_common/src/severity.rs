//! Severity-index computation: smoothing plus the normalized blue/green
//! difference index, rescaled to 8 bits.

use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::{gaussian_blur_f32, median_filter};

/// Denominator guard for pixels where both channels are zero.
const NDFI_EPSILON: f64 = 0.0001;
/// Sigma for the 9x9 gaussian pass (the sigma OpenCV derives for kernel
/// size 9 when none is given).
const GAUSSIAN_SIGMA: f32 = 1.7;

/// Suppress impulse noise and high-frequency kernel texture: 5x5 median
/// followed by a 9x9 gaussian.
pub fn smooth(image: &RgbImage) -> RgbImage {
    let median = median_filter(image, 2, 2);
    gaussian_blur_f32(&median, GAUSSIAN_SIGMA)
}

/// Per-pixel normalized difference index `(B - G) / (B + G + eps)`,
/// rescaled from `[-1, 1]` to `[0, 255]`. Lower values indicate stronger
/// contamination fluorescence.
pub fn severity_map(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut map = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let blue = pixel[2] as f64;
        let green = pixel[1] as f64;
        let index = (blue - green) / (blue + green + NDFI_EPSILON);
        let scaled = ((index + 1.0) * 127.5).round().clamp(0.0, 255.0);
        map.put_pixel(x, y, Luma([scaled as u8]));
    }
    map
}

/// Rec. 601 luma of the smoothed image; the brightness source for object
/// scoring.
pub fn brightness_plane(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let luma =
            0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
        gray.put_pixel(x, y, Luma([luma.round().clamp(0.0, 255.0) as u8]));
    }
    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn severity_of(r: u8, g: u8, b: u8) -> u8 {
        let image = RgbImage::from_pixel(1, 1, Rgb([r, g, b]));
        severity_map(&image).get_pixel(0, 0)[0]
    }

    #[test]
    fn severity_midpoint_for_balanced_channels() {
        // Index 0 lands on the midpoint of the 8-bit range.
        assert_eq!(severity_of(0, 0, 0), 128);
        assert_eq!(severity_of(0, 100, 100), 128);
    }

    #[test]
    fn severity_extremes() {
        assert_eq!(severity_of(0, 0, 255), 255);
        assert_eq!(severity_of(0, 255, 0), 0);
    }

    #[test]
    fn severity_mid_band_value() {
        // (155 - 100) / (255.0001) -> scaled to 155.
        assert_eq!(severity_of(0, 100, 155), 155);
    }

    #[test]
    fn brightness_uses_rec601_weights() {
        let image = RgbImage::from_pixel(1, 1, Rgb([100, 150, 50]));
        assert_eq!(brightness_plane(&image).get_pixel(0, 0)[0], 124);
    }
}
