use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;

/// Preprocessor for turning RGB frames into binary foreground masks
pub struct Preprocessor {
    blur_sigma: Option<f32>,
    binary_threshold: u8,
}

impl Preprocessor {
    /// # Arguments
    /// * `blur_kernel` - Side of the square smoothing kernel in pixels; 1 or less disables smoothing
    /// * `binary_threshold` - Intensities strictly above this become foreground
    pub fn new(blur_kernel: u32, binary_threshold: u8) -> Self {
        Self {
            blur_sigma: kernel_sigma(blur_kernel),
            binary_threshold,
        }
    }

    /// Convert an RGB frame to 8-bit BT.601 luma
    pub fn grayscale(frame: &RgbImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let p = frame.get_pixel(x, y);
            Luma([bt601_luma(p[0], p[1], p[2])])
        })
    }

    /// Preprocess an RGB frame into a binary mask
    ///
    /// Steps:
    /// 1. Convert to grayscale
    /// 2. Gaussian blur to suppress sensor noise
    /// 3. Fixed threshold: 255 for foreground, 0 for background
    pub fn foreground_mask(&self, frame: &RgbImage) -> GrayImage {
        let _span = tracing::debug_span!("preprocess").entered();

        let gray = Self::grayscale(frame);
        let smoothed = match self.blur_sigma {
            Some(sigma) => gaussian_blur_f32(&gray, sigma),
            None => gray,
        };

        threshold(&smoothed, self.binary_threshold, ThresholdType::Binary)
    }

    /// Convert a binary mask to an RGB image for visualization
    pub fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
        let (width, height) = mask.dimensions();
        RgbImage::from_fn(width, height, |x, y| {
            let value = mask.get_pixel(x, y)[0];
            image::Rgb([value, value, value])
        })
    }
}

/// 0.299 R + 0.587 G + 0.114 B in 14-bit fixed point, rounded to nearest.
fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    const SHIFT: u32 = 14;

    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << (SHIFT - 1))) >> SHIFT) as u8
}

/// Sigma of the Gaussian a `ksize x ksize` kernel represents when no sigma is
/// given explicitly, matching the usual OpenCV convention.
fn kernel_sigma(ksize: u32) -> Option<f32> {
    if ksize <= 1 {
        return None;
    }
    Some(0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn reference_kernel_maps_to_sigma_three_and_a_half() {
        let sigma = kernel_sigma(21).unwrap();
        assert!((sigma - 3.5).abs() < 1e-6);
        assert_eq!(kernel_sigma(1), None);
        assert_eq!(kernel_sigma(0), None);
    }

    #[test]
    fn mask_marks_bright_pixels_only() {
        let mut frame = RgbImage::new(80, 60);
        for y in 20..40 {
            for x in 20..60 {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }

        let mask = Preprocessor::new(1, 100).foreground_mask(&frame);
        assert_eq!(mask.get_pixel(30, 30)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.pixels().filter(|p| p[0] == 255).count(), 40 * 20);
    }

    #[test]
    fn threshold_is_strict() {
        let frame = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let mask = Preprocessor::new(1, 100).foreground_mask(&frame);
        assert!(mask.pixels().all(|p| p[0] == 0));

        let frame = RgbImage::from_pixel(4, 4, Rgb([101, 101, 101]));
        let mask = Preprocessor::new(1, 100).foreground_mask(&frame);
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn luma_uses_bt601_weights() {
        assert_eq!(bt601_luma(0, 150, 0), 88);
        assert_eq!(bt601_luma(150, 0, 0), 45);
        assert_eq!(bt601_luma(0, 0, 150), 17);
        assert_eq!(bt601_luma(150, 150, 150), 150);
        assert_eq!(bt601_luma(255, 255, 255), 255);
        assert_eq!(bt601_luma(0, 0, 0), 0);
    }

    #[test]
    fn saturated_green_stays_background() {
        let mut frame = RgbImage::new(80, 60);
        for y in 20..40 {
            for x in 20..60 {
                frame.put_pixel(x, y, Rgb([0, 150, 0]));
            }
        }
        let pre = Preprocessor::new(1, 100);
        assert!(pre.foreground_mask(&frame).pixels().all(|p| p[0] == 0));

        for y in 20..40 {
            for x in 20..60 {
                frame.put_pixel(x, y, Rgb([150, 150, 150]));
            }
        }
        assert_eq!(
            pre.foreground_mask(&frame).pixels().filter(|p| p[0] == 255).count(),
            40 * 20
        );
    }

    #[test]
    fn blur_removes_isolated_pixels() {
        let mut frame = RgbImage::new(64, 64);
        frame.put_pixel(32, 32, Rgb([255, 255, 255]));

        let mask = Preprocessor::new(21, 100).foreground_mask(&frame);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
