//! Image enhancement ladder for decode retries
//!
//! Scanned delivery orders are often low-contrast or noisy. When a page's
//! barcodes fail to decode, the detection orchestrator re-renders the attempt
//! through an escalating ladder of enhancement levels. Each level is a pure
//! function of (image, level); levels are cumulative.

use image::DynamicImage;
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, open};

/// Sigma for the level-2 noise-reduction blur. Kept small so bar edges
/// survive; barcode modules at 300 DPI are several pixels wide.
const BLUR_SIGMA: f32 = 1.0;

/// Kernel radius for the level-3 morphological cleanup.
const MORPH_RADIUS: u8 = 1;

/// A step in the enhancement ladder, applied before re-attempting decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnhancementLevel {
    /// Level 0: the original rendered page, untouched.
    Original,
    /// Level 1: grayscale + histogram equalization.
    Contrast,
    /// Level 2: level 1 + Gaussian noise reduction.
    Denoise,
    /// Level 3: level 2 + morphological cleanup.
    Morphology,
}

impl EnhancementLevel {
    /// All levels, in escalation order.
    pub const ALL: [EnhancementLevel; 4] = [
        EnhancementLevel::Original,
        EnhancementLevel::Contrast,
        EnhancementLevel::Denoise,
        EnhancementLevel::Morphology,
    ];

    /// Numeric level, 0..=3.
    pub fn index(self) -> u8 {
        match self {
            EnhancementLevel::Original => 0,
            EnhancementLevel::Contrast => 1,
            EnhancementLevel::Denoise => 2,
            EnhancementLevel::Morphology => 3,
        }
    }
}

/// Apply an enhancement level to a rendered page image.
///
/// Deterministic and infallible: a degenerate image (zero width or height)
/// is returned unchanged rather than erroring, since downstream decode will
/// simply find nothing in it.
pub fn apply(image: &DynamicImage, level: EnhancementLevel) -> DynamicImage {
    if level == EnhancementLevel::Original {
        return image.clone();
    }
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }

    let mut gray = equalize_histogram(&image.to_luma8());

    if level >= EnhancementLevel::Denoise {
        gray = gaussian_blur_f32(&gray, BLUR_SIGMA);
    }

    if level >= EnhancementLevel::Morphology {
        // Close fills pinhole dropouts inside bars, open removes speckle
        // between them.
        gray = open(&close(&gray, Norm::LInf, MORPH_RADIUS), Norm::LInf, MORPH_RADIUS);
    }

    DynamicImage::ImageLuma8(gray)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn test_image() -> DynamicImage {
        let mut img = RgbImage::new(64, 48);
        for (x, y, p) in img.enumerate_pixels_mut() {
            let v = ((x * 3 + y * 5) % 256) as u8;
            p.0 = [v, v, v];
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn level_zero_is_identity() {
        let img = test_image();
        let out = apply(&img, EnhancementLevel::Original);
        assert_eq!(out.to_rgb8().as_raw(), img.to_rgb8().as_raw());
    }

    #[test]
    fn enhanced_levels_preserve_dimensions() {
        let img = test_image();
        for level in EnhancementLevel::ALL {
            let out = apply(&img, level);
            assert_eq!(out.width(), img.width(), "level {:?}", level);
            assert_eq!(out.height(), img.height(), "level {:?}", level);
        }
    }

    #[test]
    fn degenerate_image_returned_unchanged() {
        let img = DynamicImage::new_rgb8(0, 0);
        for level in EnhancementLevel::ALL {
            let out = apply(&img, level);
            assert_eq!(out.width(), 0);
            assert_eq!(out.height(), 0);
        }
    }

    #[test]
    fn apply_is_deterministic() {
        let img = test_image();
        let a = apply(&img, EnhancementLevel::Morphology);
        let b = apply(&img, EnhancementLevel::Morphology);
        assert_eq!(a.to_luma8().as_raw(), b.to_luma8().as_raw());
    }

    #[test]
    fn level_indices_escalate() {
        let indices: Vec<u8> = EnhancementLevel::ALL.iter().map(|l| l.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
