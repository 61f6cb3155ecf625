//! Star mask construction and feathering.
//!
//! A mask is a 2-D float array the same shape as the grayscale image it
//! targets. 1.0 means "replace with attenuated content here", 0.0 means
//! "keep the original". Masks are strictly binary ({0.0, 1.0}) until
//! [`feather`] softens them into the alpha mask used for compositing.

use ndarray::{Array2, ArrayView2};

use crate::detect::Star;
use crate::frame::normalize;
use crate::morphology::{dilate, erode, gaussian_blur};
use crate::params::MaskGrowth;

/// Build a point-mode mask: one filled disk per cataloged star.
///
/// Centroids are rounded to the nearest pixel; out-of-bounds centroids are
/// clipped to the image extent rather than dropped, so a star just past the
/// frame edge still masks the pixels it bleeds into. An empty catalog yields
/// an all-zero mask.
pub fn mask_from_catalog(shape: (usize, usize), stars: &[Star], radius: usize) -> Array2<f32> {
    let (rows, cols) = shape;
    let mut mask = Array2::zeros(shape);
    if rows == 0 || cols == 0 {
        return mask;
    }

    let r = radius as isize;
    for star in stars {
        let cx = (star.x.round() as isize).clamp(0, cols as isize - 1);
        let cy = (star.y.round() as isize).clamp(0, rows as isize - 1);

        for dy in -r..=r {
            let y = cy + dy;
            if y < 0 || y >= rows as isize {
                continue;
            }
            for dx in -r..=r {
                let x = cx + dx;
                if x < 0 || x >= cols as isize {
                    continue;
                }
                if dx * dx + dy * dy <= r * r {
                    mask[[y as usize, x as usize]] = 1.0;
                }
            }
        }
    }

    mask
}

/// Build a threshold-mode mask from a star-only image.
///
/// The star-only image is normalized to [0, 1] first, then every pixel
/// strictly above `threshold` becomes 1.0.
pub fn mask_from_staronly(staronly: &ArrayView2<f32>, threshold: f32) -> Array2<f32> {
    let normalized = normalize(staronly);
    normalized.mapv(|v| if v > threshold { 1.0 } else { 0.0 })
}

/// Binary threshold: 1.0 where `image >= threshold`, else 0.0.
///
/// Shared by the statistical detector's segmentation stage.
pub fn apply_threshold(image: &ArrayView2<f32>, threshold: f32) -> Array2<f32> {
    image.mapv(|v| if v >= threshold { 1.0 } else { 0.0 })
}

/// Soften a binary mask into the alpha mask used for compositing.
///
/// Applies, in order: a morphological grow/shrink with a square
/// `morph_kernel` element for `iterations` passes, a Gaussian blur sized by
/// `blur_kernel` (odd), and a hard clamp to [0, 1] to correct blur overshoot.
/// The morphological step runs before the blur so the composite transitions
/// smoothly across star edges instead of cutting a hard disk.
pub fn feather(
    mask: &ArrayView2<f32>,
    growth: MaskGrowth,
    morph_kernel: usize,
    iterations: usize,
    blur_kernel: usize,
) -> Array2<f32> {
    let widened = match growth {
        MaskGrowth::Grow => dilate(mask, morph_kernel, iterations),
        MaskGrowth::Shrink => erode(mask, morph_kernel, iterations),
    };
    let mut soft = gaussian_blur(&widened.view(), blur_kernel);
    soft.mapv_inplace(|v| v.clamp(0.0, 1.0));
    soft
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn star_at(x: f32, y: f32) -> Star {
        Star { x, y, flux: 1.0 }
    }

    #[test]
    fn point_mask_is_binary_and_disk_shaped() {
        let mask = mask_from_catalog((21, 21), &[star_at(10.0, 10.0)], 4);

        assert!(mask.iter().all(|&v| v == 0.0 || v == 1.0));
        assert_eq!(mask[[10, 10]], 1.0);
        assert_eq!(mask[[10, 14]], 1.0); // on-axis at radius
        assert_eq!(mask[[14, 14]], 0.0); // diagonal corner outside the disk
        assert_eq!(mask[[10, 15]], 0.0);
    }

    #[test]
    fn zero_radius_marks_single_pixel() {
        let mask = mask_from_catalog((5, 5), &[star_at(2.4, 1.6)], 0);
        let on: usize = mask.iter().filter(|&&v| v == 1.0).count();
        assert_eq!(on, 1);
        assert_eq!(mask[[2, 2]], 1.0);
    }

    #[test]
    fn out_of_bounds_centroid_is_clipped_not_dropped() {
        let mask = mask_from_catalog((10, 10), &[star_at(-3.0, 4.0)], 2);
        // Clipped to column 0; the disk still paints the edge
        assert_eq!(mask[[4, 0]], 1.0);
        assert_eq!(mask[[4, 2]], 1.0);
        assert!(mask.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn empty_catalog_yields_zero_mask() {
        let mask = mask_from_catalog((8, 8), &[], 3);
        assert!(mask.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn threshold_mask_normalizes_first() {
        // Raw values far above 1; normalization brings the bright pixel to 1.0
        let mut staronly = Array2::from_elem((4, 4), 100.0_f32);
        staronly[[1, 1]] = 5000.0;
        let mask = mask_from_staronly(&staronly.view(), 0.5);
        assert_eq!(mask[[1, 1]], 1.0);
        assert_eq!(mask[[0, 0]], 0.0);
        assert!(mask.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn feather_keeps_values_in_unit_interval() {
        let mask = mask_from_catalog((32, 32), &[star_at(16.0, 16.0)], 5);
        let soft = feather(&mask.view(), MaskGrowth::Grow, 3, 1, 3);
        assert_eq!(soft.dim(), (32, 32));
        assert!(soft.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // Blur must produce intermediate values at the rim
        assert!(soft.iter().any(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn feather_shrink_tightens_the_mask() {
        let mask = mask_from_catalog((32, 32), &[star_at(16.0, 16.0)], 5);
        let grown = feather(&mask.view(), MaskGrowth::Grow, 3, 1, 3);
        let shrunk = feather(&mask.view(), MaskGrowth::Shrink, 3, 1, 3);
        let grown_sum: f32 = grown.iter().sum();
        let shrunk_sum: f32 = shrunk.iter().sum();
        assert!(shrunk_sum < grown_sum);
    }
}
