//! Flat-kernel morphology and Gaussian smoothing.
//!
//! Erosion and dilation use a square structuring element of ones. The window
//! anchor sits at `size / 2` and out-of-bounds samples are skipped, so border
//! pixels are computed from the in-bounds part of their window only. The
//! border therefore never darkens an erosion or brightens a dilation.

use ndarray::{Array2, ArrayView2};

use crate::convolve::{auto_sigma, convolve2d, gaussian_kernel, ConvolveOptions};

fn morph_pass(image: &ArrayView2<f32>, kernel_size: usize, pick_max: bool) -> Array2<f32> {
    let (rows, cols) = image.dim();
    let anchor = kernel_size / 2;
    let mut out = Array2::zeros((rows, cols));

    for i in 0..rows {
        let r0 = i.saturating_sub(anchor);
        let r1 = (i + kernel_size - anchor).min(rows);
        for j in 0..cols {
            let c0 = j.saturating_sub(anchor);
            let c1 = (j + kernel_size - anchor).min(cols);

            let mut acc = image[[i, j]];
            for ii in r0..r1 {
                for jj in c0..c1 {
                    let v = image[[ii, jj]];
                    acc = if pick_max { acc.max(v) } else { acc.min(v) };
                }
            }
            out[[i, j]] = acc;
        }
    }

    out
}

/// Grow bright regions with a `kernel_size`-square maximum filter.
pub fn dilate(image: &ArrayView2<f32>, kernel_size: usize, iterations: usize) -> Array2<f32> {
    let mut current = image.to_owned();
    for _ in 0..iterations {
        current = morph_pass(&current.view(), kernel_size, true);
    }
    current
}

/// Shrink bright regions with a `kernel_size`-square minimum filter.
pub fn erode(image: &ArrayView2<f32>, kernel_size: usize, iterations: usize) -> Array2<f32> {
    let mut current = image.to_owned();
    for _ in 0..iterations {
        current = morph_pass(&current.view(), kernel_size, false);
    }
    current
}

/// Gaussian blur with sigma derived from the kernel size alone.
///
/// Uses the OpenCV size-to-sigma convention for "sigma 0" blur calls, see
/// [`auto_sigma`]. Kernel size must be odd.
pub fn gaussian_blur(image: &ArrayView2<f32>, kernel_size: usize) -> Array2<f32> {
    let kernel = gaussian_kernel(kernel_size, auto_sigma(kernel_size));
    convolve2d(image, &kernel.view(), ConvolveOptions::default())
}
