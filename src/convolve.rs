//! 2-D convolution and Gaussian kernels.
//!
//! Convolution runs in parallel through `rayon` by default; the sequential
//! path exists for small kernels where thread fan-out costs more than it
//! saves.

use ndarray::{Array2, ArrayView2, Zip};

/// Edge handling for pixels sampled outside the image bounds.
#[derive(Debug, Clone, Copy)]
pub enum EdgeMode {
    /// Substitute a constant value.
    Constant(f32),
    /// Mirror the image at its edges.
    Reflect,
    /// Repeat the nearest edge pixel.
    Extend,
}

/// Options controlling a convolution pass.
#[derive(Debug, Clone, Copy)]
pub struct ConvolveOptions {
    /// Process output rows in parallel with rayon.
    pub parallel: bool,
    /// How out-of-bounds samples are produced.
    pub edge_mode: EdgeMode,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            edge_mode: EdgeMode::Reflect,
        }
    }
}

/// Convolve a 2-D image with a kernel, producing an image of the same shape.
///
/// The kernel is applied as correlation (not flipped); all kernels used by
/// the pipeline are symmetric so the distinction does not matter here.
pub fn convolve2d(
    input: &ArrayView2<f32>,
    kernel: &ArrayView2<f32>,
    options: ConvolveOptions,
) -> Array2<f32> {
    let (rows, cols) = input.dim();
    let (krows, kcols) = kernel.dim();
    let kr = krows / 2;
    let kc = kcols / 2;

    let mut output = Array2::zeros((rows, cols));

    let compute = |(i, j): (usize, usize)| -> f32 {
        let mut sum = 0.0;
        for ki in 0..krows {
            for kj in 0..kcols {
                let ii = i as isize + ki as isize - kr as isize;
                let jj = j as isize + kj as isize - kc as isize;
                sum += sample(input, ii, jj, options.edge_mode) * kernel[[ki, kj]];
            }
        }
        sum
    };

    if options.parallel {
        Zip::indexed(&mut output).par_for_each(|idx, out| *out = compute(idx));
    } else {
        Zip::indexed(&mut output).for_each(|idx, out| *out = compute(idx));
    }

    output
}

fn sample(input: &ArrayView2<f32>, i: isize, j: isize, edge_mode: EdgeMode) -> f32 {
    let (rows, cols) = input.dim();
    if i >= 0 && i < rows as isize && j >= 0 && j < cols as isize {
        return input[[i as usize, j as usize]];
    }
    match edge_mode {
        EdgeMode::Constant(value) => value,
        EdgeMode::Reflect => {
            let ri = reflect_index(i, rows as isize);
            let rj = reflect_index(j, cols as isize);
            input[[ri as usize, rj as usize]]
        }
        EdgeMode::Extend => {
            let ei = i.clamp(0, rows as isize - 1);
            let ej = j.clamp(0, cols as isize - 1);
            input[[ei as usize, ej as usize]]
        }
    }
}

fn reflect_index(idx: isize, size: isize) -> isize {
    if size == 1 {
        return 0;
    }
    // The reflected sequence repeats with period 2*size; folding into one
    // period keeps kernels wider than the image in bounds
    let folded = idx.rem_euclid(2 * size);
    if folded < size {
        folded
    } else {
        2 * size - folded - 1
    }
}

/// Build a normalized Gaussian kernel.
///
/// # Arguments
/// * `size` - Kernel side length (must be odd)
/// * `sigma` - Standard deviation of the Gaussian
pub fn gaussian_kernel(size: usize, sigma: f32) -> Array2<f32> {
    assert!(size % 2 == 1, "kernel size must be odd");

    let center = (size / 2) as isize;
    let mut kernel = Array2::zeros((size, size));
    let mut sum = 0.0;

    for i in 0..size {
        for j in 0..size {
            let y = i as isize - center;
            let x = j as isize - center;
            let value = (-((x * x + y * y) as f32) / (2.0 * sigma * sigma)).exp();
            kernel[[i, j]] = value;
            sum += value;
        }
    }

    kernel.mapv_inplace(|v| v / sum);
    kernel
}

/// Standard deviation implied by a kernel size alone.
///
/// Follows the OpenCV convention for a blur requested with zero sigma:
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn auto_sigma(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
