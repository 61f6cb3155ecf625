//! Synthetic star field generation for pipeline validation.
//!
//! Real captures are awkward test fixtures; these generators build frames
//! with known star positions, widths, and noise levels so detection and
//! reduction behavior can be asserted exactly.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Add a 2-D Gaussian star profile to an image in place.
///
/// # Arguments
/// * `image` - Frame to draw into
/// * `row` / `col` - Sub-pixel star center
/// * `amplitude` - Peak brightness added at the center
/// * `sigma` - Gaussian width in pixels
pub fn add_gaussian_star(image: &mut Array2<f32>, row: f32, col: f32, amplitude: f32, sigma: f32) {
    let (rows, cols) = image.dim();
    let two_sigma_sq = 2.0 * sigma * sigma;
    // Beyond 4 sigma the profile is negligible
    let reach = (4.0 * sigma).ceil() as isize;

    let r0 = ((row.floor() as isize) - reach).max(0);
    let r1 = ((row.ceil() as isize) + reach).min(rows as isize - 1);
    let c0 = ((col.floor() as isize) - reach).max(0);
    let c1 = ((col.ceil() as isize) + reach).min(cols as isize - 1);

    for i in r0..=r1 {
        for j in c0..=c1 {
            let dr = i as f32 - row;
            let dc = j as f32 - col;
            let value = amplitude * (-(dr * dr + dc * dc) / two_sigma_sq).exp();
            image[[i as usize, j as usize]] += value;
        }
    }
}

/// Fill a hard-edged disk with `value`, in place.
///
/// Useful as a star-only stand-in when a pipeline test needs a saturated
/// region with a known extent rather than a Gaussian profile.
pub fn add_disk(image: &mut Array2<f32>, row: usize, col: usize, radius: usize, value: f32) {
    let (rows, cols) = image.dim();
    let r = radius as isize;
    for dy in -r..=r {
        for dx in -r..=r {
            if dy * dy + dx * dx > r * r {
                continue;
            }
            let i = row as isize + dy;
            let j = col as isize + dx;
            if i >= 0 && i < rows as isize && j >= 0 && j < cols as isize {
                image[[i as usize, j as usize]] = value;
            }
        }
    }
}

/// Add seeded uniform noise in `[0, amplitude)` to an image in place.
pub fn add_uniform_noise(image: &mut Array2<f32>, amplitude: f32, seed: u64) {
    if amplitude <= 0.0 {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for value in image.iter_mut() {
        *value += rng.random_range(0.0..amplitude);
    }
}

/// Build a complete synthetic star field.
///
/// # Arguments
/// * `rows` / `cols` - Frame dimensions
/// * `stars` - `(row, col, amplitude)` per star
/// * `sigma` - Shared Gaussian width for all stars
/// * `noise_amplitude` - Uniform noise level (0 for a noiseless frame)
/// * `seed` - Noise RNG seed for reproducibility
pub fn synthetic_star_field(
    rows: usize,
    cols: usize,
    stars: &[(f32, f32, f32)],
    sigma: f32,
    noise_amplitude: f32,
    seed: u64,
) -> Array2<f32> {
    let mut image = Array2::zeros((rows, cols));
    add_uniform_noise(&mut image, noise_amplitude, seed);
    for &(row, col, amplitude) in stars {
        add_gaussian_star(&mut image, row, col, amplitude, sigma);
    }
    image
}
