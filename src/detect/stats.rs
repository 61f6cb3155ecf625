//! Sigma-clipped background statistics.
//!
//! Stars contaminate plain image statistics; iterative sigma clipping rejects
//! them so the surviving mean/median/standard deviation describe the sky
//! background alone.

use ndarray::ArrayView2;

/// Background statistics after iterative sigma clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedStats {
    /// Mean of the surviving pixels.
    pub mean: f32,
    /// Median of the surviving pixels (robust background level).
    pub median: f32,
    /// Standard deviation of the surviving pixels (background noise).
    pub std_dev: f32,
}

fn median_of_sorted(sorted: &[f32]) -> f32 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn mean_and_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    let mean = sum / n;
    let var: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    (mean as f32, var.sqrt() as f32)
}

/// Compute mean, median, and standard deviation with iterative sigma clipping.
///
/// Each round discards pixels further than `clip_sigma` standard deviations
/// from the current median; iteration stops when the set stabilizes, the
/// spread collapses, or `max_iterations` rounds have run. Non-finite pixels
/// are excluded up front.
pub fn sigma_clipped_stats(
    image: &ArrayView2<f32>,
    clip_sigma: f32,
    max_iterations: usize,
) -> ClippedStats {
    let mut values: Vec<f32> = image.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return ClippedStats {
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
        };
    }

    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    for _ in 0..max_iterations {
        let median = median_of_sorted(&values);
        let (_, std_dev) = mean_and_std(&values);
        if std_dev <= f32::EPSILON {
            break;
        }

        let lo = median - clip_sigma * std_dev;
        let hi = median + clip_sigma * std_dev;
        let before = values.len();
        values.retain(|&v| v >= lo && v <= hi);
        if values.len() == before {
            break;
        }
    }

    let (mean, std_dev) = mean_and_std(&values);
    ClippedStats {
        mean,
        median: median_of_sorted(&values),
        std_dev,
    }
}
