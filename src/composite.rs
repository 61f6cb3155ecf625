//! Composition laws and the comparison triple.
//!
//! Two distinct laws, never interchanged:
//!
//! - [`blend_masked`] is the classical convex blend of an attenuated frame
//!   over the original, weighted by the alpha mask.
//! - [`recombine`] is the separation pipeline's additive recombination of a
//!   starless background with an attenuated star-only frame.

use ndarray::{Array2, ArrayView2};

use crate::error::{ReduceError, ReduceResult};

/// Convex blend: `mask * attenuated + (1 - mask) * original`.
///
/// A zero mask reproduces the original exactly; a unit mask reproduces the
/// attenuated frame. With both inputs in [0, 1] the result stays in [0, 1]
/// without clamping.
pub fn blend_masked(
    original: &ArrayView2<f32>,
    attenuated: &ArrayView2<f32>,
    mask: &ArrayView2<f32>,
) -> ReduceResult<Array2<f32>> {
    check_shapes(original.dim(), attenuated.dim())?;
    check_shapes(original.dim(), mask.dim())?;

    let mut out = Array2::zeros(original.dim());
    ndarray::Zip::from(&mut out)
        .and(original)
        .and(attenuated)
        .and(mask)
        .for_each(|o, &orig, &att, &m| *o = m * att + (1.0 - m) * orig);
    Ok(out)
}

/// Additive recombination: `starless + attenuated_staronly`.
///
/// The separation inputs are complementary decompositions of one source, so
/// their sum reconstructs it; this is deliberately additive, not a convex
/// blend. The sum can overshoot 1.0 near bright star halos and is left
/// unclamped; callers clamp before 8-bit export (see [`crate::export`]).
pub fn recombine(
    starless: &ArrayView2<f32>,
    attenuated_staronly: &ArrayView2<f32>,
) -> ReduceResult<Array2<f32>> {
    check_shapes(starless.dim(), attenuated_staronly.dim())?;

    let mut out = starless.to_owned();
    out.zip_mut_with(attenuated_staronly, |s, &a| *s += a);
    Ok(out)
}

/// Before/after/difference triple for visual inspection of a run.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// The normalized input frame.
    pub before: Array2<f32>,
    /// The composited result.
    pub after: Array2<f32>,
    /// Per-pixel `|before - after|`; non-negative by construction.
    pub difference: Array2<f32>,
}

/// Comparison triple for a separation run, from its three ingredients.
///
/// `before` reconstructs the source (`starless + staronly`), `after` is the
/// delivered composite (`starless + reduced`), and the difference shows
/// exactly what the attenuation removed. Wherever `staronly == reduced` the
/// difference is zero.
pub fn compare_separation(
    starless: &ArrayView2<f32>,
    staronly: &ArrayView2<f32>,
    reduced: &ArrayView2<f32>,
) -> ReduceResult<Comparison> {
    let before = recombine(starless, staronly)?;
    let after = recombine(starless, reduced)?;
    compare(&before.view(), &after.view())
}

/// Build the comparison triple for a finished run.
pub fn compare(before: &ArrayView2<f32>, after: &ArrayView2<f32>) -> ReduceResult<Comparison> {
    check_shapes(before.dim(), after.dim())?;

    let mut difference = before.to_owned();
    difference.zip_mut_with(after, |d, &a| *d = (*d - a).abs());
    Ok(Comparison {
        before: before.to_owned(),
        after: after.to_owned(),
        difference,
    })
}

fn check_shapes(expected: (usize, usize), actual: (usize, usize)) -> ReduceResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ReduceError::ShapeMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn zero_mask_reproduces_the_original() {
        let original = array![[0.2_f32, 0.9], [0.4, 0.1]];
        let attenuated = array![[0.0_f32, 0.0], [0.0, 0.0]];
        let mask = Array2::zeros((2, 2));
        let out = blend_masked(&original.view(), &attenuated.view(), &mask.view()).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn unit_mask_reproduces_the_attenuated_frame() {
        let original = array![[0.2_f32, 0.9]];
        let attenuated = array![[0.05_f32, 0.3]];
        let mask = array![[1.0_f32, 1.0]];
        let out = blend_masked(&original.view(), &attenuated.view(), &mask.view()).unwrap();
        assert_eq!(out, attenuated);
    }

    #[test]
    fn partial_mask_interpolates_linearly() {
        let original = array![[1.0_f32]];
        let attenuated = array![[0.0_f32]];
        let mask = array![[0.25_f32]];
        let out = blend_masked(&original.view(), &attenuated.view(), &mask.view()).unwrap();
        assert_relative_eq!(out[[0, 0]], 0.75);
    }

    #[test]
    fn recombination_is_additive_and_unclamped() {
        let starless = array![[0.8_f32, 0.3]];
        let staronly = array![[0.5_f32, 0.1]];
        let out = recombine(&starless.view(), &staronly.view()).unwrap();
        assert_relative_eq!(out[[0, 0]], 1.3);
        assert_relative_eq!(out[[0, 1]], 0.4);
    }

    #[test]
    fn separation_comparison_is_zero_where_nothing_was_reduced() {
        let starless = array![[0.1_f32, 0.2]];
        let staronly = array![[0.5_f32, 0.0]];
        let reduced = array![[0.5_f32, 0.0]];
        let cmp = compare_separation(&starless.view(), &staronly.view(), &reduced.view()).unwrap();
        assert!(cmp.difference.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn comparison_difference_is_absolute() {
        let before = array![[0.2_f32, 0.9]];
        let after = array![[0.5_f32, 0.4]];
        let cmp = compare(&before.view(), &after.view()).unwrap();
        assert_relative_eq!(cmp.difference[[0, 0]], 0.3);
        assert_relative_eq!(cmp.difference[[0, 1]], 0.5);
        assert!(cmp.difference.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Array2::<f32>::zeros((2, 2));
        let b = Array2::<f32>::zeros((2, 3));
        assert!(compare(&a.view(), &b.view()).is_err());
        assert!(recombine(&a.view(), &b.view()).is_err());
    }
}
