//! Star attenuation: the two ways star light is dimmed before compositing.
//!
//! The classical pipeline shrinks stars morphologically and lets the
//! compositor blend the eroded frame back in. The separation pipeline scales
//! the star-only frame down inside the feathered mask instead, leaving the
//! starless background untouched.

use ndarray::{Array2, ArrayView2};

use crate::error::{ReduceError, ReduceResult};
use crate::morphology::erode;
use crate::params::ReductionParams;

/// Classical attenuation: repeated grayscale erosion of the whole frame.
///
/// Star cores are local maxima, so each erosion pass replaces them with
/// nearby fainter pixels; extended structure is mostly flat at the kernel
/// scale and survives. The compositor confines the effect to masked regions.
pub fn erode_stars(image: &ArrayView2<f32>, params: &ReductionParams) -> Array2<f32> {
    erode(image, params.erode_kernel, params.erosion_iterations)
}

/// Separation attenuation: scale the star-only frame inside the mask.
///
/// Each pixel becomes `staronly * (1 - alpha * mask)`. With a feathered mask
/// in [0, 1] and alpha in [0, 1] the factor stays in [0, 1], so attenuation
/// only ever dims. Alpha 0 is the identity; alpha 1 with a fully opaque mask
/// removes the star light entirely.
pub fn attenuate_staronly(
    staronly: &ArrayView2<f32>,
    mask: &ArrayView2<f32>,
    alpha: f32,
) -> ReduceResult<Array2<f32>> {
    if staronly.dim() != mask.dim() {
        return Err(ReduceError::ShapeMismatch {
            expected: staronly.dim(),
            actual: mask.dim(),
        });
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = staronly.to_owned();
    out.zip_mut_with(mask, |s, &m| *s *= 1.0 - alpha * m);
    Ok(out)
}
