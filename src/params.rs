//! Pipeline parameter record with range validation.

use serde::{Deserialize, Serialize};

use crate::error::{ReduceError, ReduceResult};

/// Direction of the morphological step applied to the mask before blurring.
///
/// The classical pipeline always widens the mask so the blend transitions
/// outside the star edge. The separation pipeline defaults to widening as
/// well, but can tighten instead when the thresholded star-only mask already
/// overshoots the stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskGrowth {
    /// Dilate the mask before blurring.
    #[default]
    Grow,
    /// Erode the mask before blurring.
    Shrink,
}

/// Immutable parameter record for one pipeline run.
///
/// Out-of-range values are rejected by [`ReductionParams::validate`], not
/// clamped. The single documented exception is `attenuation_alpha`, which is
/// clamped to [0, 1] by design (see [`ReductionParams::alpha`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionParams {
    /// Star width estimate in pixels (full width at half maximum).
    pub fwhm: f32,
    /// Detection threshold as a multiple of the background noise sigma.
    pub detection_threshold: f32,
    /// Outlier-clipping sigma for background statistics.
    pub background_sigma: f32,
    /// Disk radius in pixels for point-mode masks; 0 marks the centroid pixel only.
    pub mask_radius: usize,
    /// Square kernel side for the mask dilation / erosion step.
    pub dilate_kernel: usize,
    /// Square kernel side for the mask Gaussian blur; must be odd.
    pub gaussian_kernel: usize,
    /// Square kernel side for the classical image erosion.
    pub erode_kernel: usize,
    /// Number of erosion passes over the image in the classical pipeline.
    pub erosion_iterations: usize,
    /// Attenuation strength in [0, 1]: 0 = no reduction, 1 = full removal.
    pub attenuation_alpha: f32,
    /// Intensity threshold on the normalized star-only frame (separation mask).
    pub staronly_threshold: f32,
    /// Morphological direction for the separation pipeline's mask feathering.
    pub mask_growth: MaskGrowth,
}

impl Default for ReductionParams {
    fn default() -> Self {
        Self {
            fwhm: 4.0,
            detection_threshold: 5.0,
            background_sigma: 3.0,
            mask_radius: 6,
            dilate_kernel: 3,
            gaussian_kernel: 3,
            erode_kernel: 2,
            erosion_iterations: 3,
            attenuation_alpha: 0.5,
            staronly_threshold: 0.02,
            mask_growth: MaskGrowth::Grow,
        }
    }
}

fn check_f32(name: &'static str, value: f32, min: f32, max: f32) -> ReduceResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ReduceError::ParameterOutOfRange {
            name,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

fn check_usize(name: &'static str, value: usize, min: usize, max: usize) -> ReduceResult<()> {
    if value < min || value > max {
        return Err(ReduceError::ParameterOutOfRange {
            name,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(())
}

impl ReductionParams {
    /// Check every field against its fixed valid range.
    ///
    /// `attenuation_alpha` is exempt: it is clamped at the point of use
    /// rather than rejected.
    pub fn validate(&self) -> ReduceResult<()> {
        check_f32("fwhm", self.fwhm, 0.5, 50.0)?;
        check_f32("detection_threshold", self.detection_threshold, 0.1, 1e6)?;
        check_f32("background_sigma", self.background_sigma, 1.0, 10.0)?;
        check_usize("mask_radius", self.mask_radius, 0, 64)?;
        check_usize("dilate_kernel", self.dilate_kernel, 1, 31)?;
        check_usize("gaussian_kernel", self.gaussian_kernel, 1, 31)?;
        if self.gaussian_kernel % 2 == 0 {
            return Err(ReduceError::ParameterNotOdd {
                name: "gaussian_kernel",
                value: self.gaussian_kernel,
            });
        }
        check_usize("erode_kernel", self.erode_kernel, 1, 31)?;
        check_usize("erosion_iterations", self.erosion_iterations, 1, 50)?;
        check_f32("staronly_threshold", self.staronly_threshold, 0.0, 1.0)?;
        Ok(())
    }

    /// Attenuation strength clamped to [0, 1].
    pub fn alpha(&self) -> f32 {
        self.attenuation_alpha.clamp(0.0, 1.0)
    }
}
