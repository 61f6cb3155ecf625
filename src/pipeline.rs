//! Pipeline orchestration: the two named reduction pipelines and the
//! session state machine that sequences them.
//!
//! Both pipelines are synchronous, recompute everything from the loaded
//! source on every run, and either deliver a complete [`PipelineResult`] or
//! fail with a single tagged [`ReduceError`](crate::error::ReduceError),
//! never a partial result.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attenuate::{attenuate_staronly, erode_stars};
use crate::composite::{blend_masked, compare, compare_separation, recombine, Comparison};
use crate::detect::StarDetector;
use crate::error::{ReduceError, ReduceResult};
use crate::frame::RawFrame;
use crate::mask::{feather, mask_from_catalog, mask_from_staronly};
use crate::params::{MaskGrowth, ReductionParams};

/// Which of the two reduction pipelines to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineKind {
    /// Detect stars, mask disks, blend an eroded frame over them.
    Classical,
    /// Consume a starless / star-only pair, attenuate, recombine.
    Separation,
}

/// Reduction session states.
///
/// Runs are synchronous, so intermediate states are only ever observed from
/// within the run itself; externally a session is between runs (`Idle`,
/// `Loaded`, `PairLoaded`), finished (`Composited`), or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No source loaded.
    Idle,
    /// A single frame is loaded for the classical pipeline.
    Loaded,
    /// A starless / star-only pair is loaded for the separation pipeline.
    PairLoaded,
    /// Running: star detection.
    Detecting,
    /// Running: mask construction and feathering.
    Masking,
    /// Running: star attenuation.
    Attenuating,
    /// The last run delivered a result.
    Composited,
    /// The last run failed; the previous result (if any) is unchanged.
    Failed,
}

/// Externally produced starless / star-only decomposition of one source.
#[derive(Debug, Clone)]
pub struct SeparationPair {
    /// Background with stars removed.
    pub starless: Array2<f32>,
    /// The removed star light, same shape as `starless`.
    pub staronly: Array2<f32>,
}

impl SeparationPair {
    /// Pair the two halves, rejecting mismatched shapes.
    pub fn new(starless: Array2<f32>, staronly: Array2<f32>) -> ReduceResult<Self> {
        if starless.dim() != staronly.dim() {
            return Err(ReduceError::ShapeMismatch {
                expected: starless.dim(),
                actual: staronly.dim(),
            });
        }
        Ok(Self { starless, staronly })
    }
}

/// Everything a finished run delivers.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The composited grayscale frame.
    pub composite: Array2<f32>,
    /// Catalog length from detection; 0 for the separation pipeline, which
    /// never consults a detector.
    pub star_count: usize,
    /// Before/after/difference triple for inspection.
    pub comparison: Comparison,
}

/// Run the classical pipeline: normalize, detect, mask, feather, erode,
/// blend.
///
/// An empty catalog is a valid outcome: the mask stays all-zero and the
/// composite equals the normalized grayscale source exactly.
pub fn run_classical(
    frame: &RawFrame,
    params: &ReductionParams,
    detector: &dyn StarDetector,
) -> ReduceResult<PipelineResult> {
    params.validate()?;

    let gray = frame.data.normalized().to_grayscale();
    let stars = detector.detect(&gray.view(), &frame.meta, params)?;
    debug!(stars = stars.len(), "detection complete");

    let binary = mask_from_catalog(gray.dim(), &stars, params.mask_radius);
    let soft = feather(
        &binary.view(),
        MaskGrowth::Grow,
        params.dilate_kernel,
        1,
        params.gaussian_kernel,
    );

    let eroded = erode_stars(&gray.view(), params);
    let composite = blend_masked(&gray.view(), &eroded.view(), &soft.view())?;
    let comparison = compare(&gray.view(), &composite.view())?;

    info!(stars = stars.len(), "classical reduction complete");
    Ok(PipelineResult {
        composite,
        star_count: stars.len(),
        comparison,
    })
}

/// Run the separation pipeline: threshold the star-only frame into a mask,
/// feather, attenuate, additively recombine with the starless frame.
pub fn run_separation(
    pair: &SeparationPair,
    params: &ReductionParams,
) -> ReduceResult<PipelineResult> {
    params.validate()?;
    if pair.starless.dim() != pair.staronly.dim() {
        return Err(ReduceError::ShapeMismatch {
            expected: pair.starless.dim(),
            actual: pair.staronly.dim(),
        });
    }

    let binary = mask_from_staronly(&pair.staronly.view(), params.staronly_threshold);
    let soft = feather(
        &binary.view(),
        params.mask_growth,
        params.dilate_kernel,
        1,
        params.gaussian_kernel,
    );

    let reduced = attenuate_staronly(&pair.staronly.view(), &soft.view(), params.alpha())?;
    let composite = recombine(&pair.starless.view(), &reduced.view())?;
    let comparison = compare_separation(
        &pair.starless.view(),
        &pair.staronly.view(),
        &reduced.view(),
    )?;

    info!(alpha = params.alpha(), "separation reduction complete");
    Ok(PipelineResult {
        composite,
        star_count: 0,
        comparison,
    })
}

/// A reduction session: the explicit record of what a caller (typically a
/// UI) has loaded and configured, plus the state machine over runs.
///
/// Parameters and sources are plain values; nothing is cached between runs,
/// so a parameter change simply means running again.
pub struct Session {
    params: ReductionParams,
    frame: Option<RawFrame>,
    pair: Option<SeparationPair>,
    state: SessionState,
}

impl Session {
    /// New session with validated parameters and nothing loaded.
    pub fn new(params: ReductionParams) -> ReduceResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            frame: None,
            pair: None,
            state: SessionState::Idle,
        })
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current parameters.
    pub fn params(&self) -> &ReductionParams {
        &self.params
    }

    /// Replace the parameter set; rejected values leave the old set intact.
    pub fn set_params(&mut self, params: ReductionParams) -> ReduceResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Load a source frame for the classical pipeline.
    pub fn load_frame(&mut self, frame: RawFrame) {
        self.frame = Some(frame);
        self.state = SessionState::Loaded;
    }

    /// Load a starless / star-only pair for the separation pipeline.
    pub fn load_pair(&mut self, pair: SeparationPair) {
        self.pair = Some(pair);
        self.state = SessionState::PairLoaded;
    }

    /// Run the requested pipeline against the loaded source.
    ///
    /// Fails with `SourceUnavailable` when the matching source kind is not
    /// loaded. On failure the session lands in `Failed`; the source stays
    /// loaded, so fixing the parameters and re-running is enough to recover.
    pub fn run(
        &mut self,
        kind: PipelineKind,
        detector: &dyn StarDetector,
    ) -> ReduceResult<PipelineResult> {
        let result = match kind {
            PipelineKind::Classical => self.classical_steps(detector),
            PipelineKind::Separation => self.separation_steps(),
        };

        match result {
            Ok(result) => {
                self.state = SessionState::Composited;
                Ok(result)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    fn classical_steps(&mut self, detector: &dyn StarDetector) -> ReduceResult<PipelineResult> {
        // Grayscale and metadata are extracted up front so the state field
        // can advance without the frame borrow pinning the session
        let (gray, meta) = {
            let frame = self.frame.as_ref().ok_or(ReduceError::SourceUnavailable)?;
            (frame.data.normalized().to_grayscale(), frame.meta.clone())
        };

        self.state = SessionState::Detecting;
        let stars = detector.detect(&gray.view(), &meta, &self.params)?;

        self.state = SessionState::Masking;
        let binary = mask_from_catalog(gray.dim(), &stars, self.params.mask_radius);
        let soft = feather(
            &binary.view(),
            MaskGrowth::Grow,
            self.params.dilate_kernel,
            1,
            self.params.gaussian_kernel,
        );

        self.state = SessionState::Attenuating;
        let eroded = erode_stars(&gray.view(), &self.params);
        let composite = blend_masked(&gray.view(), &eroded.view(), &soft.view())?;
        let comparison = compare(&gray.view(), &composite.view())?;

        Ok(PipelineResult {
            composite,
            star_count: stars.len(),
            comparison,
        })
    }

    fn separation_steps(&mut self) -> ReduceResult<PipelineResult> {
        self.state = SessionState::Masking;
        let pair = self.pair.as_ref().ok_or(ReduceError::SourceUnavailable)?;
        run_separation(pair, &self.params)
    }
}
