//! # destar
//!
//! Star reduction pipeline for astronomical images.
//!
//! Reduces the visual prominence of stars in a raw sensor capture while
//! preserving background structure (nebulae, galaxies). Two pipelines share
//! one orchestrator:
//!
//! - **Classical**: detect stars statistically, paint a disk mask around each
//!   centroid, feather the mask, and blend a morphologically eroded rendition
//!   of the frame over the masked regions.
//! - **Separation**: consume an externally produced starless / star-only pair,
//!   threshold the star-only frame into a mask, attenuate the star-only frame
//!   inside the feathered mask, and additively recombine with the starless
//!   frame.
//!
//! # Module Organization
//!
//! - **frame**: raw frame container, [0,1] normalization, grayscale reduction
//! - **detect**: star detectors (statistical and remote plate-solving) behind
//!   one [`StarDetector`](detect::StarDetector) interface
//! - **mask**: binary star masks (point and threshold modes) and feathering
//! - **morphology** / **convolve**: flat-kernel erosion/dilation and Gaussian
//!   smoothing primitives
//! - **attenuate** / **composite**: the two attenuation and composition laws
//! - **pipeline**: the run orchestrator and session state
//! - **scheduler**: debounce gate that coalesces parameter changes into runs
//! - **export**: 8-bit PNG export of result artifacts
//! - **test_patterns**: synthetic star fields for validation

pub mod attenuate;
pub mod composite;
pub mod convolve;
pub mod detect;
pub mod error;
pub mod export;
pub mod frame;
pub mod mask;
pub mod morphology;
pub mod params;
pub mod pipeline;
pub mod scheduler;
pub mod test_patterns;

pub use attenuate::{attenuate_staronly, erode_stars};
pub use composite::{blend_masked, compare, compare_separation, recombine, Comparison};
pub use detect::{
    DetectionError, DetectorKind, PlateSolveClient, RemoteDetector, SolvedSource, Star,
    StarDetector, StatisticalDetector,
};
pub use error::{ReduceError, ReduceResult};
pub use frame::{normalize, FrameData, FrameMeta, RawFrame};
pub use mask::{feather, mask_from_catalog, mask_from_staronly};
pub use params::{MaskGrowth, ReductionParams};
pub use pipeline::{
    run_classical, run_separation, PipelineKind, PipelineResult, SeparationPair, Session,
    SessionState,
};
pub use scheduler::RecomputeScheduler;
