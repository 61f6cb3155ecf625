//! Star detection behind one detector-agnostic interface.
//!
//! Two implementations are selectable by configuration:
//!
//! - **statistical**: sigma-clipped background statistics, matched filtering
//!   at the expected star width, and connected-component centroiding,
//!   everything running locally.
//! - **remote**: hands the frame to an external plate-solving capability and
//!   converts its reported source positions, under a caller-specified
//!   timeout.
//!
//! Both normalize their output to the common [`Star`] record so downstream
//! mask construction never knows which detector ran. An empty catalog is a
//! valid outcome, distinct from [`DetectionError`].

pub mod remote;
pub mod segment;
pub mod statistical;
pub mod stats;

pub use remote::{PlateSolveClient, RemoteDetector, SolvedSource};
pub use statistical::StatisticalDetector;
pub use stats::{sigma_clipped_stats, ClippedStats};

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::frame::FrameMeta;
use crate::params::ReductionParams;

/// A detected star: sub-pixel centroid in image coordinates (origin top-left).
///
/// `flux` is detector-specific and unused by mask construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Star {
    /// Centroid x-coordinate (column), sub-pixel.
    pub x: f32,
    /// Centroid y-coordinate (row), sub-pixel.
    pub y: f32,
    /// Total source intensity as reported by the detector.
    pub flux: f32,
}

/// Detector failures, distinct from the valid zero-star outcome.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// The detector or its backing service reported an error.
    #[error("detection service error: {0}")]
    Service(String),

    /// The remote solve did not complete within the configured timeout.
    #[error("plate solving timed out after {waited:?}")]
    Timeout {
        /// How long the caller waited before giving up.
        waited: Duration,
    },
}

/// Star detection capability.
///
/// `meta` carries the source frame's metadata; the remote detector forwards
/// it to the solving service as solve hints, the statistical detector ignores
/// it.
pub trait StarDetector {
    /// Detect stars in a grayscale image.
    ///
    /// Returns an empty catalog when no stars are found; `Err` is reserved
    /// for detector failures.
    fn detect(
        &self,
        image: &ArrayView2<f32>,
        meta: &FrameMeta,
        params: &ReductionParams,
    ) -> Result<Vec<Star>, DetectionError>;
}

/// Detector selection tag for configuration surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Local sigma-clipped statistical detection.
    Statistical,
    /// Remote plate-solving service.
    Remote,
}

impl std::str::FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "statistical" => Ok(DetectorKind::Statistical),
            "remote" => Ok(DetectorKind::Remote),
            _ => Err(format!(
                "Unknown detector: {s}. Valid options: statistical, remote"
            )),
        }
    }
}
