//! Remote plate-solving detection.
//!
//! The actual solve runs behind the [`PlateSolveClient`] trait so the
//! pipeline never blocks on network details it cannot control. The detector
//! runs the client call on a worker thread and waits up to a configured
//! timeout; a solve that is too slow is reported as
//! [`DetectionError::Timeout`] and its worker is abandoned (there is no
//! cancellation path into a remote service).

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use ndarray::{Array2, ArrayView2};
use tracing::{debug, warn};

use super::{DetectionError, Star, StarDetector};
use crate::frame::FrameMeta;
use crate::params::ReductionParams;

/// One source reported by the solving service, already converted to image
/// pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolvedSource {
    /// Column position, sub-pixel.
    pub x: f32,
    /// Row position, sub-pixel.
    pub y: f32,
    /// Source brightness as reported by the service.
    pub flux: f32,
}

/// Transport to a plate-solving service.
///
/// `hints` is the source frame's metadata; implementations may forward
/// whatever keys the service understands (pixel scale, approximate pointing)
/// and ignore the rest.
pub trait PlateSolveClient: Send + Sync {
    fn solve(
        &self,
        image: &Array2<f32>,
        hints: &FrameMeta,
    ) -> Result<Vec<SolvedSource>, DetectionError>;
}

/// Detector that defers to a remote plate-solving service with a deadline.
pub struct RemoteDetector {
    client: Arc<dyn PlateSolveClient>,
    timeout: Duration,
}

impl RemoteDetector {
    pub fn new(client: Arc<dyn PlateSolveClient>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl StarDetector for RemoteDetector {
    fn detect(
        &self,
        image: &ArrayView2<f32>,
        meta: &FrameMeta,
        _params: &ReductionParams,
    ) -> Result<Vec<Star>, DetectionError> {
        let (tx, rx) = bounded(1);
        let client = Arc::clone(&self.client);
        let owned_image = image.to_owned();
        let owned_meta = meta.clone();

        thread::Builder::new()
            .name("plate-solve".to_string())
            .spawn(move || {
                let result = client.solve(&owned_image, &owned_meta);
                // Receiver may already have timed out and gone away
                let _ = tx.send(result);
            })
            .map_err(|e| DetectionError::Service(format!("failed to spawn solve worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(sources)) => {
                debug!(sources = sources.len(), "plate solve completed");
                Ok(sources
                    .into_iter()
                    .map(|s| Star {
                        x: s.x,
                        y: s.y,
                        flux: s.flux,
                    })
                    .collect())
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?self.timeout, "plate solve timed out, abandoning worker");
                Err(DetectionError::Timeout {
                    waited: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(DetectionError::Service(
                "plate solve worker exited without a result".to_string(),
            )),
        }
    }
}
