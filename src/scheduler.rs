//! Debounced recompute scheduling.
//!
//! Interactive callers change parameters in bursts (a slider drag is dozens
//! of updates per second); running the pipeline for each one wastes work and
//! shows stale intermediates. The scheduler coalesces a burst into a single
//! run: a request only fires after a quiescence window passes with no newer
//! request, and a request arriving while one is pending supersedes it.
//!
//! Requests that arrive while a run is in flight are coalesced the same way
//! and fire one follow-up run after the current one completes; there is no
//! cancellation of an in-flight run.

use std::mem;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use crate::params::ReductionParams;

/// Default quiescence window for interactive parameter changes.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(200);

/// Debounce gate that coalesces parameter-change requests into pipeline
/// runs on a dedicated worker thread.
///
/// `request` never blocks. Each run receives the newest parameter set seen
/// at fire time; intermediate sets from the same burst are dropped. Dropping
/// the scheduler shuts the worker down after any in-flight run finishes;
/// a still-pending (not yet fired) request is discarded.
pub struct RecomputeScheduler {
    sender: Sender<ReductionParams>,
    worker: Option<JoinHandle<()>>,
}

impl RecomputeScheduler {
    /// Start the worker with the given quiescence window.
    ///
    /// `run` is invoked once per debounced burst with the latest parameters.
    pub fn new<F>(quiescence: Duration, run: F) -> Self
    where
        F: FnMut(ReductionParams) + Send + 'static,
    {
        let (sender, receiver) = unbounded::<ReductionParams>();
        let worker = std::thread::spawn(move || worker_loop(receiver, quiescence, run));
        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Start the worker with the default 200 ms quiescence window.
    pub fn with_default_quiescence<F>(run: F) -> Self
    where
        F: FnMut(ReductionParams) + Send + 'static,
    {
        Self::new(DEFAULT_QUIESCENCE, run)
    }

    /// Request a recompute with `params`, superseding any pending request.
    pub fn request(&self, params: ReductionParams) {
        // Worker only exits when the sender is dropped, so this cannot fail
        // while `self` is alive
        let _ = self.sender.send(params);
    }
}

impl Drop for RecomputeScheduler {
    fn drop(&mut self) {
        let (replacement, _) = unbounded();
        mem::drop(mem::replace(&mut self.sender, replacement));
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop<F>(receiver: Receiver<ReductionParams>, quiescence: Duration, mut run: F)
where
    F: FnMut(ReductionParams),
{
    info!(quiescence = ?quiescence, "recompute scheduler started");
    while let Ok(mut latest) = receiver.recv() {
        // Debounce: keep superseding until the channel stays quiet for a
        // full quiescence window
        let mut superseded = 0usize;
        loop {
            match receiver.recv_timeout(quiescence) {
                Ok(params) => {
                    latest = params;
                    superseded += 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                // Shutdown discards the pending request
                Err(RecvTimeoutError::Disconnected) => {
                    info!("recompute scheduler shutting down with a request pending");
                    return;
                }
            }
        }
        debug!(superseded, "quiescence reached, firing run");
        run(latest);
    }
    info!("recompute scheduler shut down");
}
