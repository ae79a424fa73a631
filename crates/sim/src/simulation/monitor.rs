//! Cancellation and progress hooks for long runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Observer polled by every worker.
///
/// `cancel_requested` is checked once per simulated step; a `true` answer
/// stops the run and no output is produced. `step_finished` fires after every
/// recorded-phase step and `replicate_finished` once per completed replicate,
/// both from whichever worker ran the replicate.
pub trait RunMonitor: Sync {
    fn cancel_requested(&self) -> bool {
        false
    }

    fn step_finished(&self, _rep: usize, _t: usize) {}

    fn replicate_finished(&self, _rep: usize) {}
}

/// A monitor that never cancels and ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMonitor;

impl RunMonitor for NoMonitor {}

/// Shared cancellation flag that also counts finished replicates.
///
/// Clones share state, so one clone can be handed to a signal handler or UI
/// thread while another drives the run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicUsize>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the run stop at the next step boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Replicates completed so far.
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }
}

impl RunMonitor for CancelFlag {
    fn cancel_requested(&self) -> bool {
        self.is_cancelled()
    }

    fn replicate_finished(&self, _rep: usize) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }
}
