//! Progress reporting contract

use std::sync::{Arc, Mutex, PoisonError};

/// Receives one event per processed result
pub trait ProgressReporter: Send {
    /// Advance by one unit and display the running failure count
    fn advance(&mut self, failed: u64);

    /// Called once after the last result
    fn finish(&mut self) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn advance(&mut self, _failed: u64) {}
}

/// Reporter that records every event in memory
///
/// Clones share the same event log.
#[derive(Debug, Default, Clone)]
pub struct ProgressRecorder {
    events: Arc<Mutex<Vec<u64>>>,
    finished: Arc<Mutex<bool>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure count carried by each advance, in order
    pub fn events(&self) -> Vec<u64> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of advances seen
    pub fn advances(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressReporter for ProgressRecorder {
    fn advance(&mut self, failed: u64) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failed);
    }

    fn finish(&mut self) {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }
}
