//! CancellationController - run-wide abort signal

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Shared, monotonic cancellation signal for one dispatch run
///
/// Cheap to clone; every clone observes the same state. Tripping is
/// idempotent and there is no way to reset it.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    token: CancellationToken,
    tripped: Arc<AtomicBool>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the controller
    ///
    /// Returns `true` only for the call that actually tripped it.
    pub fn trip(&self) -> bool {
        let first = !self.tripped.swap(true, Ordering::AcqRel);
        self.token.cancel();
        first
    }

    /// Whether the controller has been tripped
    pub fn is_tripped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the controller is tripped
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
