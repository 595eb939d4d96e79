//! Cooperative cancellation for in-flight transfers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "may continue" flag.
///
/// Every clone observes the same flag. The transport polls it around
/// each blocking read; clearing it makes the transfer fail with a
/// connection error instead of returning a short buffer.
#[derive(Debug, Clone)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// A new flag in the "may continue" state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn may_continue(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Ask every transfer observing this flag to stop.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Re-arm the flag before starting a new transfer.
    pub fn resume(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}
