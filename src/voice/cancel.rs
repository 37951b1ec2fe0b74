//! Per-utterance cancellation flags
//!
//! A cancel must only ever hit the utterance that was current when it fired.
//! Each utterance begins with a fresh flag and the superseded flag stays set
//! forever, so a blocking playback or capture loop still polling an old flag
//! cannot be revived when the next utterance starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out one cancellation flag per utterance
pub(crate) struct CancelSource {
    current: Mutex<Arc<AtomicBool>>,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    pub(crate) fn new() -> Self {
        Self {
            current: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Begin a new utterance, superseding the previous one
    ///
    /// The previous flag is cancelled and never reused; the returned flag is
    /// observed by exactly one utterance.
    pub(crate) fn begin(&self) -> Arc<AtomicBool> {
        let fresh = Arc::new(AtomicBool::new(false));
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.store(true, Ordering::SeqCst);
        *current = Arc::clone(&fresh);
        fresh
    }

    /// Cancel whichever utterance is current right now
    pub(crate) fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .store(true, Ordering::SeqCst);
    }
}
