//! Single-slot mutual exclusion for background removal runs
//!
//! Only one removal run may be in flight per [`ProcessingSlot`]. The slot is
//! acquired before any work begins (including the model load) and released
//! when the returned [`ProcessingGuard`] is dropped, so the busy flag is
//! accurate across every exit path, panics included.

use crate::error::{RemovalError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared busy flag guarding a single processing slot
///
/// Cloning the slot shares the underlying flag. Acquisition is atomic, so
/// two concurrent callers cannot both enter: the loser receives
/// [`RemovalError::Busy`] instead of queueing.
#[derive(Debug, Clone)]
pub struct ProcessingSlot {
    busy: Arc<AtomicBool>,
}

impl ProcessingSlot {
    /// Create an idle slot
    #[must_use]
    pub fn new() -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Try to claim the slot for a single run
    ///
    /// # Errors
    /// Returns [`RemovalError::Busy`] when another run currently holds the
    /// slot.
    pub fn try_acquire(&self) -> Result<ProcessingGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RemovalError::Busy)?;

        Ok(ProcessingGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Whether a run currently holds the slot
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Default for ProcessingSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII handle proving ownership of the processing slot
///
/// Dropping the guard releases the slot.
#[derive(Debug)]
pub struct ProcessingGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
