//! Per-call cancellation and deadline signal
//!
//! Long-running operations take a [`CallContext`] and poll [`CallContext::check`]
//! at their own checkpoints. Nothing is interrupted implicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Why a call stopped before completing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request is canceled")]
    Canceled,

    #[error("deadline is exceeded")]
    DeadlineExceeded,
}

/// Cancellation flag plus optional deadline, shared by clones
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    canceled: Arc<AtomicBool>,
}

impl CallContext {
    /// A context that never expires on its own
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Mark the call as canceled. Visible to every clone.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Checkpoint: `Err` once the call is canceled or past its deadline.
    ///
    /// Explicit cancellation wins when both apply.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_canceled() {
            return Err(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
