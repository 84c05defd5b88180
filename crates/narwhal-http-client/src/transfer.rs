//! Transfer control: progress reporting, suspend/resume and cancellation

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::error::HttpError;

/// Download progress of a single transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes received so far
    pub completed: u64,
    /// Expected body size, when the server announced one
    pub total: Option<u64>,
}

impl Progress {
    /// Fraction of the body received, in `0.0..=1.0`
    ///
    /// Returns `None` while the total size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.completed as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Lifecycle state of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Transfer proceeds
    Running,
    /// Transfer waits at the next checkpoint until resumed
    Suspended,
    /// Transfer ends with [`HttpError::Cancelled`] at the next checkpoint
    Cancelled,
}

type ProgressFn = Arc<dyn Fn(Progress) + Send + Sync>;

/// Shared handle controlling an in-flight transfer
///
/// Clones refer to the same transfer. The sending side checks the state before
/// the request goes out and between body chunks.
#[derive(Clone)]
pub struct TransferControl {
    state: Arc<watch::Sender<TransferState>>,
    progress: Arc<Mutex<Option<ProgressFn>>>,
}

impl fmt::Debug for TransferControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferControl")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Default for TransferControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferControl {
    /// Create a control in the [`TransferState::Running`] state
    pub fn new() -> Self {
        let (state, _) = watch::channel(TransferState::Running);
        Self {
            state: Arc::new(state),
            progress: Arc::new(Mutex::new(None)),
        }
    }

    /// Current state
    pub fn state(&self) -> TransferState {
        *self.state.borrow()
    }

    /// Register the progress observer, replacing any previous one
    pub fn on_progress<F>(&self, observer: F)
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        if let Ok(mut slot) = self.progress.lock() {
            *slot = Some(Arc::new(observer));
        }
    }

    /// Pause the transfer at its next checkpoint
    pub fn suspend(&self) {
        self.state.send_if_modified(|state| {
            if *state == TransferState::Running {
                *state = TransferState::Suspended;
                true
            } else {
                false
            }
        });
    }

    /// Continue a suspended transfer
    pub fn resume(&self) {
        self.state.send_if_modified(|state| {
            if *state == TransferState::Suspended {
                *state = TransferState::Running;
                true
            } else {
                false
            }
        });
    }

    /// Cancel the transfer; this cannot be undone
    pub fn cancel(&self) {
        self.state.send_replace(TransferState::Cancelled);
    }

    /// Wait until the transfer may proceed
    ///
    /// Blocks while suspended and fails with [`HttpError::Cancelled`] once
    /// cancelled.
    pub async fn ready(&self) -> Result<(), HttpError> {
        let mut rx = self.state.subscribe();
        let state = *rx
            .wait_for(|state| *state != TransferState::Suspended)
            .await
            .map_err(|_| HttpError::Cancelled)?;

        match state {
            TransferState::Cancelled => Err(HttpError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Resolve once the transfer is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|state| *state == TransferState::Cancelled)
            .await;
    }

    pub(crate) fn report(&self, progress: Progress) {
        let observer = match self.progress.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };

        if let Some(observer) = observer {
            observer(progress);
        }
    }
}
