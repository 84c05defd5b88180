//! Handle to a request dispatched with a callback

use narwhal_http_client::{Progress, TransferControl, TransferState};
use tokio::task::{JoinError, JoinHandle};

/// Controls a request running in the background
///
/// Every control method is forwarded to the transport. Dropping the handle
/// does not cancel the request.
#[derive(Debug)]
pub struct RequestHandle {
    control: TransferControl,
    task: JoinHandle<()>,
}

impl RequestHandle {
    pub(crate) fn new(control: TransferControl, task: JoinHandle<()>) -> Self {
        Self { control, task }
    }

    /// Observe download progress of the response body
    pub fn progress<F>(&self, observer: F)
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.control.on_progress(observer);
    }

    /// Pause the transfer until [`RequestHandle::resume`]
    pub fn suspend(&self) {
        self.control.suspend();
    }

    /// Continue a suspended transfer
    pub fn resume(&self) {
        self.control.resume();
    }

    /// Cancel the transfer
    ///
    /// The callback still fires, with a cancelled transport error, unless a
    /// middleware aborts.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Current transfer state
    pub fn state(&self) -> TransferState {
        self.control.state()
    }

    /// `true` once the callback has run or the request was dropped
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the request to finish
    pub async fn join(self) -> Result<(), JoinError> {
        self.task.await
    }
}
