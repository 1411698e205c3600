//! Cancellation utilities
//!
//! A [`CancelHandle`] aborts in-flight proxied calls. Cancelling drops the
//! pending backend future, which closes its HTTP connection.

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Calls observing this handle, or any child of it,
    /// stop at their next suspension point.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A handle cancelled together with this one that can also be cancelled
    /// on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

/// Drive `future` unless the handle is cancelled first. Returns `None` on
/// cancellation, after dropping the future.
pub async fn run_cancellable<F, T>(handle: &CancelHandle, future: F) -> Option<T>
where
    F: Future<Output = T>,
{
    if handle.is_cancelled() {
        return None;
    }
    tokio::select! {
        biased;
        _ = handle.cancelled() => None,
        out = future => Some(out),
    }
}
