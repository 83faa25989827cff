//! One-shot completion signal.
//!
//! The sending half lives inside the response view; resolving it consumes
//! the sender, so a request can never be completed twice.

use axum::response::Response;
use tokio::sync::oneshot;

use crate::adapter::AdapterError;

/// Sending half: resolved exactly once with the final response.
#[derive(Debug)]
pub struct Completion {
    tx: Option<oneshot::Sender<Response>>,
}

/// Receiving half, awaited by the outer handler.
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<Response>,
}

/// Create a linked completion pair for one request.
pub fn completion() -> (Completion, CompletionHandle) {
    let (tx, rx) = oneshot::channel();
    (Completion { tx: Some(tx) }, CompletionHandle { rx })
}

impl Completion {
    /// Resolve with the final response.
    pub fn resolve(&mut self, response: Response) -> Result<(), AdapterError> {
        let tx = self.tx.take().ok_or(AdapterError::AlreadyFinished)?;
        // The handle is only gone if the request itself was dropped.
        let _ = tx.send(response);
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }
}

impl CompletionHandle {
    /// Wait for the response. Fails if the sender was dropped unresolved.
    pub async fn wait(self) -> Result<Response, AdapterError> {
        self.rx.await.map_err(|_| AdapterError::Abandoned)
    }
}
