//! Engine context
//! The explicit handles the engine shares with the rest of the process.

use tokio_util::sync::CancellationToken;

use crate::status::StatusSender;

/// Stop signal plus the producer half of the status channel.
pub struct EngineContext {
    /// Cancelled by the process to ask the engine to unwind
    pub cancel: CancellationToken,
    /// Lifecycle transitions for the presentation layer
    pub status: StatusSender,
}

impl EngineContext {
    pub fn new(cancel: CancellationToken, status: StatusSender) -> Self {
        Self { cancel, status }
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
