//! Status channel
//! Carries lifecycle transitions from the engine to the presentation layer.
//! Unbounded, so the engine never waits on a slow consumer.

use chrono::Local;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::core::bluetooth::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub state: ConnectionState,
    pub severity: Severity,
    pub message: String,
    pub timestamp: String,
}

/// Creates the engine's sender and the presentation layer's receiver.
pub fn channel() -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSender { tx }, StatusReceiver { rx })
}

/// Producer half, owned by the engine. Deliberately not `Clone`.
pub struct StatusSender {
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusSender {
    pub fn emit(&self, state: ConnectionState, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => info!("[{}] {}", state, message),
            Severity::Warn => warn!("[{}] {}", state, message),
            Severity::Error | Severity::Fatal => error!("[{}] {}", state, message),
        }

        let event = StatusEvent {
            state,
            severity,
            message,
            timestamp: Local::now().to_rfc3339(),
        };
        if self.tx.send(event).is_err() {
            debug!("Status receiver dropped, event discarded");
        }
    }
}

/// Result of a non-blocking poll.
#[derive(Debug, PartialEq)]
pub enum StatusPoll {
    Event(StatusEvent),
    Empty,
    /// The engine has dropped its sender and everything has been drained.
    Closed,
}

/// Consumer half, owned by the presentation layer.
pub struct StatusReceiver {
    rx: mpsc::UnboundedReceiver<StatusEvent>,
}

impl StatusReceiver {
    pub fn poll(&mut self) -> StatusPoll {
        match self.rx.try_recv() {
            Ok(event) => StatusPoll::Event(event),
            Err(TryRecvError::Empty) => StatusPoll::Empty,
            Err(TryRecvError::Disconnected) => StatusPoll::Closed,
        }
    }

    /// Everything queued right now, in emission order.
    pub fn drain(&mut self) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        while let StatusPoll::Event(event) = self.poll() {
            events.push(event);
        }
        events
    }

    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }
}
