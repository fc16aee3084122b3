//! Defines shared data structures for the Bluetooth module.

use std::fmt;

use serde::Serialize;

/// A peripheral matched during discovery. Recreated on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceHandle {
    /// Hardware address as reported by the platform, upper-cased
    pub address: String,
    /// Platform-specific identifier used to reconnect to the peripheral
    pub id: String,
}

impl DeviceHandle {
    pub fn new(address: String, id: String) -> Self {
        Self { address, id }
    }
}

/// Why the engine gave up for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FatalKind {
    /// The virtual controller bus driver is not installed
    MissingDriver,
    /// A required capability (Bluetooth or virtual controller) failed to start
    InitFailure,
}

/// Lifecycle state of the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Idle,
    Scanning,
    Found,
    Connecting,
    Connected,
    SignalLost,
    TransientError,
    FatalError(FatalKind),
}

impl ConnectionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scanning => "Scanning",
            Self::Found => "Found",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::SignalLost => "SignalLost",
            Self::TransientError => "TransientError",
            Self::FatalError(_) => "FatalError",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalError(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FatalError(kind) => write!(f, "FatalError({:?})", kind),
            other => f.write_str(other.name()),
        }
    }
}
