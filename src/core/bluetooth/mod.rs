//! Bluetooth functionality for the bridge
//! This module handles discovery of the controller, the connection
//! lifecycle and the notifications it streams.

mod connection;
mod constants;
mod manager;
mod notification;
mod scanner;
mod transport;
mod types;

// Re-export types that should be publicly accessible
pub use connection::{BluestLink, BluestTransport};
pub use constants::*; // Re-export all constants
pub use manager::{ConnectionManager, EngineExit, Timings, run_engine};
pub use notification::NotificationHandler;
pub use scanner::{BluetoothScanner, extract_mac_address, matches_vendor_prefix};
pub use transport::{BleTransport, ControllerLink};
pub use types::{ConnectionState, DeviceHandle, FatalKind};
