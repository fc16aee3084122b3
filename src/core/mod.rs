//! Core functionality for the bridge
//! This module contains the connection engine, the report decoder and the
//! virtual gamepad output.

pub mod bluetooth;
pub mod capabilities;
pub mod controller;
pub mod gamepad;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use bluetooth::{ConnectionManager, ConnectionState, EngineExit, run_engine};
pub use capabilities::{CapabilityProvider, SystemCapabilities};
pub use controller::{InputFrame, decode};
