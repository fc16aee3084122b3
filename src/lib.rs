//! NSO GameCube Controller Bridge library
//! Connects the Nintendo Switch Online GameCube controller over BLE and
//! drives a virtual Xbox 360 gamepad from its input reports.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod state;
pub mod status;
pub mod utils;

pub use config::BridgeConfig;
pub use core::bluetooth::{ConnectionState, EngineExit, FatalKind, Timings, run_engine};
pub use core::capabilities::{CapabilityProvider, SystemCapabilities};
pub use state::EngineContext;
pub use status::{Severity, StatusEvent, StatusPoll, StatusReceiver, StatusSender};
