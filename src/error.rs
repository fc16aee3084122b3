//! Error types shared by the bridge engine and its capability providers.

use thiserror::Error;

/// Errors raised by the Bluetooth transport and the virtual controller.
///
/// None of these escape the connection manager: each is turned into a status
/// event plus a cooldown, or into a fatal exit during startup.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] bluest::Error),

    #[error("Bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("Device not found with ID: {0}")]
    DeviceNotFound(String),

    #[error("No notify characteristic found on {0}")]
    NoNotifyCharacteristic(String),

    #[error("Subscription to characteristic {0} was abandoned")]
    Subscription(String),

    #[error("Timed out while trying to {0}")]
    Timeout(&'static str),

    #[error("Virtual controller error: {0}")]
    Gamepad(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
