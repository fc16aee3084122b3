//! Transport seams between the connection manager and the Bluetooth stack

use std::time::Duration;

use async_trait::async_trait;

use crate::core::bluetooth::types::DeviceHandle;
use crate::error::Result;

/// Discovery and connection establishment.
#[async_trait]
pub trait BleTransport: Send + Sync {
    type Link: ControllerLink;

    /// Listens for up to `timeout` and returns the first matching peripheral.
    ///
    /// `Ok(None)` means nothing matched in time. `Err` means the radio could not
    /// be queried at all.
    async fn scan(&self, timeout: Duration) -> Result<Option<DeviceHandle>>;

    /// Opens a link to a peripheral returned by the last [`scan`](Self::scan).
    async fn connect(&self, device: &DeviceHandle) -> Result<Self::Link>;
}

/// An open link to the controller.
#[async_trait]
pub trait ControllerLink: Send + Sync {
    /// Subscribes to every notify-capable characteristic and returns how many.
    async fn subscribe_all(&mut self) -> Result<usize>;

    /// Next notification payload from any subscribed characteristic.
    /// `None` once every notification stream has ended.
    async fn next_payload(&mut self) -> Option<Vec<u8>>;

    async fn is_connected(&self) -> bool;

    /// Tears the link down. Failures are logged, not returned.
    async fn disconnect(&mut self);
}
