//! Capability providers resolved once when the engine starts

use async_trait::async_trait;

use crate::core::bluetooth::{BleTransport, BluestTransport};
use crate::core::gamepad::VirtualGamepad;
use crate::core::gamepad::driver::is_vigem_installed;
use crate::core::gamepad::vigem::Xbox360Pad;
use crate::error::Result;

/// Everything the engine needs from the host before it can start scanning.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    type Transport: BleTransport;
    type Gamepad: VirtualGamepad;

    /// Whether the virtual controller driver is installed.
    fn driver_present(&self) -> bool;

    async fn init_transport(&self) -> Result<Self::Transport>;

    /// Creates the one virtual gamepad the process will ever use.
    fn init_gamepad(&self) -> Result<Self::Gamepad>;
}

/// bluest for Bluetooth, ViGEmBus for the virtual controller.
pub struct SystemCapabilities {
    vendor_prefix: String,
}

impl SystemCapabilities {
    pub fn new(vendor_prefix: impl Into<String>) -> Self {
        Self {
            vendor_prefix: vendor_prefix.into(),
        }
    }
}

#[async_trait]
impl CapabilityProvider for SystemCapabilities {
    type Transport = BluestTransport;
    type Gamepad = Xbox360Pad;

    fn driver_present(&self) -> bool {
        is_vigem_installed()
    }

    async fn init_transport(&self) -> Result<BluestTransport> {
        BluestTransport::new(&self.vendor_prefix).await
    }

    fn init_gamepad(&self) -> Result<Xbox360Pad> {
        Xbox360Pad::create()
    }
}
