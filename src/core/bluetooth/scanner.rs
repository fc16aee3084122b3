
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, info};
use regex::Regex;

use crate::core::bluetooth::types::DeviceHandle;
use crate::error::{BridgeError, Result};

static MAC_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("MAC address pattern is valid")
});

pub struct BluetoothScanner {
    adapter: Adapter,
    devices: Arc<Mutex<HashMap<String, Device>>>,
    vendor_prefix: String,
}

impl BluetoothScanner {
    pub fn new(adapter: Adapter, devices: Arc<Mutex<HashMap<String, Device>>>, vendor_prefix: &str) -> Self {
        Self {
            adapter,
            devices,
            vendor_prefix: normalize_address(vendor_prefix),
        }
    }

    /// Looks for the controller among connected devices first, then listens
    /// for advertisements until `timeout` elapses.
    pub async fn scan(&self, timeout: Duration) -> Result<Option<DeviceHandle>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner).clear();

        if !self.adapter.is_available().await? {
            return Err(BridgeError::AdapterUnavailable("adapter is powered off".into()));
        }

        debug!("Checking for connected devices");
        for device in self.adapter.connected_devices().await? {
            if let Some(handle) = self.remember_if_matching(device) {
                info!("Controller {} is already connected", handle.address);
                return Ok(Some(handle));
            }
        }

        debug!("Starting bluetooth scan");
        let mut scan_stream = self.adapter.scan(&[]).await?;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered_device) => {
                            debug!("Found device - Device: {:?}, RSSI: {:?}", discovered_device.device, discovered_device.rssi);
                            if let Some(handle) = self.remember_if_matching(discovered_device.device) {
                                return Ok(Some(handle));
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            return Ok(None);
                        }
                    }
                }
                _ = &mut deadline => {
                    debug!("Scan window of {:?} elapsed without a match", timeout);
                    return Ok(None);
                }
            }
        }
    }

    /// Stores the device for the upcoming connect if its address carries the vendor prefix.
    fn remember_if_matching(&self, device: Device) -> Option<DeviceHandle> {
        let id = device.id().to_string();
        let address = extract_mac_address(&id)?;
        if !matches_vendor_prefix(&address, &self.vendor_prefix) {
            return None;
        }

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Found controller device: Address: {}, ID: {}, Name: {:?}", address, id, name);

        self.devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), device);
        Some(DeviceHandle::new(address, id))
    }
}

/// Pulls the peer MAC address out of a platform device id.
///
/// Windows ids embed the adapter address first and the peer address last,
/// Linux ids are the bare address. macOS ids carry no address at all.
pub fn extract_mac_address(device_id: &str) -> Option<String> {
    MAC_ADDRESS
        .find_iter(device_id)
        .last()
        .map(|m| m.as_str().to_uppercase())
}

pub fn matches_vendor_prefix(address: &str, prefix: &str) -> bool {
    let prefix = normalize_address(prefix);
    !prefix.is_empty() && normalize_address(address).starts_with(&prefix)
}

/// Upper-cases and strips `:` / `-` separators.
fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect::<String>()
        .to_uppercase()
}
