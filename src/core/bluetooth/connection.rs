//! Bluetooth connection handling for the controller
//! This module opens the link to the controller and subscribes to its
//! notification characteristics using bluest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, Device};
use futures_util::StreamExt;
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::bluetooth::constants::NOTIFICATION_QUEUE_DEPTH;
use crate::core::bluetooth::scanner::BluetoothScanner;
use crate::core::bluetooth::transport::{BleTransport, ControllerLink};
use crate::core::bluetooth::types::DeviceHandle;
use crate::error::{BridgeError, Result};

/// The bluest-backed transport used outside of tests.
pub struct BluestTransport {
    adapter: Adapter,
    devices: Arc<Mutex<HashMap<String, Device>>>,
    scanner: BluetoothScanner,
}

impl BluestTransport {
    /// Resolves the default adapter. Whether it is powered is checked per scan.
    pub async fn new(vendor_prefix: &str) -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| BridgeError::AdapterUnavailable("No Bluetooth adapter found".into()))?;
        info!("Bluetooth adapter found.");

        let devices = Arc::new(Mutex::new(HashMap::new()));
        let scanner = BluetoothScanner::new(adapter.clone(), devices.clone(), vendor_prefix);

        Ok(Self {
            adapter,
            devices,
            scanner,
        })
    }
}

#[async_trait]
impl BleTransport for BluestTransport {
    type Link = BluestLink;

    async fn scan(&self, timeout: Duration) -> Result<Option<DeviceHandle>> {
        self.scanner.scan(timeout).await
    }

    async fn connect(&self, handle: &DeviceHandle) -> Result<BluestLink> {
        let device = {
            let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
            devices
                .get(&handle.id)
                .cloned()
                .ok_or_else(|| BridgeError::DeviceNotFound(handle.id.clone()))?
        };

        if !device.is_connected().await {
            info!("Initiating connection to {}...", handle.address);
            self.adapter.connect_device(&device).await?;
        }
        info!("Connection to {} established", handle.address);

        Ok(BluestLink {
            adapter: self.adapter.clone(),
            device,
            address: handle.address.clone(),
            payloads: None,
            forwarders: Vec::new(),
        })
    }
}

/// An open bluest link. Each subscribed characteristic gets a forwarder task
/// that pushes its payloads into one queue read by the engine.
pub struct BluestLink {
    adapter: Adapter,
    device: Device,
    address: String,
    payloads: Option<mpsc::Receiver<Vec<u8>>>,
    forwarders: Vec<JoinHandle<()>>,
}

#[async_trait]
impl ControllerLink for BluestLink {
    async fn subscribe_all(&mut self) -> Result<usize> {
        info!("Connection successful, discovering services...");
        let services = self.device.services().await?;

        let (tx, rx) = mpsc::channel(NOTIFICATION_QUEUE_DEPTH);
        let mut pending = Vec::new();

        for service in services {
            debug!("Service: {}", service.uuid());
            for characteristic in service.characteristics().await? {
                let properties = characteristic.properties().await?;
                if !properties.notify {
                    continue;
                }
                let uuid = characteristic.uuid().to_string();
                debug!("Found notification characteristic: {}", uuid);

                let (ready_tx, ready_rx) = oneshot::channel();
                self.forwarders.push(tokio::spawn(forward_notifications(
                    characteristic,
                    tx.clone(),
                    ready_tx,
                )));
                pending.push((uuid, ready_rx));
            }
        }
        drop(tx);

        if pending.is_empty() {
            return Err(BridgeError::NoNotifyCharacteristic(self.address.clone()));
        }

        let count = pending.len();
        for (uuid, ready) in pending {
            match ready.await {
                Ok(Ok(())) => info!("Subscribed to notifications on {}", uuid),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(BridgeError::Subscription(uuid)),
            }
        }

        self.payloads = Some(rx);
        Ok(count)
    }

    async fn next_payload(&mut self) -> Option<Vec<u8>> {
        match self.payloads.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await
    }

    async fn disconnect(&mut self) {
        self.payloads = None;
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }

        if self.device.is_connected().await {
            info!("Disconnecting from device {}", self.address);
            if let Err(e) = self.adapter.disconnect_device(&self.device).await {
                warn!("Failed to disconnect from {}: {}", self.address, e);
            }
        } else {
            debug!("Device {} not connected", self.address);
        }
    }
}

impl Drop for BluestLink {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
    }
}

/// Subscribes to one characteristic and forwards its payloads until the
/// stream ends or the engine stops listening.
async fn forward_notifications(
    characteristic: Characteristic,
    tx: mpsc::Sender<Vec<u8>>,
    ready: oneshot::Sender<Result<()>>,
) {
    let uuid = characteristic.uuid();
    let mut notification_stream = match characteristic.notify().await {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            error!("Failed to subscribe to notifications on {}: {}", uuid, e);
            let _ = ready.send(Err(e.into()));
            return;
        }
    };

    while let Some(result) = notification_stream.next().await {
        match result {
            Ok(value) => {
                trace!("Received {} bytes on {}", value.len(), uuid);
                if tx.send(value).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Error in notification stream {}: {}", uuid, e);
                break;
            }
        }
    }

    info!("Notification stream {} ended", uuid);
}
