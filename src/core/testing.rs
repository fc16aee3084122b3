//! In-memory stand-ins for the capability traits, used by the engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::{BleTransport, ControllerLink, DeviceHandle};
use crate::core::capabilities::CapabilityProvider;
use crate::core::controller::Button;
use crate::core::gamepad::{GamepadState, VirtualGamepad};
use crate::error::{BridgeError, Result};

/// A 14-byte report with both sticks centered and nothing pressed.
pub fn centered_report() -> Vec<u8> {
    let mut raw = vec![0u8; 14];
    raw[6] = 0x08;
    raw[7] = 0x80;
    raw[9] = 0x08;
    raw[10] = 0x80;
    raw
}

/// Latches like a real gamepad and keeps a copy of every committed state.
#[derive(Debug, Default)]
pub struct RecordingGamepad {
    state: GamepadState,
    commits: Vec<GamepadState>,
    fail_commits: bool,
}

impl RecordingGamepad {
    pub fn failing() -> Self {
        Self {
            fail_commits: true,
            ..Self::default()
        }
    }

    pub fn latched(&self) -> GamepadState {
        self.state
    }

    pub fn commits(&self) -> &[GamepadState] {
        &self.commits
    }
}

impl VirtualGamepad for RecordingGamepad {
    fn press(&mut self, button: Button) {
        self.state.press(button);
    }

    fn release(&mut self, button: Button) {
        self.state.release(button);
    }

    fn set_left_trigger(&mut self, value: u8) {
        self.state.left_trigger = value;
    }

    fn set_right_trigger(&mut self, value: u8) {
        self.state.right_trigger = value;
    }

    fn set_left_stick(&mut self, x: i16, y: i16) {
        self.state.thumb_lx = x;
        self.state.thumb_ly = y;
    }

    fn set_right_stick(&mut self, x: i16, y: i16) {
        self.state.thumb_rx = x;
        self.state.thumb_ry = y;
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_commits {
            return Err(BridgeError::Gamepad("bus unplugged".into()));
        }
        self.commits.push(self.state);
        Ok(())
    }
}

/// Shared, ordered record of transport calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub enum ScanStep {
    Fail,
    Nothing,
    Match(&'static str),
}

pub enum ConnectStep {
    Fail,
    SubscribeFails,
    /// Delivers these payloads, then every stream ends
    Link(Vec<Vec<u8>>),
    /// Subscribes, never delivers, and reports itself disconnected
    DropsSilently,
    /// Stays connected and quiet until the engine lets go
    Holds,
}

/// Replays scripted scan and connect outcomes. Once the scan script is used
/// up it cancels the optional token so the engine stops.
pub struct FakeTransport {
    scans: Mutex<VecDeque<ScanStep>>,
    connects: Mutex<VecDeque<ConnectStep>>,
    log: CallLog,
    stop_when_exhausted: Option<CancellationToken>,
}

impl FakeTransport {
    pub fn new(scans: Vec<ScanStep>, connects: Vec<ConnectStep>) -> Self {
        Self {
            scans: Mutex::new(scans.into()),
            connects: Mutex::new(connects.into()),
            log: CallLog::default(),
            stop_when_exhausted: None,
        }
    }

    pub fn cancel_when_exhausted(mut self, cancel: CancellationToken) -> Self {
        self.stop_when_exhausted = Some(cancel);
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl BleTransport for FakeTransport {
    type Link = FakeLink;

    async fn scan(&self, _timeout: Duration) -> Result<Option<DeviceHandle>> {
        let step = self.scans.lock().unwrap().pop_front();
        let Some(step) = step else {
            if let Some(cancel) = &self.stop_when_exhausted {
                cancel.cancel();
            }
            return Ok(None);
        };

        self.log.push("scan".to_string());
        match step {
            ScanStep::Fail => Err(BridgeError::AdapterUnavailable("radio off".into())),
            ScanStep::Nothing => Ok(None),
            ScanStep::Match(address) => Ok(Some(DeviceHandle::new(
                address.to_string(),
                format!("fake-{}", address),
            ))),
        }
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<FakeLink> {
        self.log.push(format!("connect {}", device.address));
        let step = self
            .connects
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectStep::Fail);

        match step {
            ConnectStep::Fail => Err(BridgeError::DeviceNotFound(device.id.clone())),
            step => Ok(FakeLink {
                address: device.address.clone(),
                step,
                log: self.log.clone(),
            }),
        }
    }
}

pub struct FakeLink {
    address: String,
    step: ConnectStep,
    log: CallLog,
}

#[async_trait]
impl ControllerLink for FakeLink {
    async fn subscribe_all(&mut self) -> Result<usize> {
        match self.step {
            ConnectStep::SubscribeFails => Err(BridgeError::NoNotifyCharacteristic(self.address.clone())),
            _ => {
                self.log.push(format!("subscribe {}", self.address));
                Ok(1)
            }
        }
    }

    async fn next_payload(&mut self) -> Option<Vec<u8>> {
        match &mut self.step {
            ConnectStep::Link(payloads) if !payloads.is_empty() => Some(payloads.remove(0)),
            ConnectStep::DropsSilently | ConnectStep::Holds => std::future::pending().await,
            _ => None,
        }
    }

    async fn is_connected(&self) -> bool {
        !matches!(self.step, ConnectStep::DropsSilently)
    }

    async fn disconnect(&mut self) {
        self.log.push(format!("disconnect {}", self.address));
    }
}

/// Hands out a single [`FakeTransport`] and counts gamepad creations.
pub struct FakeProvider {
    transport: Mutex<Option<FakeTransport>>,
    driver_present: bool,
    broken_transport: bool,
    broken_gamepad: bool,
    gamepads_created: AtomicUsize,
}

impl FakeProvider {
    pub fn new(transport: FakeTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            driver_present: true,
            broken_transport: false,
            broken_gamepad: false,
            gamepads_created: AtomicUsize::new(0),
        }
    }

    pub fn without_driver(mut self) -> Self {
        self.driver_present = false;
        self
    }

    pub fn with_broken_transport(mut self) -> Self {
        self.broken_transport = true;
        self
    }

    pub fn with_broken_gamepad(mut self) -> Self {
        self.broken_gamepad = true;
        self
    }

    pub fn gamepads_created(&self) -> usize {
        self.gamepads_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityProvider for FakeProvider {
    type Transport = FakeTransport;
    type Gamepad = RecordingGamepad;

    fn driver_present(&self) -> bool {
        self.driver_present
    }

    async fn init_transport(&self) -> Result<FakeTransport> {
        if self.broken_transport {
            return Err(BridgeError::AdapterUnavailable("No Bluetooth adapter found".into()));
        }
        self.transport
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BridgeError::AdapterUnavailable("transport already taken".into()))
    }

    fn init_gamepad(&self) -> Result<RecordingGamepad> {
        if self.broken_gamepad {
            return Err(BridgeError::Gamepad("bus not reachable".into()));
        }
        self.gamepads_created.fetch_add(1, Ordering::SeqCst);
        Ok(RecordingGamepad::default())
    }
}
