//! Connection manager for the bridge
//! This module owns the scan / connect / stream / reconnect state machine.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, timeout};

use crate::core::bluetooth::constants::{
    BLUETOOTH_OPERATION_TIMEOUT, CONNECT_FAILURE_COOLDOWN, DEFAULT_SCAN_DURATION,
    LINK_POLL_INTERVAL, RESCAN_DELAY, SCAN_FAILURE_COOLDOWN,
};
use crate::core::bluetooth::notification::NotificationHandler;
use crate::core::bluetooth::transport::{BleTransport, ControllerLink};
use crate::core::bluetooth::types::{ConnectionState, DeviceHandle, FatalKind};
use crate::core::capabilities::CapabilityProvider;
use crate::core::gamepad::VirtualGamepad;
use crate::core::gamepad::driver::VIGEM_DOWNLOAD_URL;
use crate::error::{BridgeError, Result};
use crate::state::EngineContext;
use crate::status::Severity;

/// Fixed timings of the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    pub scan_timeout: Duration,
    pub operation_timeout: Duration,
    pub scan_failure_cooldown: Duration,
    pub connect_failure_cooldown: Duration,
    pub rescan_delay: Duration,
    pub link_poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            scan_timeout: DEFAULT_SCAN_DURATION,
            operation_timeout: BLUETOOTH_OPERATION_TIMEOUT,
            scan_failure_cooldown: SCAN_FAILURE_COOLDOWN,
            connect_failure_cooldown: CONNECT_FAILURE_COOLDOWN,
            rescan_delay: RESCAN_DELAY,
            link_poll_interval: LINK_POLL_INTERVAL,
        }
    }
}

/// How the engine finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineExit {
    Stopped,
    Fatal(FatalKind),
}

/// How one connection attempt finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The link dropped while connected
    Lost,
    /// Connect or subscribe failed
    Failed,
    /// The stop signal was observed
    Stopped,
}

/// Checks the preconditions, resolves the capabilities and runs the
/// connection manager until it is stopped or cannot start.
pub async fn run_engine<P: CapabilityProvider>(
    provider: &P,
    ctx: EngineContext,
    timings: Timings,
) -> EngineExit {
    ctx.status.emit(ConnectionState::Idle, Severity::Info, "Loading drivers...");

    if !provider.driver_present() {
        return fatal(
            &ctx,
            FatalKind::MissingDriver,
            format!("ViGEmBus driver not found. Download it from {}", VIGEM_DOWNLOAD_URL),
        );
    }

    let transport = match provider.init_transport().await {
        Ok(transport) => transport,
        Err(e) => return fatal(&ctx, FatalKind::InitFailure, format!("Bluetooth init failed: {}", e)),
    };

    let gamepad = match provider.init_gamepad() {
        Ok(gamepad) => gamepad,
        Err(e) => return fatal(&ctx, FatalKind::InitFailure, e.to_string()),
    };

    let mut manager = ConnectionManager::new(transport, gamepad, ctx, timings);
    manager.run().await
}

fn fatal(ctx: &EngineContext, kind: FatalKind, message: String) -> EngineExit {
    ctx.status
        .emit(ConnectionState::FatalError(kind), Severity::Fatal, message);
    EngineExit::Fatal(kind)
}

/// Drives discovery, the link and the virtual gamepad.
///
/// Holds at most one link at a time and never scans while connected, so a
/// second controller in range is ignored until the current link ends.
pub struct ConnectionManager<T: BleTransport, G: VirtualGamepad> {
    transport: T,
    notifications: NotificationHandler<G>,
    ctx: EngineContext,
    timings: Timings,
    state: ConnectionState,
}

impl<T: BleTransport, G: VirtualGamepad> ConnectionManager<T, G> {
    pub fn new(transport: T, gamepad: G, ctx: EngineContext, timings: Timings) -> Self {
        Self {
            transport,
            notifications: NotificationHandler::new(gamepad),
            ctx,
            timings,
            state: ConnectionState::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn into_gamepad(self) -> G {
        self.notifications.into_gamepad()
    }

    /// Runs until the stop signal is observed.
    pub async fn run(&mut self) -> EngineExit {
        let cancel = self.ctx.cancel.clone();

        while !self.ctx.is_stopping() {
            self.transition(
                ConnectionState::Scanning,
                Severity::Info,
                "Scanning for Nintendo controller...",
            );

            let scan = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.transport.scan(self.timings.scan_timeout) => result,
            };

            match scan {
                Err(e) => {
                    warn!("Bluetooth scan failed: {}", e);
                    self.transition(
                        ConnectionState::TransientError,
                        Severity::Error,
                        "Bluetooth error: is Bluetooth on?",
                    );
                    if !self.cooldown(self.timings.scan_failure_cooldown).await {
                        break;
                    }
                    continue;
                }
                Ok(None) => debug!("No controller found this cycle"),
                Ok(Some(device)) => {
                    if self.serve(device).await == SessionEnd::Stopped {
                        break;
                    }
                }
            }

            if !self.cooldown(self.timings.rescan_delay).await {
                break;
            }
        }

        info!("Stop signal observed, connection manager exiting");
        EngineExit::Stopped
    }

    /// Connects to `device` and streams its reports until the link ends.
    async fn serve(&mut self, device: DeviceHandle) -> SessionEnd {
        self.transition(
            ConnectionState::Found,
            Severity::Info,
            format!("Found: {}", device.address),
        );
        self.transition(
            ConnectionState::Connecting,
            Severity::Info,
            format!("Connecting to {}...", device.address),
        );

        let mut link = match self.open_link(&device).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Connection to {} failed: {}", device.address, e);
                self.transition(
                    ConnectionState::TransientError,
                    Severity::Warn,
                    "Connection failed. Retrying...",
                );
                return if self.cooldown(self.timings.connect_failure_cooldown).await {
                    SessionEnd::Failed
                } else {
                    SessionEnd::Stopped
                };
            }
        };

        self.transition(
            ConnectionState::Connected,
            Severity::Info,
            format!("Connected: {}", device.address),
        );

        let end = self.hold_link(&mut link).await;
        link.disconnect().await;

        let (applied, dropped) = self.notifications.take_counters();
        info!(
            "Session with {} ended: {} reports applied, {} dropped",
            device.address, applied, dropped
        );

        if end == SessionEnd::Lost {
            self.transition(
                ConnectionState::SignalLost,
                Severity::Warn,
                "Signal lost. Rescanning...",
            );
        }
        end
    }

    async fn open_link(&self, device: &DeviceHandle) -> Result<T::Link> {
        let mut link = timeout(self.timings.operation_timeout, self.transport.connect(device))
            .await
            .map_err(|_| BridgeError::Timeout("connect"))??;

        match timeout(self.timings.operation_timeout, link.subscribe_all()).await {
            Ok(Ok(count)) => {
                info!("Subscribed to {} notify characteristic(s) on {}", count, device.address);
                Ok(link)
            }
            Ok(Err(e)) => {
                link.disconnect().await;
                Err(e)
            }
            Err(_) => {
                link.disconnect().await;
                Err(BridgeError::Timeout("subscribe"))
            }
        }
    }

    /// Applies reports until the link drops or the stop signal is observed.
    async fn hold_link(&mut self, link: &mut T::Link) -> SessionEnd {
        let cancel = self.ctx.cancel.clone();
        let period = self.timings.link_poll_interval;
        let mut poll = interval_at(Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Stopped,
                _ = poll.tick() => {
                    if !link.is_connected().await {
                        debug!("Link reported disconnected");
                        return SessionEnd::Lost;
                    }
                }
                payload = link.next_payload() => match payload {
                    Some(payload) => {
                        self.notifications.handle(&payload);
                    }
                    None => {
                        debug!("All notification streams ended");
                        return SessionEnd::Lost;
                    }
                },
            }
        }
    }

    /// Sleeps for `duration`; returns false if the stop signal fired first.
    async fn cooldown(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.ctx.cancel.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }

    fn transition(&mut self, next: ConnectionState, severity: Severity, message: impl Into<String>) {
        debug!("State transition: {} -> {}", self.state, next);
        self.state = next;
        self.ctx.status.emit(next, severity, message);
    }
}
