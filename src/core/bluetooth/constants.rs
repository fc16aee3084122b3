//! Constants used throughout the application
//! This module contains the vendor prefix, timeouts and cooldowns the
//! connection manager runs with.

use std::time::Duration;

/// Nintendo's OUI, the hardware address prefix of the controller
pub const NINTENDO_OUI: &str = "3CA9AB";

/// How long a single discovery pass listens for advertisements
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(4);

/// Upper bound for connecting, and separately for subscribing
pub const BLUETOOTH_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Cooldown after the radio could not be queried
pub const SCAN_FAILURE_COOLDOWN: Duration = Duration::from_secs(2);

/// Cooldown after a failed connect or subscribe
pub const CONNECT_FAILURE_COOLDOWN: Duration = Duration::from_secs(1);

/// Delay before the next scan cycle, also used after a lost link
pub const RESCAN_DELAY: Duration = Duration::from_millis(500);

/// How often link liveness is polled while connected
pub const LINK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Buffered notifications between the forwarders and the engine
pub const NOTIFICATION_QUEUE_DEPTH: usize = 64;
