//! Notification handling for the controller
//! This module applies each inbound report to the virtual gamepad.

use log::{debug, trace};

use crate::core::controller::decode;
use crate::core::gamepad::VirtualGamepad;

/// Owns the process-wide virtual gamepad and feeds it decoded reports.
///
/// Bad reports are dropped and the gamepad keeps its last committed state.
/// Nothing is reported upstream per frame.
pub struct NotificationHandler<G> {
    gamepad: G,
    applied: u64,
    dropped: u64,
}

impl<G: VirtualGamepad> NotificationHandler<G> {
    pub fn new(gamepad: G) -> Self {
        Self {
            gamepad,
            applied: 0,
            dropped: 0,
        }
    }

    /// Decodes `payload`, drives every control and commits once.
    /// Returns whether a frame reached the gamepad.
    pub fn handle(&mut self, payload: &[u8]) -> bool {
        let frame = match decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                trace!("Dropping controller report: {}", e);
                self.dropped += 1;
                return false;
            }
        };

        frame.apply_to(&mut self.gamepad);
        if let Err(e) = self.gamepad.commit() {
            debug!("Failed to commit controller report: {}", e);
            self.dropped += 1;
            return false;
        }

        trace!("Applied controller frame: {:?}", frame);
        self.applied += 1;
        true
    }

    /// Returns (applied, dropped) report counts and resets them.
    pub fn take_counters(&mut self) -> (u64, u64) {
        let counters = (self.applied, self.dropped);
        self.applied = 0;
        self.dropped = 0;
        counters
    }

    pub fn gamepad(&self) -> &G {
        &self.gamepad
    }

    pub fn into_gamepad(self) -> G {
        self.gamepad
    }
}
