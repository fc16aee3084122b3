//! Virtual gamepad output
//! This module defines the contract the engine drives every decoded frame
//! through, and the latched state shared by its implementations.

pub mod driver;
pub mod vigem;

use serde::Serialize;

use crate::core::controller::Button;
use crate::error::Result;

/// A virtual XInput-shaped controller.
///
/// Setters only latch state; nothing reaches the OS until [`commit`](Self::commit).
/// The engine owns exactly one instance and calls it from a single task.
pub trait VirtualGamepad {
    fn press(&mut self, button: Button);
    fn release(&mut self, button: Button);
    fn set_left_trigger(&mut self, value: u8);
    fn set_right_trigger(&mut self, value: u8);
    fn set_left_stick(&mut self, x: i16, y: i16);
    fn set_right_stick(&mut self, x: i16, y: i16);
    /// Flushes the whole latched state as one input report.
    fn commit(&mut self) -> Result<()>;
}

/// Latched controller state, laid out like an XUSB report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GamepadState {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl GamepadState {
    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    pub fn release(&mut self, button: Button) {
        self.buttons &= !button.mask();
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }
}
