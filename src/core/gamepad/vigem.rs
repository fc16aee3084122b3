//! ViGEmBus virtual Xbox 360 controller (Windows-only).
//!
//! ViGEmBus is a virtual gamepad bus driver by Nefarius that lets user mode
//! create virtual Xbox 360 controllers. Other platforms get an uninhabited
//! stand-in so the engine still type-checks there; creating it always fails.
//!
//! Rust crate: https://github.com/CasualX/vigem-client

pub use imp::Xbox360Pad;

#[cfg(target_os = "windows")]
mod imp {
    use log::info;
    use vigem_client::{Client, TargetId, XButtons, XGamepad, Xbox360Wired};

    use crate::core::controller::Button;
    use crate::core::gamepad::{GamepadState, VirtualGamepad};
    use crate::error::{BridgeError, Result};

    pub struct Xbox360Pad {
        target: Xbox360Wired<Client>,
        state: GamepadState,
    }

    impl Xbox360Pad {
        /// Connects to the bus and plugs in a wired Xbox 360 target.
        pub fn create() -> Result<Self> {
            let client = Client::connect().map_err(|e| BridgeError::Gamepad(format!("{:?}", e)))?;
            let mut target = Xbox360Wired::new(client, TargetId::XBOX360_WIRED);
            target
                .plugin()
                .map_err(|e| BridgeError::Gamepad(format!("{:?}", e)))?;
            target
                .wait_ready()
                .map_err(|e| BridgeError::Gamepad(format!("{:?}", e)))?;
            info!("Virtual Xbox 360 controller plugged in");

            Ok(Self {
                target,
                state: GamepadState::default(),
            })
        }
    }

    impl VirtualGamepad for Xbox360Pad {
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
            let report = XGamepad {
                buttons: XButtons { raw: self.state.buttons },
                left_trigger: self.state.left_trigger,
                right_trigger: self.state.right_trigger,
                thumb_lx: self.state.thumb_lx,
                thumb_ly: self.state.thumb_ly,
                thumb_rx: self.state.thumb_rx,
                thumb_ry: self.state.thumb_ry,
            };
            self.target
                .update(&report)
                .map_err(|e| BridgeError::Gamepad(format!("{:?}", e)))
        }
    }
}

#[cfg(not(target_os = "windows"))]
mod imp {
    use crate::core::controller::Button;
    use crate::core::gamepad::VirtualGamepad;
    use crate::error::{BridgeError, Result};

    pub enum Xbox360Pad {}

    impl Xbox360Pad {
        pub fn create() -> Result<Self> {
            Err(BridgeError::Gamepad(
                "ViGEmBus virtual controllers are only available on Windows".into(),
            ))
        }
    }

    impl VirtualGamepad for Xbox360Pad {
        fn press(&mut self, _button: Button) {
            match *self {}
        }

        fn release(&mut self, _button: Button) {
            match *self {}
        }

        fn set_left_trigger(&mut self, _value: u8) {
            match *self {}
        }

        fn set_right_trigger(&mut self, _value: u8) {
            match *self {}
        }

        fn set_left_stick(&mut self, _x: i16, _y: i16) {
            match *self {}
        }

        fn set_right_stick(&mut self, _x: i16, _y: i16) {
            match *self {}
        }

        fn commit(&mut self) -> Result<()> {
            match *self {}
        }
    }
}
