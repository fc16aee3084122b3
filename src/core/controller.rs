//! NSO GameCube controller report decoding
//! This module turns raw notification payloads from the controller into
//! logical button, trigger and stick state.

use serde::Serialize;
use thiserror::Error;

use crate::core::gamepad::VirtualGamepad;

/// Reports shorter than this cannot be decoded.
pub const MIN_REPORT_LEN: usize = 14;

/// Center value of a 12-bit stick axis.
const STICK_CENTER: i32 = 2048;

/// Fixed tuning applied to every report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Multiplier from centered 12-bit stick units to XInput units
    pub stick_multiplier: f32,
    /// Fraction of the half range treated as stick deadzone
    pub deadzone: f32,
    /// Raw trigger value treated as the resting point
    pub trigger_offset: u8,
    /// Multiplier applied to the trigger travel past the offset
    pub trigger_scale: f32,
}

pub const CALIBRATION: Calibration = Calibration {
    stick_multiplier: 32.0,
    deadzone: 0.15,
    trigger_offset: 40,
    trigger_scale: 1.6,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("report too short: {len} bytes, need at least 14")]
    TooShort { len: usize },
}

/// Logical buttons of the virtual gamepad. Discriminants are the XUSB button bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum Button {
    DpadUp = 0x0001,
    DpadDown = 0x0002,
    DpadLeft = 0x0004,
    DpadRight = 0x0008,
    Start = 0x0010,
    RightShoulder = 0x0200,
    Guide = 0x0400,
    A = 0x1000,
    B = 0x2000,
    X = 0x4000,
    Y = 0x8000,
}

impl Button {
    pub const ALL: [Button; 11] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Start,
        Button::RightShoulder,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
        Button::Guide,
    ];

    pub fn mask(self) -> u16 {
        self as u16
    }
}

/// (report byte, bit, button)
const BUTTON_BITS: [(usize, u8, Button); 11] = [
    (2, 0x02, Button::A),
    (2, 0x01, Button::B),
    (2, 0x08, Button::X),
    (2, 0x04, Button::Y),
    (2, 0x40, Button::Start),
    (2, 0x20, Button::RightShoulder),
    (3, 0x08, Button::DpadUp),
    (3, 0x01, Button::DpadDown),
    (3, 0x04, Button::DpadLeft),
    (3, 0x02, Button::DpadRight),
    (4, 0x10, Button::Guide),
];

const RIGHT_TRIGGER_CLICK: (usize, u8) = (2, 0x10);
const LEFT_TRIGGER_CLICK: (usize, u8) = (3, 0x10);

/// Set of pressed buttons, stored as XUSB button bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ButtonSet(u16);

impl ButtonSet {
    pub fn insert(&mut self, button: Button) {
        self.0 |= button.mask();
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }
}

/// One decoded controller report. Always a full snapshot of the controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InputFrame {
    pub buttons: ButtonSet,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub left_stick: (i16, i16),
    pub right_stick: (i16, i16),
}

impl InputFrame {
    /// Drives every control of the gamepad from this frame. Does not commit.
    pub fn apply_to<G: VirtualGamepad + ?Sized>(&self, gamepad: &mut G) {
        for button in Button::ALL {
            if self.buttons.contains(button) {
                gamepad.press(button);
            } else {
                gamepad.release(button);
            }
        }
        gamepad.set_left_trigger(self.left_trigger);
        gamepad.set_right_trigger(self.right_trigger);
        gamepad.set_left_stick(self.left_stick.0, self.left_stick.1);
        gamepad.set_right_stick(self.right_stick.0, self.right_stick.1);
    }
}

/// Decodes a raw notification payload.
///
/// Only the first [`MIN_REPORT_LEN`] bytes are read; anything after them is
/// vendor data this bridge does not use.
pub fn decode(raw: &[u8]) -> Result<InputFrame, DecodeError> {
    let report: &[u8; MIN_REPORT_LEN] = raw
        .get(..MIN_REPORT_LEN)
        .and_then(|head| head.try_into().ok())
        .ok_or(DecodeError::TooShort { len: raw.len() })?;

    let mut buttons = ButtonSet::default();
    for (byte, bit, button) in BUTTON_BITS {
        if report[byte] & bit != 0 {
            buttons.insert(button);
        }
    }

    let left_click = report[LEFT_TRIGGER_CLICK.0] & LEFT_TRIGGER_CLICK.1 != 0;
    let right_click = report[RIGHT_TRIGGER_CLICK.0] & RIGHT_TRIGGER_CLICK.1 != 0;

    let (lx, ly) = unpack_12bit_pair([report[5], report[6], report[7]]);
    let (rx, ry) = unpack_12bit_pair([report[8], report[9], report[10]]);

    Ok(InputFrame {
        buttons,
        left_trigger: map_trigger(report[12], left_click),
        right_trigger: map_trigger(report[13], right_click),
        left_stick: (scale_stick(lx), scale_stick(ly)),
        right_stick: (scale_stick(rx), scale_stick(ry)),
    })
}

/// Unpack two 12-bit values from 3 bytes.
/// Byte layout: [lo8_a] [lo4_b | hi4_a] [hi8_b]
fn unpack_12bit_pair(bytes: [u8; 3]) -> (u16, u16) {
    let a = bytes[0] as u16 | ((bytes[1] & 0x0F) as u16) << 8;
    let b = (bytes[1] >> 4) as u16 | (bytes[2] as u16) << 4;
    (a, b)
}

/// Maps a raw trigger byte to 0..=255. A click forces full scale.
pub fn map_trigger(raw: u8, clicked: bool) -> u8 {
    if clicked {
        return u8::MAX;
    }
    let travel = raw.saturating_sub(CALIBRATION.trigger_offset) as f32;
    (travel * CALIBRATION.trigger_scale)
        .round()
        .clamp(0.0, u8::MAX as f32) as u8
}

/// Maps a 12-bit stick axis to the signed 16-bit XInput range.
pub fn scale_stick(raw: u16) -> i16 {
    let centered = raw as i32 - STICK_CENTER;
    if (centered.abs() as f32) < STICK_CENTER as f32 * CALIBRATION.deadzone {
        return 0;
    }
    let scaled = (centered as f32 * CALIBRATION.stick_multiplier).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> [u8; MIN_REPORT_LEN] {
        // sticks centered at 2048 (0x800)
        let mut r = [0u8; MIN_REPORT_LEN];
        r[5] = 0x00;
        r[6] = 0x08;
        r[7] = 0x80;
        r[8] = 0x00;
        r[9] = 0x08;
        r[10] = 0x80;
        r
    }

    #[test]
    fn short_reports_are_rejected() {
        for len in 0..MIN_REPORT_LEN {
            let raw = vec![0xFFu8; len];
            assert_eq!(decode(&raw), Err(DecodeError::TooShort { len }));
        }
    }

    #[test]
    fn centered_report_is_neutral() {
        let frame = decode(&report()).unwrap();
        assert_eq!(frame, InputFrame::default());
    }

    #[test]
    fn longer_reports_decode_from_the_head() {
        let mut raw = report().to_vec();
        raw[2] = 0x02;
        raw.extend_from_slice(&[0xAA; 49]);
        let frame = decode(&raw).unwrap();
        assert!(frame.buttons.contains(Button::A));
    }

    #[test]
    fn face_and_shoulder_bits() {
        let cases = [
            (0x02, Button::A),
            (0x01, Button::B),
            (0x08, Button::X),
            (0x04, Button::Y),
            (0x40, Button::Start),
            (0x20, Button::RightShoulder),
        ];
        for (bit, button) in cases {
            let mut raw = report();
            raw[2] = bit;
            let frame = decode(&raw).unwrap();
            assert!(frame.buttons.contains(button), "{button:?}");
            assert_eq!(frame.buttons.bits(), button.mask());
        }
    }

    #[test]
    fn dpad_and_guide_bits() {
        let mut raw = report();
        raw[3] = 0x08 | 0x02;
        raw[4] = 0x10;
        let frame = decode(&raw).unwrap();
        assert!(frame.buttons.contains(Button::DpadUp));
        assert!(frame.buttons.contains(Button::DpadRight));
        assert!(!frame.buttons.contains(Button::DpadDown));
        assert!(!frame.buttons.contains(Button::DpadLeft));
        assert!(frame.buttons.contains(Button::Guide));
    }

    #[test]
    fn click_bits_are_not_buttons() {
        let mut raw = report();
        raw[2] = 0x10;
        raw[3] = 0x10;
        let frame = decode(&raw).unwrap();
        assert!(frame.buttons.is_empty());
        assert_eq!(frame.left_trigger, 255);
        assert_eq!(frame.right_trigger, 255);
    }

    #[test]
    fn click_forces_full_trigger_for_any_raw_value() {
        for raw in 0..=u8::MAX {
            assert_eq!(map_trigger(raw, true), 255);
        }
    }

    #[test]
    fn trigger_curve() {
        assert_eq!(map_trigger(0, false), 0);
        assert_eq!(map_trigger(40, false), 0);
        assert_eq!(map_trigger(41, false), 2);
        assert_eq!(map_trigger(100, false), 96);
        assert_eq!(map_trigger(200, false), 255);
        assert_eq!(map_trigger(255, false), 255);
    }

    #[test]
    fn trigger_bytes_map_independently() {
        let mut raw = report();
        raw[12] = 100;
        raw[13] = 40;
        let frame = decode(&raw).unwrap();
        assert_eq!(frame.left_trigger, 96);
        assert_eq!(frame.right_trigger, 0);
    }

    #[test]
    fn stick_scaling() {
        assert_eq!(scale_stick(2048), 0);
        assert_eq!(scale_stick(2100), 0);
        assert_eq!(scale_stick(2048 - 307), 0);
        assert_eq!(scale_stick(2048 + 308), 308 * 32);
        assert_eq!(scale_stick(2500), 14464);
        assert_eq!(scale_stick(0), -32768);
        assert_eq!(scale_stick(4095), 32767);
    }

    #[test]
    fn stick_nibble_packing() {
        // lx = 0x9C4 (2500), ly = 0x000 (0)
        // rx = 0x000 (0),    ry = 0xFFF (4095)
        let mut raw = report();
        raw[5] = 0xC4;
        raw[6] = 0x09;
        raw[7] = 0x00;
        raw[8] = 0x00;
        raw[9] = 0xF0;
        raw[10] = 0xFF;
        let frame = decode(&raw).unwrap();
        assert_eq!(frame.left_stick, (14464, -32768));
        assert_eq!(frame.right_stick, (-32768, 32767));
    }
}
