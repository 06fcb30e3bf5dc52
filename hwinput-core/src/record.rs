//! Hardware input records and the encoder that builds them.
//!
//! [`HardwareInput`] mirrors the Win32 `INPUT` union without depending on
//! `windows-rs`, so sequencing logic can be exercised on any host.  Flag
//! values are the Win32 ones; the Windows backend converts a record into an
//! `INPUT` by copying fields.
//!
//! Every record carries `time = 0` (the OS stamps it) and
//! `extra_info = 0` (no correlation token).

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::keys::KeyToken;

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

/// `MOUSEEVENTF_*` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MouseFlags(pub u32);

impl MouseFlags {
    pub const NONE: Self = Self(0);
    pub const MOVE: Self = Self(0x0001);
    pub const LEFT_DOWN: Self = Self(0x0002);
    pub const LEFT_UP: Self = Self(0x0004);
    pub const RIGHT_DOWN: Self = Self(0x0008);
    pub const RIGHT_UP: Self = Self(0x0010);
    pub const MIDDLE_DOWN: Self = Self(0x0020);
    pub const MIDDLE_UP: Self = Self(0x0040);
    pub const X_DOWN: Self = Self(0x0080);
    pub const X_UP: Self = Self(0x0100);
    pub const WHEEL: Self = Self(0x0800);
    pub const HWHEEL: Self = Self(0x1000);
    pub const MOVE_NOCOALESCE: Self = Self(0x2000);
    pub const VIRTUALDESK: Self = Self(0x4000);
    pub const ABSOLUTE: Self = Self(0x8000);

    /// All bits of `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for MouseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MouseFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// `KEYEVENTF_*` bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyFlags(pub u32);

impl KeyFlags {
    pub const NONE: Self = Self(0);
    pub const EXTENDED_KEY: Self = Self(0x0001);
    pub const KEY_UP: Self = Self(0x0002);
    pub const UNICODE: Self = Self(0x0004);
    pub const SCANCODE: Self = Self(0x0008);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for KeyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Mouse payload (`MOUSEINPUT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseInput {
    pub dx: i32,
    pub dy: i32,
    /// Wheel delta (signed, stored bit-for-bit) or X button number.
    pub mouse_data: u32,
    pub flags: MouseFlags,
    pub time: u32,
    pub extra_info: usize,
}

/// Keyboard payload (`KEYBDINPUT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardInput {
    pub vk: u16,
    /// Hardware scan code, or a UTF-16 code unit in Unicode mode.
    pub scan: u16,
    pub flags: KeyFlags,
    pub time: u32,
    pub extra_info: usize,
}

impl KeyboardInput {
    pub fn is_key_up(&self) -> bool {
        self.flags.contains(KeyFlags::KEY_UP)
    }

    pub fn is_extended(&self) -> bool {
        self.flags.contains(KeyFlags::EXTENDED_KEY)
    }

    pub fn is_unicode(&self) -> bool {
        self.flags.contains(KeyFlags::UNICODE)
    }
}

/// One record for the OS input queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareInput {
    Mouse(MouseInput),
    Keyboard(KeyboardInput),
}

impl HardwareInput {
    pub fn as_mouse(&self) -> Option<&MouseInput> {
        match self {
            HardwareInput::Mouse(mi) => Some(mi),
            HardwareInput::Keyboard(_) => None,
        }
    }

    pub fn as_keyboard(&self) -> Option<&KeyboardInput> {
        match self {
            HardwareInput::Keyboard(ki) => Some(ki),
            HardwareInput::Mouse(_) => None,
        }
    }

    /// Wheel records need a settle pause after submission.
    pub fn is_wheel(&self) -> bool {
        self.as_mouse()
            .is_some_and(|mi| mi.flags.intersects(MouseFlags::WHEEL | MouseFlags::HWHEEL))
    }
}

// ---------------------------------------------------------------------------
// Pointer vocabulary
// ---------------------------------------------------------------------------

/// One notch of wheel travel.
pub const WHEEL_DELTA: i32 = 120;

/// X button numbers carried in `mouse_data`.
pub const XBUTTON1: u32 = 0x0001;
pub const XBUTTON2: u32 = 0x0002;

/// Physical mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    /// Flag and `mouse_data` for pressing (`press = true`) or releasing.
    pub fn flags(self, press: bool) -> (MouseFlags, u32) {
        match (self, press) {
            (MouseButton::Left, true) => (MouseFlags::LEFT_DOWN, 0),
            (MouseButton::Left, false) => (MouseFlags::LEFT_UP, 0),
            (MouseButton::Right, true) => (MouseFlags::RIGHT_DOWN, 0),
            (MouseButton::Right, false) => (MouseFlags::RIGHT_UP, 0),
            (MouseButton::Middle, true) => (MouseFlags::MIDDLE_DOWN, 0),
            (MouseButton::Middle, false) => (MouseFlags::MIDDLE_UP, 0),
            (MouseButton::X1, true) => (MouseFlags::X_DOWN, XBUTTON1),
            (MouseButton::X1, false) => (MouseFlags::X_UP, XBUTTON1),
            (MouseButton::X2, true) => (MouseFlags::X_DOWN, XBUTTON2),
            (MouseButton::X2, false) => (MouseFlags::X_UP, XBUTTON2),
        }
    }
}

impl std::str::FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "x1" | "xbutton1" => Ok(MouseButton::X1),
            "x2" | "xbutton2" => Ok(MouseButton::X2),
            other => Err(format!("unknown mouse button: {other}")),
        }
    }
}

/// Direction of vertical wheel travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelDirection {
    /// Away from the user (scroll up).
    Forward,
    /// Towards the user (scroll down).
    Backward,
}

/// Wheel delta for `notches` of travel; positive is forward.
///
/// Saturates at `i32::MAX` in either direction; the magnitude never wraps
/// into the opposite sign.
pub fn wheel_delta(direction: WheelDirection, notches: u32) -> i32 {
    let magnitude = i32::try_from(notches)
        .unwrap_or(i32::MAX)
        .saturating_mul(WHEEL_DELTA);
    match direction {
        WheelDirection::Forward => magnitude,
        WheelDirection::Backward => -magnitude,
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a pointer record.
///
/// Absolute requests get `VIRTUALDESK` so coordinates span every monitor.
/// Motion always gets `MOVE_NOCOALESCE`: automation needs each move to be a
/// discrete, observable event.  `dx`/`dy` must already be normalised when
/// `ABSOLUTE` is set.
pub fn mouse(dx: i32, dy: i32, data: i32, flags: MouseFlags) -> HardwareInput {
    let mut flags = flags;
    if flags.contains(MouseFlags::ABSOLUTE) {
        flags |= MouseFlags::VIRTUALDESK;
    }
    if flags.contains(MouseFlags::MOVE) {
        flags |= MouseFlags::MOVE_NOCOALESCE;
    }

    HardwareInput::Mouse(MouseInput {
        dx,
        dy,
        // Win32 reads mouseData as signed for wheel events; `as u32`
        // reinterprets the bits.
        mouse_data: data as u32,
        flags,
        time: 0,
        extra_info: 0,
    })
}

/// Encode a scan-code keyboard record for a resolved key.
pub fn key(token: &KeyToken, press: bool) -> HardwareInput {
    let mut flags = KeyFlags::NONE;
    if token.scan > 0 {
        flags |= KeyFlags::SCANCODE;
    }
    if !press {
        flags |= KeyFlags::KEY_UP;
    }
    if token.extended {
        flags |= KeyFlags::EXTENDED_KEY;
    }

    HardwareInput::Keyboard(KeyboardInput {
        vk: token.vk,
        scan: token.scan,
        flags,
        time: 0,
        extra_info: 0,
    })
}

/// Encode a Unicode keyboard record for one UTF-16 code unit.
pub fn unicode(unit: u16, press: bool) -> HardwareInput {
    let flags = if press {
        KeyFlags::UNICODE
    } else {
        KeyFlags::UNICODE | KeyFlags::KEY_UP
    };

    HardwareInput::Keyboard(KeyboardInput {
        vk: 0,
        scan: unit,
        flags,
        time: 0,
        extra_info: 0,
    })
}

/// Encode a raw virtual-key record (no scan code).
///
/// For keys that have no physical position, where a scan code would be
/// meaningless.
pub fn virtual_key(vk: u16, press: bool) -> HardwareInput {
    let flags = if press { KeyFlags::NONE } else { KeyFlags::KEY_UP };

    HardwareInput::Keyboard(KeyboardInput {
        vk,
        scan: 0,
        flags,
        time: 0,
        extra_info: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::vk;

    fn token(vk: u16, scan: u16, extended: bool) -> KeyToken {
        KeyToken {
            text: String::new(),
            vk,
            scan,
            extended,
        }
    }

    #[test]
    fn test_move_always_requests_no_coalesce() {
        let rec = mouse(10, 10, 0, MouseFlags::MOVE);
        let mi = rec.as_mouse().unwrap();
        assert!(mi.flags.contains(MouseFlags::MOVE_NOCOALESCE));
        assert!(!mi.flags.contains(MouseFlags::VIRTUALDESK));
    }

    #[test]
    fn test_absolute_adds_virtual_desk() {
        let rec = mouse(1, 2, 0, MouseFlags::LEFT_DOWN | MouseFlags::ABSOLUTE);
        let mi = rec.as_mouse().unwrap();
        assert!(mi.flags.contains(MouseFlags::VIRTUALDESK));
        assert!(!mi.flags.contains(MouseFlags::MOVE_NOCOALESCE));
    }

    #[test]
    fn test_negative_wheel_delta_preserves_bits() {
        let rec = mouse(0, 0, -240, MouseFlags::WHEEL);
        assert_eq!(rec.as_mouse().unwrap().mouse_data as i32, -240);
        assert!(rec.is_wheel());
    }

    #[test]
    fn test_key_record_sets_scancode_and_extended() {
        let down = key(&token(vk::HOME, 0x47, true), true);
        let ki = down.as_keyboard().unwrap();
        assert!(ki.flags.contains(KeyFlags::SCANCODE));
        assert!(ki.is_extended());
        assert!(!ki.is_key_up());

        let up = key(&token(vk::HOME, 0x47, true), false);
        assert!(up.as_keyboard().unwrap().is_key_up());
        assert!(up.as_keyboard().unwrap().is_extended());
    }

    #[test]
    fn test_key_without_scan_code_omits_scancode_flag() {
        let rec = key(&token(0xFF, 0, false), true);
        assert_eq!(rec.as_keyboard().unwrap().flags, KeyFlags::NONE);
    }

    #[test]
    fn test_unicode_record_zeroes_vk() {
        let rec = unicode('é' as u16, false);
        let ki = rec.as_keyboard().unwrap();
        assert_eq!(ki.vk, 0);
        assert_eq!(ki.scan, 0x00E9);
        assert!(ki.is_unicode() && ki.is_key_up());
        assert!(!ki.flags.contains(KeyFlags::SCANCODE));
    }

    #[test]
    fn test_records_carry_zero_time_and_extra_info() {
        for rec in [mouse(0, 0, 0, MouseFlags::MOVE), virtual_key(0x41, true)] {
            match rec {
                HardwareInput::Mouse(mi) => assert_eq!((mi.time, mi.extra_info), (0, 0)),
                HardwareInput::Keyboard(ki) => assert_eq!((ki.time, ki.extra_info), (0, 0)),
            }
        }
    }

    #[test]
    fn test_wheel_delta_sign() {
        assert_eq!(wheel_delta(WheelDirection::Forward, 3), 360);
        assert_eq!(wheel_delta(WheelDirection::Backward, 1), -120);
    }

    #[test]
    fn test_wheel_delta_saturates_without_flipping_sign() {
        for notches in [1u32 << 31, 3_000_000_000, u32::MAX] {
            assert_eq!(wheel_delta(WheelDirection::Forward, notches), i32::MAX);
            assert_eq!(wheel_delta(WheelDirection::Backward, notches), -i32::MAX);
        }
        assert_eq!(wheel_delta(WheelDirection::Backward, 0), 0);
    }

    #[test]
    fn test_x_buttons_carry_button_number() {
        assert_eq!(MouseButton::X2.flags(true), (MouseFlags::X_DOWN, XBUTTON2));
        assert_eq!("Right".parse::<MouseButton>(), Ok(MouseButton::Right));
        assert!("fourth".parse::<MouseButton>().is_err());
    }
}
