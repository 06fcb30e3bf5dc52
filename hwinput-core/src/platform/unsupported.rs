//! Backend for hosts without a Win32 input queue.
//!
//! Lets the CLI and FFI crates build everywhere.  Every submission is
//! rejected, so callers get an ordinary `PlatformSubmissionError` instead of
//! a silent no-op.

use crate::geometry::VirtualDesktop;
use crate::keys::{KeyScan, KeyboardLayout};
use crate::platform::InputPlatform;
use crate::record::HardwareInput;

/// `ERROR_CALL_NOT_IMPLEMENTED`, reported for every rejected submission.
pub const ERROR_CALL_NOT_IMPLEMENTED: u32 = 120;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl KeyboardLayout for UnsupportedPlatform {
    fn scan_code(&self, _vk: u16) -> u16 {
        0
    }

    fn char_to_key(&self, _ch: char) -> Option<KeyScan> {
        None
    }
}

impl InputPlatform for UnsupportedPlatform {
    fn send_input(&self, records: &[HardwareInput]) -> u32 {
        log::warn!(
            "dropping {} input record(s): no input queue on this platform",
            records.len()
        );
        0
    }

    fn last_error(&self) -> u32 {
        ERROR_CALL_NOT_IMPLEMENTED
    }

    fn virtual_desktop(&self) -> VirtualDesktop {
        VirtualDesktop::new(0, 0, 0, 0)
    }

    fn primary_button_swapped(&self) -> bool {
        false
    }

    fn async_key_state(&self, _vk: u16) -> i16 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_rejects_everything() {
        let p = UnsupportedPlatform;
        assert_eq!(p.send_input(&[record::virtual_key(0x41, true)]), 0);
        assert_eq!(p.last_error(), ERROR_CALL_NOT_IMPLEMENTED);
        assert_eq!(p.async_key_state(0x41), 0);
    }
}
