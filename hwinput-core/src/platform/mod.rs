//! The boundary between the sequencer and OS-owned input state.
//!
//! Modifier latches, the primary-button mapping and the desktop layout are
//! global OS resources.  They are reached only through [`InputPlatform`] and
//! re-read on every request, never cached.
//!
//! | Backend | When |
//! |---------|------|
//! | [`win32::Win32Platform`] | Windows: `SendInput`, `GetSystemMetrics`, ... |
//! | [`unsupported::UnsupportedPlatform`] | Other hosts: every submission is rejected |
//! | [`fake::FakePlatform`] | Tests: records submissions and pauses |

use std::time::Duration;

use crate::geometry::VirtualDesktop;
use crate::keys::KeyboardLayout;
use crate::record::HardwareInput;

pub mod fake;

#[cfg(windows)]
pub mod win32;

#[cfg(not(windows))]
pub mod unsupported;

/// OS services needed to inject input.
pub trait InputPlatform: KeyboardLayout {
    /// Submit records to the input queue; returns how many were accepted.
    fn send_input(&self, records: &[HardwareInput]) -> u32;

    /// Platform error code describing the most recent failed call.
    fn last_error(&self) -> u32;

    /// Current bounding rectangle of all displays.
    fn virtual_desktop(&self) -> VirtualDesktop;

    /// Whether the right button is currently configured as primary.
    fn primary_button_swapped(&self) -> bool;

    /// Raw `GetAsyncKeyState` response: high bit set while the key is down,
    /// `0` when the query could not be serviced.
    fn async_key_state(&self, vk: u16) -> i16;

    /// Block the calling thread.  Pacing goes through here so test doubles
    /// can observe it.
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// The backend for the host OS.
#[cfg(windows)]
pub type NativePlatform = win32::Win32Platform;

/// The backend for the host OS.
#[cfg(not(windows))]
pub type NativePlatform = unsupported::UnsupportedPlatform;

/// Construct the host backend.
pub fn native() -> NativePlatform {
    NativePlatform::default()
}
