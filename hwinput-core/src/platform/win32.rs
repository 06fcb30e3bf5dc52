//! Win32 backend: `SendInput` and friends via `windows-rs`.
//!
//! # Safety
//!
//! `SendInput` only succeeds for a process allowed to inject into the
//! foreground window (same or lower integrity level, or UI Access).  When it
//! is not, the call returns 0 and `GetLastError` explains why; the gate turns
//! that into a `PlatformSubmissionError`.

use windows::Win32::Foundation::GetLastError;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, MapVirtualKeyW, SendInput, VkKeyScanW, INPUT, INPUT_0, INPUT_KEYBOARD,
    INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS, MAPVK_VK_TO_VSC, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_SWAPBUTTON, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use crate::geometry::VirtualDesktop;
use crate::keys::{KeyScan, KeyboardLayout};
use crate::platform::InputPlatform;
use crate::record::HardwareInput;

/// Pre-computed size of `INPUT` struct for `SendInput` calls.
const INPUT_SIZE: i32 = std::mem::size_of::<INPUT>() as i32;

/// The live Windows input queue.  Stateless; every query hits the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Platform;

/// Copy a platform-neutral record into a Win32 `INPUT`.
fn to_win32(record: &HardwareInput) -> INPUT {
    match *record {
        HardwareInput::Mouse(mi) => INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: mi.dx,
                    dy: mi.dy,
                    mouseData: mi.mouse_data,
                    dwFlags: MOUSE_EVENT_FLAGS(mi.flags.0),
                    time: mi.time,
                    dwExtraInfo: mi.extra_info,
                },
            },
        },
        HardwareInput::Keyboard(ki) => INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(ki.vk),
                    wScan: ki.scan,
                    dwFlags: KEYBD_EVENT_FLAGS(ki.flags.0),
                    time: ki.time,
                    dwExtraInfo: ki.extra_info,
                },
            },
        },
    }
}

impl KeyboardLayout for Win32Platform {
    fn scan_code(&self, vk: u16) -> u16 {
        let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) };
        (scan & 0xFFFF) as u16
    }

    fn char_to_key(&self, ch: char) -> Option<KeyScan> {
        // VkKeyScanW only takes a single UTF-16 unit.
        let unit = u16::try_from(ch as u32).ok()?;
        KeyScan::from_packed(unsafe { VkKeyScanW(unit) })
    }
}

impl InputPlatform for Win32Platform {
    fn send_input(&self, records: &[HardwareInput]) -> u32 {
        let inputs: Vec<INPUT> = records.iter().map(to_win32).collect();
        unsafe { SendInput(&inputs, INPUT_SIZE) }
    }

    fn last_error(&self) -> u32 {
        unsafe { GetLastError() }.0
    }

    fn virtual_desktop(&self) -> VirtualDesktop {
        unsafe {
            VirtualDesktop::new(
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        }
    }

    fn primary_button_swapped(&self) -> bool {
        unsafe { GetSystemMetrics(SM_SWAPBUTTON) != 0 }
    }

    fn async_key_state(&self, vk: u16) -> i16 {
        unsafe { GetAsyncKeyState(vk as i32) }
    }
}
