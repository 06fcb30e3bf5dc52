//! Recording platform for tests.
//!
//! The real backend moves the cursor and presses keys on the test machine,
//! and needs an interactive desktop.  [`FakePlatform`] keeps everything in
//! memory instead: every submitted record and every pause is appended to a
//! log that assertions can inspect in order.
//!
//! Failures are scripted with [`FakePlatform::fail_on_submission`], which
//! rejects the Nth submission attempt with a chosen error code.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::geometry::VirtualDesktop;
use crate::keys::{vk, KeyScan, KeyboardLayout};
use crate::platform::InputPlatform;
use crate::record::{HardwareInput, KeyboardInput, MouseInput};

/// Offset the fake layout adds to a virtual key to produce its scan code,
/// so tests can tell the two fields apart.
pub const FAKE_SCAN_OFFSET: u16 = 0x0100;

#[derive(Debug)]
struct FakeState {
    records: Vec<HardwareInput>,
    attempts: usize,
    fail_on: Option<(usize, u32)>,
    last_error: u32,
    desktop: VirtualDesktop,
    swapped: bool,
    swap_queries: usize,
    key_states: HashMap<u16, i16>,
    pauses: Vec<Duration>,
}

/// In-memory [`InputPlatform`].
#[derive(Debug)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    /// A single 1920x1080 display at the origin, buttons not swapped, every
    /// key up.
    pub fn new() -> Self {
        Self::with_desktop(VirtualDesktop::new(0, 0, 1920, 1080))
    }

    pub fn with_desktop(desktop: VirtualDesktop) -> Self {
        Self {
            state: Mutex::new(FakeState {
                records: Vec::new(),
                attempts: 0,
                fail_on: None,
                last_error: 0,
                desktop,
                swapped: false,
                swap_queries: 0,
                key_states: HashMap::new(),
                pauses: Vec::new(),
            }),
        }
    }

    /// Reject the `attempt`-th submission (1-based, counted across the
    /// platform's lifetime) and report `code` as the last error.
    pub fn fail_on_submission(&self, attempt: usize, code: u32) {
        self.state.lock().fail_on = Some((attempt, code));
    }

    pub fn set_buttons_swapped(&self, swapped: bool) {
        self.state.lock().swapped = swapped;
    }

    pub fn set_desktop(&self, desktop: VirtualDesktop) {
        self.state.lock().desktop = desktop;
    }

    /// Script the raw `GetAsyncKeyState` response for `vk`.  Unscripted
    /// keys report "up" (`1`, low bit only).
    pub fn set_key_state(&self, vk: u16, response: i16) {
        self.state.lock().key_states.insert(vk, response);
    }

    /// Every accepted record, in submission order.
    pub fn records(&self) -> Vec<HardwareInput> {
        self.state.lock().records.clone()
    }

    pub fn keyboard_records(&self) -> Vec<KeyboardInput> {
        self.records()
            .iter()
            .filter_map(|r| r.as_keyboard().copied())
            .collect()
    }

    pub fn mouse_records(&self) -> Vec<MouseInput> {
        self.records()
            .iter()
            .filter_map(|r| r.as_mouse().copied())
            .collect()
    }

    /// Submission attempts, including rejected ones.
    pub fn submission_attempts(&self) -> usize {
        self.state.lock().attempts
    }

    pub fn swap_queries(&self) -> usize {
        self.state.lock().swap_queries
    }

    /// Every pause requested, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.state.lock().pauses.clone()
    }
}

impl KeyboardLayout for FakePlatform {
    fn scan_code(&self, vk: u16) -> u16 {
        vk + FAKE_SCAN_OFFSET
    }

    /// A US-English approximation of `VkKeyScan`.
    fn char_to_key(&self, ch: char) -> Option<KeyScan> {
        let plain = |vk| KeyScan {
            vk,
            shift: false,
            ctrl: false,
            alt: false,
        };
        let shifted = |vk| KeyScan {
            shift: true,
            ..plain(vk)
        };

        Some(match ch {
            'a'..='z' => plain(vk::A + (ch as u16 - 'a' as u16)),
            'A'..='Z' => shifted(vk::A + (ch as u16 - 'A' as u16)),
            '0'..='9' => plain(vk::D0 + (ch as u16 - '0' as u16)),
            ' ' => plain(vk::SPACE),
            '\t' => plain(vk::TAB),
            '\n' => plain(vk::RETURN),
            ';' => plain(vk::OEM_1),
            ':' => shifted(vk::OEM_1),
            '=' => plain(vk::OEM_PLUS),
            '+' => shifted(vk::OEM_PLUS),
            ',' => plain(vk::OEM_COMMA),
            '<' => shifted(vk::OEM_COMMA),
            '-' => plain(vk::OEM_MINUS),
            '_' => shifted(vk::OEM_MINUS),
            '.' => plain(vk::OEM_PERIOD),
            '>' => shifted(vk::OEM_PERIOD),
            '/' => plain(vk::OEM_2),
            '?' => shifted(vk::OEM_2),
            '`' => plain(vk::OEM_3),
            '[' => plain(vk::OEM_4),
            '{' => shifted(vk::OEM_4),
            '\\' => plain(vk::OEM_5),
            '|' => shifted(vk::OEM_5),
            ']' => plain(vk::OEM_6),
            '}' => shifted(vk::OEM_6),
            '\'' => plain(vk::OEM_7),
            '"' => shifted(vk::OEM_7),
            _ => return None,
        })
    }
}

impl InputPlatform for FakePlatform {
    fn send_input(&self, records: &[HardwareInput]) -> u32 {
        let mut state = self.state.lock();
        state.attempts += 1;
        if let Some((attempt, code)) = state.fail_on {
            if attempt == state.attempts {
                state.last_error = code;
                return 0;
            }
        }
        state.records.extend_from_slice(records);
        records.len() as u32
    }

    fn last_error(&self) -> u32 {
        self.state.lock().last_error
    }

    fn virtual_desktop(&self) -> VirtualDesktop {
        self.state.lock().desktop
    }

    fn primary_button_swapped(&self) -> bool {
        let mut state = self.state.lock();
        state.swap_queries += 1;
        state.swapped
    }

    fn async_key_state(&self, vk: u16) -> i16 {
        self.state.lock().key_states.get(&vk).copied().unwrap_or(1)
    }

    fn pause(&self, duration: Duration) {
        self.state.lock().pauses.push(duration);
    }
}
