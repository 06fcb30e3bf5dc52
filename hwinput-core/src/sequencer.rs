//! Sequencer: logical requests -> ordered atomic input actions.
//!
//! Every public method is one logical request.  It resolves everything it
//! can up front (chord parsing fails before any record is sent), then
//! submits records one at a time through the [`SubmissionGate`], stopping at
//! the first rejection.  Nothing is retried.
//!
//! # Ordering
//!
//! - Chords press members in the order given and release them in exactly
//!   the reverse order, so a leading modifier is released last.
//! - Key sequences (`"^a{DEL}"`) hold a prefix modifier for one key and
//!   release every held modifier after it.
//! - Strings are typed as Unicode press/release pairs, with an optional
//!   pause every N characters to keep the target's input buffer from
//!   overflowing.
//! - Clicks move first, then read the primary-button mapping fresh, then
//!   press and release whichever physical button is currently primary.
//!
//! # Concurrency
//!
//! Modifier latches and button mapping are global, so overlapping requests
//! would corrupt each other's release order.  Each request holds a
//! process-wide re-entrant lock for its whole duration; callers in other
//! processes must still serialize themselves.

use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::config::Pacing;
use crate::element::ClickablePoint;
use crate::errors::InjectionError;
use crate::gate::SubmissionGate;
use crate::geometry::ScreenPoint;
use crate::keys::{self, vk, KeyToken};
use crate::platform::InputPlatform;
use crate::record::{self, wheel_delta, MouseButton, MouseFlags, WheelDirection, WHEEL_DELTA};

/// Keys released by [`Sequencer::release_held_modifiers`].
pub const RESET_KEYS: &[u16] = &[
    vk::LMENU,
    vk::RMENU,
    vk::LSHIFT,
    vk::RSHIFT,
    vk::LCONTROL,
    vk::RCONTROL,
    vk::LWIN,
    vk::RWIN,
    vk::CAPITAL,
    vk::NUMLOCK,
    vk::SCROLL,
];

static INJECTION_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn injection_lock() -> ReentrantMutexGuard<'static, ()> {
    INJECTION_LOCK.get_or_init(|| ReentrantMutex::new(())).lock()
}

/// Turns logical input requests into submitted hardware records.
pub struct Sequencer<P> {
    platform: P,
    pacing: Pacing,
}

impl<P: InputPlatform> Sequencer<P> {
    pub fn new(platform: P) -> Self {
        Self::with_pacing(platform, Pacing::default())
    }

    pub fn with_pacing(platform: P, pacing: Pacing) -> Self {
        Self { platform, pacing }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = pacing;
    }

    fn gate(&self) -> SubmissionGate<'_, P> {
        SubmissionGate::new(&self.platform)
    }

    /// Pacing wait; zero skips the platform call entirely.
    fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            self.platform.pause(duration);
        }
    }

    // -----------------------------------------------------------------------
    // Keyboard
    // -----------------------------------------------------------------------

    /// Parse and send a chord such as `"Ctrl+Shift+Home"` with the
    /// configured inter-key delay.
    pub fn send_chord(&self, chord: &str) -> Result<(), InjectionError> {
        self.send_chord_with_delay(chord, self.pacing.key_delay())
    }

    /// Parse and send a chord, waiting `delay` after every press and
    /// release.
    pub fn send_chord_with_delay(&self, chord: &str, delay: Duration) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let tokens = keys::parse_chord(chord, &self.platform)?;
        log::debug!("chord {chord:?} -> {} key(s)", tokens.len());
        self.press_chord(&tokens, delay)
    }

    /// Press `tokens` in order, then release them in reverse order.
    pub fn press_chord(&self, tokens: &[KeyToken], delay: Duration) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let gate = self.gate();

        for token in tokens {
            gate.submit(&record::key(token, true))?;
            self.wait(delay);
        }
        for token in tokens.iter().rev() {
            gate.submit(&record::key(token, false))?;
            self.wait(delay);
        }
        Ok(())
    }

    /// Parse and send a key sequence such as `"^a{DEL}+{HOME 2}"`.
    ///
    /// The whole sequence is parsed before anything is submitted.  Records
    /// go out back to back with no pacing.  Returns how many were sent.
    pub fn send_keys(&self, text: &str) -> Result<usize, InjectionError> {
        let _guard = injection_lock();
        let strokes = keys::parse_keys(text, &self.platform)?;
        log::debug!("key sequence {text:?} -> {} stroke(s)", strokes.len());
        let records: Vec<_> = strokes
            .iter()
            .map(|stroke| record::key(&stroke.token, stroke.press))
            .collect();
        self.gate().submit_all(&records)
    }

    /// Press (without releasing) the key(s) named by `name`.
    ///
    /// A shifted symbol presses left shift first.
    pub fn press_key(&self, name: &str) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let tokens = keys::resolve(name, &self.platform)?;
        let gate = self.gate();
        for token in &tokens {
            gate.submit(&record::key(token, true))?;
        }
        Ok(())
    }

    /// Release the key(s) named by `name`, in reverse press order.
    pub fn release_key(&self, name: &str) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let tokens = keys::resolve(name, &self.platform)?;
        let gate = self.gate();
        for token in tokens.iter().rev() {
            gate.submit(&record::key(token, false))?;
        }
        Ok(())
    }

    /// Send a bare virtual-key event with no scan code.
    ///
    /// For virtual keys with no physical key behind them (e.g. private
    /// hotkeys), where a scan code would be meaningless.
    pub fn send_virtual_key(&self, vk: u16, press: bool) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.gate().submit(&record::virtual_key(vk, press))
    }

    /// Press one character as Unicode input (no layout involved).
    pub fn press_char(&self, ch: char) -> Result<(), InjectionError> {
        self.send_char(ch, true)
    }

    /// Release one character previously pressed with [`press_char`](Self::press_char).
    pub fn release_char(&self, ch: char) -> Result<(), InjectionError> {
        self.send_char(ch, false)
    }

    fn send_char(&self, ch: char, press: bool) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let gate = self.gate();
        let mut units = [0u16; 2];
        for &unit in ch.encode_utf16(&mut units).iter() {
            gate.submit(&record::unicode(unit, press))?;
        }
        Ok(())
    }

    /// Type `text` as fast as the queue accepts it, never pausing.
    ///
    /// Depending on how quickly the receiver drains its input, long strings
    /// can be truncated; use [`type_string_paced`](Self::type_string_paced)
    /// for those.
    pub fn type_string(&self, text: &str) -> Result<(), InjectionError> {
        self.type_chars(text, None, Duration::ZERO)
    }

    /// Type `text`, pausing for `pause` before every `every`-th character
    /// after the first batch.  A string of length L pauses
    /// `(L - 1) / every` times.
    pub fn type_string_paced(
        &self,
        text: &str,
        every: usize,
        pause: Duration,
    ) -> Result<(), InjectionError> {
        if every == 0 {
            return Err(InjectionError::ArgumentError(
                "sleep frequency must be at least 1".to_owned(),
            ));
        }
        self.type_chars(text, Some(every), pause)
    }

    fn type_chars(
        &self,
        text: &str,
        every: Option<usize>,
        pause: Duration,
    ) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        log::debug!("typing {} char(s)", text.chars().count());
        let gate = self.gate();
        let mut units = [0u16; 2];

        for (i, ch) in text.chars().enumerate() {
            if let Some(every) = every {
                if i > 0 && i % every == 0 {
                    self.platform.pause(pause);
                }
            }
            for &unit in ch.encode_utf16(&mut units).iter() {
                gate.submit(&record::unicode(unit, true))?;
                gate.submit(&record::unicode(unit, false))?;
            }
        }
        Ok(())
    }

    /// Whether the single key named by `name` is currently down.
    pub fn is_key_down(&self, name: &str) -> Result<bool, InjectionError> {
        let tokens = keys::resolve(name, &self.platform)?;
        match tokens.as_slice() {
            [token] => self.gate().query_key_state(token.vk),
            _ => Err(InjectionError::ArgumentError(format!(
                "{name:?} is a key combination, not a single key"
            ))),
        }
    }

    /// Release every modifier and lock key the OS reports as held.
    ///
    /// Returns how many keys were released.  Useful after a failed request
    /// left a chord half-pressed.  Every key in [`RESET_KEYS`] is checked;
    /// a neutral state response counts as "up" rather than ending the sweep.
    pub fn release_held_modifiers(&self) -> Result<usize, InjectionError> {
        let _guard = injection_lock();
        let gate = self.gate();
        let mut released = 0;

        for &vk in RESET_KEYS {
            if gate.is_held(vk) {
                let token = KeyToken::from_vk(format!("0x{vk:02X}"), vk, &self.platform);
                gate.submit(&record::key(&token, false))?;
                released += 1;
            }
        }
        if released > 0 {
            log::debug!("released {released} stuck key(s)");
        }
        Ok(released)
    }

    // -----------------------------------------------------------------------
    // Pointer
    // -----------------------------------------------------------------------

    /// Raw pointer primitive.
    ///
    /// With `ABSOLUTE`, `x`/`y` are desktop pixels and are normalised
    /// against the desktop rectangle read now.  `data` is the wheel delta or
    /// X button number.  Wheel records are followed by the wheel settle
    /// pause.
    pub fn send_mouse_input(
        &self,
        x: i32,
        y: i32,
        data: i32,
        flags: MouseFlags,
    ) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        let (dx, dy) = if flags.contains(MouseFlags::ABSOLUTE) {
            let desktop = self.platform.virtual_desktop();
            if !desktop.contains(ScreenPoint::new(x, y)) {
                log::warn!("({x}, {y}) is off the virtual desktop {desktop:?}, pinning to its edge");
            }
            desktop.normalize(x, y)?
        } else {
            (x, y)
        };

        let rec = record::mouse(dx, dy, data, flags);
        self.gate().submit(&rec)?;
        if rec.is_wheel() {
            self.wait(self.pacing.wheel_settle());
        }
        Ok(())
    }

    /// Move the pointer to a desktop pixel.
    pub fn move_to(&self, point: ScreenPoint) -> Result<(), InjectionError> {
        self.send_mouse_input(point.x, point.y, 0, MouseFlags::MOVE | MouseFlags::ABSOLUTE)
    }

    /// The physical button currently configured as primary.
    pub fn primary_button(&self) -> MouseButton {
        if self.platform.primary_button_swapped() {
            MouseButton::Right
        } else {
            MouseButton::Left
        }
    }

    /// Press `button` at `point` (no move record).
    pub fn mouse_down(&self, point: ScreenPoint, button: MouseButton) -> Result<(), InjectionError> {
        let (flag, data) = button.flags(true);
        self.send_mouse_input(point.x, point.y, data as i32, flag | MouseFlags::ABSOLUTE)
    }

    /// Release `button` at `point` (no move record).
    pub fn mouse_up(&self, point: ScreenPoint, button: MouseButton) -> Result<(), InjectionError> {
        let (flag, data) = button.flags(false);
        self.send_mouse_input(point.x, point.y, data as i32, flag | MouseFlags::ABSOLUTE)
    }

    /// Move to `point` and click the primary button.
    pub fn click(&self, point: ScreenPoint) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.move_to(point)?;
        let button = self.primary_button();
        log::debug!("click {button:?} at ({},{})", point.x, point.y);
        self.mouse_down(point, button)?;
        self.mouse_up(point, button)
    }

    /// Move to `point` and click a specific physical button.
    pub fn click_button(&self, point: ScreenPoint, button: MouseButton) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.move_to(point)?;
        self.mouse_down(point, button)?;
        self.mouse_up(point, button)
    }

    /// Two primary clicks at `point`.
    pub fn double_click(&self, point: ScreenPoint) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.click(point)?;
        self.click(point)
    }

    /// Move to the element's clickable point.
    pub fn move_to_element(&self, element: &dyn ClickablePoint) -> Result<(), InjectionError> {
        let point = element.clickable_point()?;
        self.move_to(point)
    }

    /// Move to the element's clickable point and click the primary button.
    pub fn click_element(&self, element: &dyn ClickablePoint) -> Result<(), InjectionError> {
        let point = element.clickable_point()?;
        self.click(point)
    }

    /// Move to `point` and turn the vertical wheel by `notches`.
    pub fn scroll(
        &self,
        point: ScreenPoint,
        direction: WheelDirection,
        notches: u32,
    ) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.move_to(point)?;
        // Move and wheel must be separate records.
        self.send_mouse_input(0, 0, wheel_delta(direction, notches), MouseFlags::WHEEL)
    }

    /// Move to `point` and turn the horizontal wheel; positive is right.
    pub fn scroll_horizontal(&self, point: ScreenPoint, notches: i32) -> Result<(), InjectionError> {
        let _guard = injection_lock();
        self.move_to(point)?;
        self.send_mouse_input(0, 0, notches.saturating_mul(WHEEL_DELTA), MouseFlags::HWHEEL)
    }

    /// Drag with the primary button from `from` to `to`, one pixel per step
    /// on each axis, pausing `drag_step` after every step.
    ///
    /// Returns the number of intermediate moves.
    pub fn drag(&self, from: ScreenPoint, to: ScreenPoint) -> Result<usize, InjectionError> {
        let _guard = injection_lock();
        let button = self.primary_button();

        self.move_to(from)?;
        self.mouse_down(from, button)?;

        let mut current = from;
        let mut steps = 0;
        while current != to {
            current.x += (to.x as i64 - current.x as i64).signum() as i32;
            current.y += (to.y as i64 - current.y as i64).signum() as i32;
            self.move_to(current)?;
            self.wait(self.pacing.drag_step());
            steps += 1;
        }

        self.mouse_up(to, button)?;
        log::debug!("dragged {steps} step(s) with {button:?}");
        Ok(steps)
    }
}
