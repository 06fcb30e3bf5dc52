//! C ABI DLL for hwinput -- loadable by ctypes, C#, or any FFI consumer.
//!
//! All exported functions follow the convention:
//! - Return `i32` status code: `HWINPUT_OK=0`, `HWINPUT_ERROR=-1`
//! - Last error retrievable via `hwinput_last_error()`
//!
//! Every call builds a sequencer over the host backend with default pacing.

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::ptr;
use std::time::Duration;

use hwinput_core::{native_sequencer, InjectionError, MouseButton, Pacing, ScreenPoint, WheelDirection};

pub const HWINPUT_OK: i32 = 0;
pub const HWINPUT_ERROR: i32 = -1;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    log::debug!("hwinput_ffi: {msg}");
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn status(result: Result<(), InjectionError>) -> i32 {
    match result {
        Ok(()) => HWINPUT_OK,
        Err(e) => {
            set_last_error(&e.to_string());
            HWINPUT_ERROR
        }
    }
}

/// Borrow a C string argument as UTF-8, recording why when it can't be.
///
/// # Safety
///
/// `ptr` must be null or a valid null-terminated C string that outlives `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &str) -> Option<&'a str> {
    if ptr.is_null() {
        set_last_error(&format!("{name} is null"));
        return None;
    }
    match unsafe { CStr::from_ptr(ptr) }.to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8 in {name}: {e}"));
            None
        }
    }
}

/// Retrieve the last error message (thread-local).
///
/// Returns a pointer valid until the next failing hwinput_* call on this
/// thread.  Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn hwinput_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Press and release a `+`-separated chord such as `"Ctrl+Shift+Esc"`.
///
/// # Safety
///
/// `chord` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn hwinput_send_chord(chord: *const c_char) -> i32 {
    let Some(chord) = (unsafe { str_arg(chord, "chord") }) else {
        return HWINPUT_ERROR;
    };
    status(native_sequencer(Pacing::default()).send_chord(chord))
}

/// Send a key sequence such as `"^a{DEL}"`: `+`, `^` and `%` hold Shift,
/// Ctrl and Alt for the next key, `{NAME n}` taps a named key `n` times.
///
/// On success writes the number of key events sent to `out_count` when it
/// is non-null.
///
/// # Safety
///
/// `keys` must be a valid null-terminated UTF-8 C string; `out_count` must
/// be null or a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn hwinput_send_keys(keys: *const c_char, out_count: *mut u32) -> i32 {
    let Some(keys) = (unsafe { str_arg(keys, "keys") }) else {
        return HWINPUT_ERROR;
    };
    match native_sequencer(Pacing::default()).send_keys(keys) {
        Ok(count) => {
            if !out_count.is_null() {
                unsafe { *out_count = count as u32 };
            }
            HWINPUT_OK
        }
        Err(e) => {
            set_last_error(&e.to_string());
            HWINPUT_ERROR
        }
    }
}

/// Type Unicode text.  With `every > 0`, pause `pause_ms` before every
/// `every`-th character after the first batch.
///
/// # Safety
///
/// `text` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn hwinput_type_string(
    text: *const c_char,
    every: u32,
    pause_ms: u32,
) -> i32 {
    let Some(text) = (unsafe { str_arg(text, "text") }) else {
        return HWINPUT_ERROR;
    };
    let seq = native_sequencer(Pacing::default());
    status(if every == 0 {
        seq.type_string(text)
    } else {
        seq.type_string_paced(text, every as usize, Duration::from_millis(pause_ms.into()))
    })
}

/// Move the cursor to desktop pixel coordinates.
#[no_mangle]
pub extern "C" fn hwinput_move_to(x: i32, y: i32) -> i32 {
    status(native_sequencer(Pacing::default()).move_to(ScreenPoint::new(x, y)))
}

/// Click at desktop pixel coordinates.
///
/// `button`: 0 = primary (honours swapped buttons), 1 = left, 2 = right,
/// 3 = middle, 4 = X1, 5 = X2.
#[no_mangle]
pub extern "C" fn hwinput_click(x: i32, y: i32, button: i32) -> i32 {
    let seq = native_sequencer(Pacing::default());
    let point = ScreenPoint::new(x, y);
    let button = match button {
        0 => return status(seq.click(point)),
        1 => MouseButton::Left,
        2 => MouseButton::Right,
        3 => MouseButton::Middle,
        4 => MouseButton::X1,
        5 => MouseButton::X2,
        other => {
            set_last_error(&format!("unknown button code {other}"));
            return HWINPUT_ERROR;
        }
    };
    status(seq.click_button(point, button))
}

/// Turn the vertical wheel at desktop pixel coordinates.  Positive
/// `notches` scroll up, negative scroll down.
#[no_mangle]
pub extern "C" fn hwinput_scroll(x: i32, y: i32, notches: i32) -> i32 {
    let direction = if notches < 0 {
        WheelDirection::Backward
    } else {
        WheelDirection::Forward
    };
    status(native_sequencer(Pacing::default()).scroll(
        ScreenPoint::new(x, y),
        direction,
        notches.unsigned_abs(),
    ))
}

/// Query whether a named key is held down.
///
/// # Safety
///
/// `key` must be a valid null-terminated UTF-8 C string; `out_down` must be
/// a valid pointer to a `bool`.
#[no_mangle]
pub unsafe extern "C" fn hwinput_key_state(key: *const c_char, out_down: *mut bool) -> i32 {
    if out_down.is_null() {
        set_last_error("out_down is null");
        return HWINPUT_ERROR;
    }
    let Some(key) = (unsafe { str_arg(key, "key") }) else {
        return HWINPUT_ERROR;
    };
    match native_sequencer(Pacing::default()).is_key_down(key) {
        Ok(down) => {
            unsafe { *out_down = down };
            HWINPUT_OK
        }
        Err(e) => {
            set_last_error(&e.to_string());
            HWINPUT_ERROR
        }
    }
}

/// Release every modifier and lock key reported as held.
///
/// # Safety
///
/// `out_count` must be null or a valid pointer to a `u32`.
#[no_mangle]
pub unsafe extern "C" fn hwinput_release_modifiers(out_count: *mut u32) -> i32 {
    match native_sequencer(Pacing::default()).release_held_modifiers() {
        Ok(count) => {
            if !out_count.is_null() {
                unsafe { *out_count = count as u32 };
            }
            HWINPUT_OK
        }
        Err(e) => {
            set_last_error(&e.to_string());
            HWINPUT_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let ptr = hwinput_last_error();
        assert!(!ptr.is_null());
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    #[test]
    fn test_null_chord_is_error() {
        assert_eq!(unsafe { hwinput_send_chord(ptr::null()) }, HWINPUT_ERROR);
        assert_eq!(last_error(), "chord is null");
    }

    #[test]
    fn test_unparseable_chord_sets_last_error() {
        let chord = CString::new("ctrl+notakey").unwrap();
        assert_eq!(unsafe { hwinput_send_chord(chord.as_ptr()) }, HWINPUT_ERROR);
        assert!(last_error().contains("notakey"));
    }

    #[test]
    fn test_send_keys_rejects_bad_repeat_count() {
        let keys = CString::new("{BACK many}").unwrap();
        let mut count = 7u32;
        let rc = unsafe { hwinput_send_keys(keys.as_ptr(), &mut count) };
        assert_eq!(rc, HWINPUT_ERROR);
        assert_eq!(count, 7);
        assert!(last_error().contains("repeat count"));
    }

    #[test]
    fn test_null_keys_is_error() {
        assert_eq!(
            unsafe { hwinput_send_keys(ptr::null(), ptr::null_mut()) },
            HWINPUT_ERROR
        );
        assert_eq!(last_error(), "keys is null");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0x66u8, 0xFF, 0x00];
        let rc = unsafe { hwinput_type_string(bytes.as_ptr() as *const c_char, 0, 0) };
        assert_eq!(rc, HWINPUT_ERROR);
        assert!(last_error().starts_with("Invalid UTF-8 in text"));
    }

    #[test]
    fn test_unknown_button_code() {
        assert_eq!(hwinput_click(0, 0, 9), HWINPUT_ERROR);
        assert_eq!(last_error(), "unknown button code 9");
    }

    #[test]
    fn test_key_state_rejects_combination() {
        let key = CString::new("@").unwrap();
        let mut down = false;
        let rc = unsafe { hwinput_key_state(key.as_ptr(), &mut down) };
        assert_eq!(rc, HWINPUT_ERROR);
        assert!(last_error().contains("combination"));
    }
}
