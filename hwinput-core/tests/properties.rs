//! End-to-end ordering and encoding guarantees, exercised through the public
//! API against the recording platform.

use std::time::Duration;

use hwinput_core::keys::{self, vk};
use hwinput_core::platform::fake::FakePlatform;
use hwinput_core::record::{KeyboardInput, MouseFlags};
use hwinput_core::{InjectionError, Pacing, ScreenPoint, Sequencer, VirtualDesktop};

fn sequencer() -> Sequencer<FakePlatform> {
    Sequencer::with_pacing(FakePlatform::new(), Pacing::immediate())
}

fn presses_and_releases(records: &[KeyboardInput]) -> (Vec<u16>, Vec<u16>) {
    let presses = records.iter().filter(|k| !k.is_key_up()).map(|k| k.vk).collect();
    let releases = records.iter().filter(|k| k.is_key_up()).map(|k| k.vk).collect();
    (presses, releases)
}

#[test]
fn test_chords_release_in_reverse_for_every_length() {
    let members = ["ctrl", "shift", "alt", "win", "f5", "home", "z"];
    for n in 1..=members.len() {
        let seq = sequencer();
        seq.send_chord(&members[..n].join("+")).unwrap();

        let records = seq.platform().keyboard_records();
        assert_eq!(records.len(), 2 * n);
        let (presses, mut releases) = presses_and_releases(&records);
        // All presses come before any release.
        assert!(records[..n].iter().all(|k| !k.is_key_up()));
        releases.reverse();
        assert_eq!(presses, releases, "chord of {n} member(s)");
    }
}

#[test]
fn test_every_shifted_symbol_is_shift_then_base() {
    let fake = FakePlatform::new();
    for (symbol, digit) in "!@#$%^&*()".chars().zip([1, 2, 3, 4, 5, 6, 7, 8, 9, 0]) {
        let tokens = keys::resolve(&symbol.to_string(), &fake).unwrap();
        let vks: Vec<u16> = tokens.iter().map(|t| t.vk).collect();
        assert_eq!(vks, vec![vk::LSHIFT, vk::D0 + digit], "symbol {symbol}");
    }
}

#[test]
fn test_centre_of_odd_desktop_and_pixel_buckets() {
    for extent in [3, 1023, 1921, 2561] {
        let desk = VirtualDesktop::new(0, 0, extent, extent);
        let (cx, cy) = desk.normalize(extent / 2, extent / 2).unwrap();
        for c in [cx, cy] {
            assert!((c as f64 - 32767.5).abs() <= 1.0, "extent {extent}: {c}");
        }
    }

    let desk = VirtualDesktop::new(-1280, 0, 3200, 1024);
    for px in desk.left..desk.left + desk.width {
        let (nx, _) = desk.normalize(px, 0).unwrap();
        let back = desk.left as i64 + (nx as i64 * desk.width as i64) / 65_536;
        assert_eq!(back, px as i64, "pixel {px} -> {nx}");
    }
}

#[test]
fn test_extended_flag_only_for_extended_keys() {
    let names = [
        "rightalt", "rightctrl", "numlock", "insert", "delete", "home", "end", "pageup",
        "pagedown", "up", "down", "left", "right", "apps", "win", "rwin", "ctrl", "shift",
        "alt", "a", "f1", "enter", "space", "escape", "tab", "numpad5", "pause",
    ];
    for name in names {
        let seq = sequencer();
        seq.send_chord(name).unwrap();
        let expected = keys::is_extended(keys::lookup(name).unwrap().vk);
        for record in seq.platform().keyboard_records() {
            assert_eq!(record.is_extended(), expected, "key {name}");
        }
    }
    assert!(keys::is_extended(vk::RCONTROL));
    assert!(!keys::is_extended(vk::LCONTROL));
    assert!(!keys::is_extended(vk::PAUSE));
}

#[test]
fn test_rejected_press_aborts_rest_of_chord() {
    let seq = sequencer();
    seq.platform().fail_on_submission(2, 5);

    let err = seq.send_chord("ctrl+shift+a").unwrap_err();
    assert_eq!(err, InjectionError::PlatformSubmissionError { code: 5 });
    assert_eq!(seq.platform().submission_attempts(), 2);

    let records = seq.platform().keyboard_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vk, vk::LCONTROL);
    assert!(!records[0].is_key_up());
}

#[test]
fn test_string_pacing_counts() {
    let seq = sequencer();
    seq.type_string_paced("0123456789", 3, Duration::from_millis(20))
        .unwrap();
    assert_eq!(seq.platform().pauses().len(), 3);
    assert_eq!(seq.platform().keyboard_records().len(), 20);

    let seq = sequencer();
    seq.type_string("0123456789").unwrap();
    assert!(seq.platform().pauses().is_empty());
}

#[test]
fn test_click_rereads_button_swap_each_time() {
    let seq = sequencer();
    let point = ScreenPoint::new(10, 10);

    seq.click(point).unwrap();
    seq.platform().set_buttons_swapped(true);
    seq.click(point).unwrap();
    seq.platform().set_buttons_swapped(false);
    seq.click(point).unwrap();

    assert_eq!(seq.platform().swap_queries(), 3);
    let downs: Vec<MouseFlags> = seq
        .platform()
        .mouse_records()
        .iter()
        .map(|m| m.flags)
        .filter(|f| f.intersects(MouseFlags::LEFT_DOWN | MouseFlags::RIGHT_DOWN))
        .collect();
    assert_eq!(downs.len(), 3);
    assert!(downs[0].contains(MouseFlags::LEFT_DOWN));
    assert!(downs[1].contains(MouseFlags::RIGHT_DOWN));
    assert!(downs[2].contains(MouseFlags::LEFT_DOWN));
}
