//! Key symbol table: logical key names -> virtual keys -> key tokens.
//!
//! A chord such as `"Ctrl+Shift+End"` is split on `+`, each piece is looked
//! up (case-insensitively) in a static table of named keys, and resolved to
//! one or more [`KeyToken`]s.  Shifted symbols (`!`, `@`, ...) expand to a
//! left-shift token followed by the base key.  Any other single character
//! goes through the keyboard layout's character lookup.
//!
//! Scan codes are never hard-coded here; they are physical and
//! layout-dependent, so every token asks the [`KeyboardLayout`] for one.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::InjectionError;

/// Win32 virtual-key codes used by the symbol table.
pub mod vk {
    pub const BACK: u16 = 0x08;
    pub const TAB: u16 = 0x09;
    pub const CLEAR: u16 = 0x0C;
    pub const RETURN: u16 = 0x0D;
    pub const SHIFT: u16 = 0x10;
    pub const CONTROL: u16 = 0x11;
    pub const MENU: u16 = 0x12;
    pub const PAUSE: u16 = 0x13;
    pub const CAPITAL: u16 = 0x14;
    pub const ESCAPE: u16 = 0x1B;
    pub const SPACE: u16 = 0x20;
    pub const PRIOR: u16 = 0x21;
    pub const NEXT: u16 = 0x22;
    pub const END: u16 = 0x23;
    pub const HOME: u16 = 0x24;
    pub const LEFT: u16 = 0x25;
    pub const UP: u16 = 0x26;
    pub const RIGHT: u16 = 0x27;
    pub const DOWN: u16 = 0x28;
    pub const SNAPSHOT: u16 = 0x2C;
    pub const INSERT: u16 = 0x2D;
    pub const DELETE: u16 = 0x2E;
    pub const HELP: u16 = 0x2F;
    /// `'0'`; digits run contiguously to `'9'` (0x39).
    pub const D0: u16 = 0x30;
    /// `'A'`; letters run contiguously to `'Z'` (0x5A).
    pub const A: u16 = 0x41;
    pub const LWIN: u16 = 0x5B;
    pub const RWIN: u16 = 0x5C;
    pub const APPS: u16 = 0x5D;
    pub const SLEEP: u16 = 0x5F;
    pub const NUMPAD0: u16 = 0x60;
    pub const MULTIPLY: u16 = 0x6A;
    pub const ADD: u16 = 0x6B;
    pub const SEPARATOR: u16 = 0x6C;
    pub const SUBTRACT: u16 = 0x6D;
    pub const DECIMAL: u16 = 0x6E;
    pub const DIVIDE: u16 = 0x6F;
    /// F1; function keys run contiguously to F24 (0x87).
    pub const F1: u16 = 0x70;
    pub const NUMLOCK: u16 = 0x90;
    pub const SCROLL: u16 = 0x91;
    pub const LSHIFT: u16 = 0xA0;
    pub const RSHIFT: u16 = 0xA1;
    pub const LCONTROL: u16 = 0xA2;
    pub const RCONTROL: u16 = 0xA3;
    pub const LMENU: u16 = 0xA4;
    pub const RMENU: u16 = 0xA5;
    pub const OEM_1: u16 = 0xBA;
    pub const OEM_PLUS: u16 = 0xBB;
    pub const OEM_COMMA: u16 = 0xBC;
    pub const OEM_MINUS: u16 = 0xBD;
    pub const OEM_PERIOD: u16 = 0xBE;
    pub const OEM_2: u16 = 0xBF;
    pub const OEM_3: u16 = 0xC0;
    pub const OEM_4: u16 = 0xDB;
    pub const OEM_5: u16 = 0xDC;
    pub const OEM_6: u16 = 0xDD;
    pub const OEM_7: u16 = 0xDE;
}

/// Separator between chord members, e.g. `"Ctrl+A"`.
pub const CHORD_SEPARATOR: char = '+';

/// Keys that need `KEYEVENTF_EXTENDEDKEY` on both press and release.
///
/// Right Alt/Ctrl, Num Lock, the navigation cluster, the arrows, the
/// context-menu key and both Windows keys.  Break is *not* extended despite
/// what the SDK docs say.
pub const EXTENDED_KEYS: &[u16] = &[
    vk::RMENU,
    vk::RCONTROL,
    vk::NUMLOCK,
    vk::INSERT,
    vk::DELETE,
    vk::HOME,
    vk::END,
    vk::PRIOR,
    vk::NEXT,
    vk::UP,
    vk::DOWN,
    vk::LEFT,
    vk::RIGHT,
    vk::APPS,
    vk::RWIN,
    vk::LWIN,
];

/// Whether `vk` belongs to the fixed extended-key set.
pub fn is_extended(vk: u16) -> bool {
    EXTENDED_KEYS.contains(&vk)
}

/// Translation services owned by the active keyboard layout.
pub trait KeyboardLayout {
    /// Hardware scan code for a virtual key (`MapVirtualKey(vk, VK_TO_VSC)`).
    /// Returns 0 when the layout has no mapping.
    fn scan_code(&self, vk: u16) -> u16;

    /// Virtual key and modifier state that produce `ch` (`VkKeyScan`).
    fn char_to_key(&self, ch: char) -> Option<KeyScan>;
}

/// Result of a character -> key lookup in the active layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyScan {
    pub vk: u16,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyScan {
    /// Decode the packed `VkKeyScan` result: low byte is the virtual key,
    /// high byte the shift state bits (1 = Shift, 2 = Ctrl, 4 = Alt).
    /// `-1` in both bytes means no key produces the character.
    pub fn from_packed(packed: i16) -> Option<Self> {
        let raw = packed as u16;
        let vk = raw & 0x00FF;
        let state = raw >> 8;
        if vk == 0x00FF && state == 0x00FF {
            return None;
        }
        Some(Self {
            vk,
            shift: state & 0x1 != 0,
            ctrl: state & 0x2 != 0,
            alt: state & 0x4 != 0,
        })
    }
}

/// One entry of the static symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySymbol {
    pub vk: u16,
    /// The symbol is typed with left shift held (e.g. `!` = Shift+1).
    pub requires_shift: bool,
}

/// A fully resolved key, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyToken {
    /// Text the token was parsed from (for diagnostics).
    pub text: String,
    pub vk: u16,
    pub scan: u16,
    pub extended: bool,
}

impl KeyToken {
    /// Build a token for `vk`, asking `layout` for the scan code.
    pub fn from_vk<L: KeyboardLayout + ?Sized>(text: impl Into<String>, vk: u16, layout: &L) -> Self {
        Self {
            text: text.into(),
            vk,
            scan: layout.scan_code(vk),
            extended: is_extended(vk),
        }
    }
}

const NAMED_KEYS: &[(&str, u16)] = &[
    ("space", vk::SPACE),
    ("~", vk::OEM_3),
    // Generic modifiers press the left-hand physical key.
    ("shift", vk::LSHIFT),
    ("ctrl", vk::LCONTROL),
    ("control", vk::LCONTROL),
    ("alt", vk::LMENU),
    ("leftshift", vk::LSHIFT),
    ("lshift", vk::LSHIFT),
    ("rightshift", vk::RSHIFT),
    ("rshift", vk::RSHIFT),
    ("leftctrl", vk::LCONTROL),
    ("lctrl", vk::LCONTROL),
    ("rightctrl", vk::RCONTROL),
    ("rctrl", vk::RCONTROL),
    ("leftalt", vk::LMENU),
    ("lalt", vk::LMENU),
    ("rightalt", vk::RMENU),
    ("ralt", vk::RMENU),
    ("win", vk::LWIN),
    ("lwin", vk::LWIN),
    ("rwin", vk::RWIN),
    ("apps", vk::APPS),
    ("enter", vk::RETURN),
    ("return", vk::RETURN),
    ("tab", vk::TAB),
    ("escape", vk::ESCAPE),
    ("esc", vk::ESCAPE),
    ("back", vk::BACK),
    ("backspace", vk::BACK),
    ("clear", vk::CLEAR),
    ("insert", vk::INSERT),
    ("ins", vk::INSERT),
    ("delete", vk::DELETE),
    ("del", vk::DELETE),
    ("home", vk::HOME),
    ("end", vk::END),
    ("pageup", vk::PRIOR),
    ("prior", vk::PRIOR),
    ("pagedown", vk::NEXT),
    ("next", vk::NEXT),
    ("up", vk::UP),
    ("down", vk::DOWN),
    ("left", vk::LEFT),
    ("right", vk::RIGHT),
    ("numlock", vk::NUMLOCK),
    ("capslock", vk::CAPITAL),
    ("capital", vk::CAPITAL),
    ("scroll", vk::SCROLL),
    ("scrolllock", vk::SCROLL),
    ("pause", vk::PAUSE),
    ("printscreen", vk::SNAPSHOT),
    ("snapshot", vk::SNAPSHOT),
    ("help", vk::HELP),
    ("sleep", vk::SLEEP),
    ("multiply", vk::MULTIPLY),
    ("add", vk::ADD),
    ("separator", vk::SEPARATOR),
    ("subtract", vk::SUBTRACT),
    ("decimal", vk::DECIMAL),
    ("divide", vk::DIVIDE),
    ("oemtilde", vk::OEM_3),
    ("oemplus", vk::OEM_PLUS),
    ("oemminus", vk::OEM_MINUS),
    ("oemcomma", vk::OEM_COMMA),
    ("oemperiod", vk::OEM_PERIOD),
    ("oemquestion", vk::OEM_2),
    ("oemsemicolon", vk::OEM_1),
    ("oemquotes", vk::OEM_7),
    ("oemopenbrackets", vk::OEM_4),
    ("oemclosebrackets", vk::OEM_6),
    ("oempipe", vk::OEM_5),
];

/// Shifted symbols on the digit row: symbol -> base digit key.
const SHIFTED_SYMBOLS: &[(char, u16)] = &[
    ('!', vk::D0 + 1),
    ('@', vk::D0 + 2),
    ('#', vk::D0 + 3),
    ('$', vk::D0 + 4),
    ('%', vk::D0 + 5),
    ('^', vk::D0 + 6),
    ('&', vk::D0 + 7),
    ('*', vk::D0 + 8),
    ('(', vk::D0 + 9),
    (')', vk::D0),
];

static SYMBOL_TABLE: OnceLock<HashMap<String, KeySymbol>> = OnceLock::new();

fn symbol_table() -> &'static HashMap<String, KeySymbol> {
    SYMBOL_TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(NAMED_KEYS.len() + 96);
        let plain = |vk| KeySymbol { vk, requires_shift: false };

        for &(name, vk) in NAMED_KEYS {
            table.insert(name.to_owned(), plain(vk));
        }
        for i in 0..10u16 {
            let digit = vk::D0 + i;
            table.insert(i.to_string(), plain(digit));
            table.insert(format!("d{i}"), plain(digit));
            table.insert(format!("numpad{i}"), plain(vk::NUMPAD0 + i));
        }
        for (i, letter) in ('a'..='z').enumerate() {
            table.insert(letter.to_string(), plain(vk::A + i as u16));
        }
        for i in 0..24u16 {
            table.insert(format!("f{}", i + 1), plain(vk::F1 + i));
        }
        for &(symbol, base) in SHIFTED_SYMBOLS {
            table.insert(
                symbol.to_string(),
                KeySymbol {
                    vk: base,
                    requires_shift: true,
                },
            );
        }
        table
    })
}

/// Look up a key name in the static table (case-insensitive).
pub fn lookup(name: &str) -> Option<KeySymbol> {
    symbol_table().get(&name.trim().to_lowercase()).copied()
}

/// Resolve one chord member into the ordered tokens that type it.
///
/// Returns one token for plain keys, `[LShift, base]` for shifted symbols,
/// and for layout-resolved characters any required modifiers (Ctrl, Alt,
/// Shift, in that order) followed by the key.
pub fn resolve<L: KeyboardLayout + ?Sized>(
    token: &str,
    layout: &L,
) -> Result<Vec<KeyToken>, InjectionError> {
    let text = token.trim();
    if text.is_empty() {
        return Err(InjectionError::ParseError("empty key token".to_owned()));
    }

    if let Some(symbol) = lookup(text) {
        let mut tokens = Vec::with_capacity(2);
        if symbol.requires_shift {
            tokens.push(KeyToken::from_vk("shift", vk::LSHIFT, layout));
        }
        tokens.push(KeyToken::from_vk(text, symbol.vk, layout));
        return Ok(tokens);
    }

    let mut chars = text.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Some(scan) = layout.char_to_key(ch) {
            let mut tokens = Vec::with_capacity(4);
            if scan.ctrl {
                tokens.push(KeyToken::from_vk("ctrl", vk::LCONTROL, layout));
            }
            if scan.alt {
                tokens.push(KeyToken::from_vk("alt", vk::LMENU, layout));
            }
            if scan.shift {
                tokens.push(KeyToken::from_vk("shift", vk::LSHIFT, layout));
            }
            tokens.push(KeyToken::from_vk(text, scan.vk, layout));
            return Ok(tokens);
        }
    }

    Err(InjectionError::ParseError(format!(
        "unrecognized key token {text:?}"
    )))
}

/// Parse a `+`-separated chord into its ordered key tokens.
///
/// Empty segments are skipped.  Any unrecognized member fails the whole
/// chord, so nothing is submitted for a partially valid chord.
pub fn parse_chord<L: KeyboardLayout + ?Sized>(
    chord: &str,
    layout: &L,
) -> Result<Vec<KeyToken>, InjectionError> {
    let mut tokens = Vec::new();
    for member in chord
        .split(CHORD_SEPARATOR)
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        tokens.extend(resolve(member, layout)?);
    }

    if tokens.is_empty() {
        return Err(InjectionError::ParseError(format!(
            "chord {chord:?} contains no keys"
        )));
    }
    Ok(tokens)
}

/// One press or release produced by [`parse_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStroke {
    pub token: KeyToken,
    pub press: bool,
}

/// Brace escapes of the key-sequence format, matched case-insensitively.
const BRACE_ESCAPES: &[(&str, u16)] = &[
    ("back", vk::BACK),
    ("backspace", vk::BACK),
    ("bksp", vk::BACK),
    ("bs", vk::BACK),
    ("del", vk::DELETE),
    ("delete", vk::DELETE),
    ("enter", vk::RETURN),
    ("esc", vk::ESCAPE),
    ("help", vk::HELP),
    ("ins", vk::INSERT),
    ("insert", vk::INSERT),
    ("tab", vk::TAB),
    ("capslock", vk::CAPITAL),
    ("numlock", vk::NUMLOCK),
    ("prtsc", vk::SNAPSHOT),
    ("scrollock", vk::SCROLL),
    ("down", vk::DOWN),
    ("end", vk::END),
    ("home", vk::HOME),
    ("left", vk::LEFT),
    ("pgdn", vk::NEXT),
    ("pgup", vk::PRIOR),
    ("right", vk::RIGHT),
    ("up", vk::UP),
    ("add", vk::ADD),
    ("subtract", vk::SUBTRACT),
    ("multiply", vk::MULTIPLY),
    ("divide", vk::DIVIDE),
    ("space", vk::SPACE),
    ("alt", vk::LMENU),
    ("ctrl", vk::LCONTROL),
    ("shift", vk::LSHIFT),
];

/// Prefix characters that hold a modifier for the next key, in the order
/// they are released.
const PREFIX_MODIFIERS: [(char, u16); 3] = [
    ('+', vk::LSHIFT),
    ('%', vk::LMENU),
    ('^', vk::LCONTROL),
];

fn prefix_modifier(ch: char) -> Option<u16> {
    PREFIX_MODIFIERS
        .iter()
        .find(|&&(prefix, _)| prefix == ch)
        .map(|&(_, vk)| vk)
}

fn modifier_name(vk: u16) -> &'static str {
    match vk {
        vk::LSHIFT => "shift",
        vk::LMENU => "alt",
        _ => "ctrl",
    }
}

/// Resolve the name inside `{...}`.  Function keys F1-F16 and the escape
/// table come first, then a single literal character (so `{+}` types a
/// plus), then the general key-name table.
fn resolve_escape<L: KeyboardLayout + ?Sized>(name: &str, layout: &L) -> Option<KeyScan> {
    let plain = |vk| KeyScan {
        vk,
        shift: false,
        ctrl: false,
        alt: false,
    };
    let lower = name.to_lowercase();

    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u16>().ok()) {
        if (1..=16).contains(&n) {
            return Some(plain(vk::F1 + n - 1));
        }
    }
    if let Some(&(_, vk)) = BRACE_ESCAPES.iter().find(|&&(escape, _)| escape == lower) {
        return Some(plain(vk));
    }
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if let Some(scan) = layout.char_to_key(ch) {
            return Some(scan);
        }
    }
    lookup(name).map(|symbol| KeyScan {
        shift: symbol.requires_shift,
        ..plain(symbol.vk)
    })
}

/// Split an escape body into its name and repeat count.
fn escape_parts(body: &str) -> Result<(&str, u32), InjectionError> {
    let parts: Vec<&str> = body.split(' ').collect();
    let (name, count) = match parts.as_slice() {
        [name] => (*name, 1),
        [name, count] => {
            let count = count.parse::<u32>().map_err(|_| {
                InjectionError::ParseError(format!("bad repeat count in {{{body}}}"))
            })?;
            (*name, count)
        }
        _ => {
            return Err(InjectionError::ParseError(format!(
                "too many fields in {{{body}}}"
            )))
        }
    };
    if name.is_empty() {
        return Err(InjectionError::ParseError(format!("empty key name in {{{body}}}")));
    }
    Ok((name, count))
}

struct StrokeWriter<'a, L: ?Sized> {
    layout: &'a L,
    strokes: Vec<KeyStroke>,
    held: Vec<u16>,
}

impl<L: KeyboardLayout + ?Sized> StrokeWriter<'_, L> {
    fn stroke(&mut self, text: &str, vk: u16, press: bool) {
        let token = KeyToken::from_vk(text, vk, self.layout);
        self.strokes.push(KeyStroke { token, press });
    }

    fn hold(&mut self, vk: u16) {
        if !self.held.contains(&vk) {
            self.held.push(vk);
            self.stroke(modifier_name(vk), vk, true);
        }
    }

    /// Release every prefix modifier: shift, then alt, then ctrl.
    fn release_held(&mut self) {
        for (_, vk) in PREFIX_MODIFIERS {
            if self.held.contains(&vk) {
                self.stroke(modifier_name(vk), vk, false);
            }
        }
        self.held.clear();
    }

    /// Tap one key.  Modifiers the layout needs for the character are added
    /// only when no prefix modifier is held.
    fn tap(&mut self, text: &str, scan: KeyScan) {
        let mut implicit = Vec::with_capacity(3);
        if self.held.is_empty() {
            if scan.ctrl {
                implicit.push(vk::LCONTROL);
            }
            if scan.alt {
                implicit.push(vk::LMENU);
            }
            if scan.shift {
                implicit.push(vk::LSHIFT);
            }
        }
        for &vk in &implicit {
            self.stroke(modifier_name(vk), vk, true);
        }
        self.stroke(text, scan.vk, true);
        self.stroke(text, scan.vk, false);
        for &vk in implicit.iter().rev() {
            self.stroke(modifier_name(vk), vk, false);
        }
    }
}

/// Parse a key sequence in the classic SendKeys format into ordered strokes.
///
/// - `+`, `^` and `%` hold Shift, Ctrl and Alt for the next key only.
/// - `{NAME}` taps a named key; `{NAME n}` taps it `n` times.  `{+}`,
///   `{{}` and `{}}` type the literal character.
/// - Any other character is typed through the layout.
///
/// The whole sequence is rejected up front (nothing to submit) when it ends
/// in a prefix or `{`, when a brace is unclosed, or when an escape or
/// character cannot be resolved.
pub fn parse_keys<L: KeyboardLayout + ?Sized>(
    text: &str,
    layout: &L,
) -> Result<Vec<KeyStroke>, InjectionError> {
    if let Some(last) = text.chars().last() {
        if last == '{' || prefix_modifier(last).is_some() {
            return Err(InjectionError::ParseError(format!(
                "key sequence {text:?} ends with a dangling {last:?}"
            )));
        }
    }

    let mut writer = StrokeWriter {
        layout,
        strokes: Vec::with_capacity(text.len() * 2),
        held: Vec::with_capacity(PREFIX_MODIFIERS.len()),
    };
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        rest = &rest[ch.len_utf8()..];

        if let Some(modifier) = prefix_modifier(ch) {
            writer.hold(modifier);
            continue;
        }

        if ch == '{' {
            let (body, after) = match rest.strip_prefix("}}") {
                Some(after) => ("}", after),
                None => {
                    let end = rest.find('}').ok_or_else(|| {
                        InjectionError::ParseError(format!("unclosed '{{' in {text:?}"))
                    })?;
                    (&rest[..end], &rest[end + 1..])
                }
            };
            rest = after;

            let (name, count) = escape_parts(body)?;
            let scan = resolve_escape(name, layout).ok_or_else(|| {
                InjectionError::ParseError(format!("unrecognized key escape {{{body}}}"))
            })?;
            for _ in 0..count {
                writer.tap(name, scan);
            }
        } else {
            let scan = layout.char_to_key(ch).ok_or_else(|| {
                InjectionError::ParseError(format!("no key in the layout types {ch:?}"))
            })?;
            writer.tap(&ch.to_string(), scan);
        }
        writer.release_held();
    }
    writer.release_held();

    Ok(writer.strokes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakePlatform;

    #[test]
    fn test_named_keys_are_case_insensitive() {
        assert_eq!(lookup("Ctrl"), lookup("CTRL"));
        assert_eq!(lookup("  enter "), Some(KeySymbol { vk: vk::RETURN, requires_shift: false }));
        assert!(lookup("NotAKey").is_none());
    }

    #[test]
    fn test_generic_modifiers_map_to_left_keys() {
        assert_eq!(lookup("shift").unwrap().vk, vk::LSHIFT);
        assert_eq!(lookup("ctrl").unwrap().vk, vk::LCONTROL);
        assert_eq!(lookup("alt").unwrap().vk, vk::LMENU);
    }

    #[test]
    fn test_generated_ranges() {
        assert_eq!(lookup("a").unwrap().vk, 0x41);
        assert_eq!(lookup("z").unwrap().vk, 0x5A);
        assert_eq!(lookup("7").unwrap().vk, 0x37);
        assert_eq!(lookup("D7").unwrap().vk, 0x37);
        assert_eq!(lookup("numpad3").unwrap().vk, 0x63);
        assert_eq!(lookup("F12").unwrap().vk, 0x7B);
        assert_eq!(lookup("f24").unwrap().vk, 0x87);
    }

    #[test]
    fn test_shifted_symbol_expands_to_shift_then_digit() {
        let layout = FakePlatform::new();
        let tokens = resolve("@", &layout).unwrap();
        let vks: Vec<u16> = tokens.iter().map(|t| t.vk).collect();
        assert_eq!(vks, vec![vk::LSHIFT, vk::D0 + 2]);
    }

    #[test]
    fn test_scan_code_comes_from_layout() {
        let layout = FakePlatform::new();
        let token = KeyToken::from_vk("a", vk::A, &layout);
        assert_eq!(token.scan, layout.scan_code(vk::A));
        assert_ne!(token.scan, 0);
    }

    #[test]
    fn test_layout_fallback_for_unlisted_character() {
        let layout = FakePlatform::new();
        let tokens = resolve("?", &layout).unwrap();
        let vks: Vec<u16> = tokens.iter().map(|t| t.vk).collect();
        assert_eq!(vks, vec![vk::LSHIFT, vk::OEM_2]);

        let tokens = resolve(",", &layout).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].vk, vk::OEM_COMMA);
    }

    #[test]
    fn test_unknown_name_is_parse_error() {
        let layout = FakePlatform::new();
        let err = resolve("hyperkey", &layout).unwrap_err();
        assert!(matches!(err, InjectionError::ParseError(_)));
    }

    #[test]
    fn test_parse_chord_preserves_order() {
        let layout = FakePlatform::new();
        let tokens = parse_chord("Ctrl+Shift+End", &layout).unwrap();
        let vks: Vec<u16> = tokens.iter().map(|t| t.vk).collect();
        assert_eq!(vks, vec![vk::LCONTROL, vk::LSHIFT, vk::END]);
        assert!(tokens[2].extended);
        assert!(!tokens[0].extended);
    }

    #[test]
    fn test_parse_chord_skips_empty_segments() {
        let layout = FakePlatform::new();
        let tokens = parse_chord("ctrl++a", &layout).unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_parse_chord_rejects_empty() {
        let layout = FakePlatform::new();
        assert!(matches!(
            parse_chord(" + ", &layout),
            Err(InjectionError::ParseError(_))
        ));
    }

    fn strokes(text: &str) -> Vec<(u16, bool)> {
        let layout = FakePlatform::new();
        parse_keys(text, &layout)
            .unwrap()
            .into_iter()
            .map(|s| (s.token.vk, s.press))
            .collect()
    }

    #[test]
    fn test_prefix_holds_modifier_for_one_key() {
        assert_eq!(
            strokes("+ab"),
            vec![
                (vk::LSHIFT, true),
                (vk::A, true),
                (vk::A, false),
                (vk::LSHIFT, false),
                (vk::A + 1, true),
                (vk::A + 1, false),
            ]
        );
    }

    #[test]
    fn test_modifiers_release_shift_alt_ctrl() {
        assert_eq!(
            strokes("^%+{END}"),
            vec![
                (vk::LCONTROL, true),
                (vk::LMENU, true),
                (vk::LSHIFT, true),
                (vk::END, true),
                (vk::END, false),
                (vk::LSHIFT, false),
                (vk::LMENU, false),
                (vk::LCONTROL, false),
            ]
        );
    }

    #[test]
    fn test_repeated_modifier_prefix_is_pressed_once() {
        assert_eq!(
            strokes("++a"),
            vec![
                (vk::LSHIFT, true),
                (vk::A, true),
                (vk::A, false),
                (vk::LSHIFT, false),
            ]
        );
    }

    #[test]
    fn test_escape_repeat_count() {
        let out = strokes("{BACK 3}");
        assert_eq!(out.len(), 6);
        assert!(out.chunks(2).all(|pair| pair == [(vk::BACK, true), (vk::BACK, false)]));
        assert!(strokes("{bs 0}").is_empty());
    }

    #[test]
    fn test_escape_names_are_case_insensitive() {
        assert_eq!(strokes("{PgDn}"), vec![(vk::NEXT, true), (vk::NEXT, false)]);
        assert_eq!(strokes("{f16}"), vec![(vk::F1 + 15, true), (vk::F1 + 15, false)]);
    }

    #[test]
    fn test_literal_brace_escapes() {
        let shifted_plus = vec![
            (vk::LSHIFT, true),
            (vk::OEM_PLUS, true),
            (vk::OEM_PLUS, false),
            (vk::LSHIFT, false),
        ];
        assert_eq!(strokes("{+}"), shifted_plus);
        assert_eq!(strokes("{{}")[1], (vk::OEM_4, true));
        assert_eq!(strokes("{}}")[1], (vk::OEM_6, true));
    }

    #[test]
    fn test_uppercase_character_gets_implicit_shift() {
        assert_eq!(
            strokes("A"),
            vec![
                (vk::LSHIFT, true),
                (vk::A, true),
                (vk::A, false),
                (vk::LSHIFT, false),
            ]
        );
    }

    #[test]
    fn test_held_prefix_drops_implicit_shift() {
        assert_eq!(
            strokes("^A"),
            vec![
                (vk::LCONTROL, true),
                (vk::A, true),
                (vk::A, false),
                (vk::LCONTROL, false),
            ]
        );
    }

    #[test]
    fn test_key_sequence_errors() {
        let layout = FakePlatform::new();
        for bad in ["a+", "x^", "%", "ab{", "{abc", "{BACK x}", "{BACK 1 2}", "{}", "{nope}"] {
            assert!(
                matches!(parse_keys(bad, &layout), Err(InjectionError::ParseError(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_empty_key_sequence_is_no_strokes() {
        assert!(strokes("").is_empty());
    }

    #[test]
    fn test_key_scan_unpacks_vk_and_state() {
        let scan = KeyScan::from_packed(0x0131).unwrap();
        assert_eq!(scan.vk, 0x31);
        assert!(scan.shift);
        assert!(!scan.ctrl);
        assert!(KeyScan::from_packed(-1).is_none());

        let altgr = KeyScan::from_packed(0x0651).unwrap();
        assert!(altgr.ctrl && altgr.alt && !altgr.shift);
    }
}
