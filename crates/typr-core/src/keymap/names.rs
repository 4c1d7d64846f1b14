//! Human-readable key names.
//!
//! Every [`Key`] has exactly one canonical name, equal to its variant name
//! (`"A"`, `"Num1"`, `"ShiftLeft"`).  Lookup in the other direction is
//! case-insensitive and also accepts a set of common aliases (`"esc"`,
//! `"return"`, `"ctrl"`, `"1"`), so `key_to_string(string_to_key(alias))`
//! always yields the canonical name.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::key::Key;

/// Canonical name of `key`.  [`Key::Unknown`] is named `"Unknown"`.
pub fn key_to_string(key: Key) -> &'static str {
    match key {
        Key::Unknown => "Unknown",
        Key::A => "A",
        Key::B => "B",
        Key::C => "C",
        Key::D => "D",
        Key::E => "E",
        Key::F => "F",
        Key::G => "G",
        Key::H => "H",
        Key::I => "I",
        Key::J => "J",
        Key::K => "K",
        Key::L => "L",
        Key::M => "M",
        Key::N => "N",
        Key::O => "O",
        Key::P => "P",
        Key::Q => "Q",
        Key::R => "R",
        Key::S => "S",
        Key::T => "T",
        Key::U => "U",
        Key::V => "V",
        Key::W => "W",
        Key::X => "X",
        Key::Y => "Y",
        Key::Z => "Z",
        Key::Num0 => "Num0",
        Key::Num1 => "Num1",
        Key::Num2 => "Num2",
        Key::Num3 => "Num3",
        Key::Num4 => "Num4",
        Key::Num5 => "Num5",
        Key::Num6 => "Num6",
        Key::Num7 => "Num7",
        Key::Num8 => "Num8",
        Key::Num9 => "Num9",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::F13 => "F13",
        Key::F14 => "F14",
        Key::F15 => "F15",
        Key::F16 => "F16",
        Key::F17 => "F17",
        Key::F18 => "F18",
        Key::F19 => "F19",
        Key::F20 => "F20",
        Key::Enter => "Enter",
        Key::Escape => "Escape",
        Key::Backspace => "Backspace",
        Key::Tab => "Tab",
        Key::Space => "Space",
        Key::Left => "Left",
        Key::Right => "Right",
        Key::Up => "Up",
        Key::Down => "Down",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "PageUp",
        Key::PageDown => "PageDown",
        Key::Delete => "Delete",
        Key::Insert => "Insert",
        Key::PrintScreen => "PrintScreen",
        Key::ScrollLock => "ScrollLock",
        Key::Pause => "Pause",
        Key::Numpad0 => "Numpad0",
        Key::Numpad1 => "Numpad1",
        Key::Numpad2 => "Numpad2",
        Key::Numpad3 => "Numpad3",
        Key::Numpad4 => "Numpad4",
        Key::Numpad5 => "Numpad5",
        Key::Numpad6 => "Numpad6",
        Key::Numpad7 => "Numpad7",
        Key::Numpad8 => "Numpad8",
        Key::Numpad9 => "Numpad9",
        Key::NumpadDivide => "NumpadDivide",
        Key::NumpadMultiply => "NumpadMultiply",
        Key::NumpadMinus => "NumpadMinus",
        Key::NumpadPlus => "NumpadPlus",
        Key::NumpadEnter => "NumpadEnter",
        Key::NumpadDecimal => "NumpadDecimal",
        Key::ShiftLeft => "ShiftLeft",
        Key::ShiftRight => "ShiftRight",
        Key::CtrlLeft => "CtrlLeft",
        Key::CtrlRight => "CtrlRight",
        Key::AltLeft => "AltLeft",
        Key::AltRight => "AltRight",
        Key::SuperLeft => "SuperLeft",
        Key::SuperRight => "SuperRight",
        Key::CapsLock => "CapsLock",
        Key::NumLock => "NumLock",
        Key::Menu => "Menu",
        Key::Mute => "Mute",
        Key::VolumeDown => "VolumeDown",
        Key::VolumeUp => "VolumeUp",
        Key::MediaPlayPause => "MediaPlayPause",
        Key::MediaStop => "MediaStop",
        Key::MediaNext => "MediaNext",
        Key::MediaPrevious => "MediaPrevious",
        Key::Grave => "Grave",
        Key::Minus => "Minus",
        Key::Equal => "Equal",
        Key::LeftBracket => "LeftBracket",
        Key::RightBracket => "RightBracket",
        Key::Backslash => "Backslash",
        Key::Semicolon => "Semicolon",
        Key::Apostrophe => "Apostrophe",
        Key::Comma => "Comma",
        Key::Period => "Period",
        Key::Slash => "Slash",
    }
}

/// Alternate spellings accepted by [`string_to_key`], lower-case.
const ALIASES: &[(&str, Key)] = &[
    ("0", Key::Num0),
    ("1", Key::Num1),
    ("2", Key::Num2),
    ("3", Key::Num3),
    ("4", Key::Num4),
    ("5", Key::Num5),
    ("6", Key::Num6),
    ("7", Key::Num7),
    ("8", Key::Num8),
    ("9", Key::Num9),
    ("return", Key::Enter),
    ("esc", Key::Escape),
    ("bksp", Key::Backspace),
    ("back", Key::Backspace),
    ("spacebar", Key::Space),
    ("arrowleft", Key::Left),
    ("arrowright", Key::Right),
    ("arrowup", Key::Up),
    ("arrowdown", Key::Down),
    ("pgup", Key::PageUp),
    ("pgdn", Key::PageDown),
    ("pgdown", Key::PageDown),
    ("del", Key::Delete),
    ("ins", Key::Insert),
    ("prtsc", Key::PrintScreen),
    ("print", Key::PrintScreen),
    ("scrlk", Key::ScrollLock),
    ("break", Key::Pause),
    ("shift", Key::ShiftLeft),
    ("lshift", Key::ShiftLeft),
    ("rshift", Key::ShiftRight),
    ("ctrl", Key::CtrlLeft),
    ("control", Key::CtrlLeft),
    ("lctrl", Key::CtrlLeft),
    ("rctrl", Key::CtrlRight),
    ("alt", Key::AltLeft),
    ("option", Key::AltLeft),
    ("lalt", Key::AltLeft),
    ("ralt", Key::AltRight),
    ("altgr", Key::AltRight),
    ("super", Key::SuperLeft),
    ("meta", Key::SuperLeft),
    ("win", Key::SuperLeft),
    ("cmd", Key::SuperLeft),
    ("command", Key::SuperLeft),
    ("lsuper", Key::SuperLeft),
    ("rsuper", Key::SuperRight),
    ("caps", Key::CapsLock),
    ("numlk", Key::NumLock),
    ("apps", Key::Menu),
    ("contextmenu", Key::Menu),
    ("volup", Key::VolumeUp),
    ("voldown", Key::VolumeDown),
    ("playpause", Key::MediaPlayPause),
    ("stop", Key::MediaStop),
    ("next", Key::MediaNext),
    ("prev", Key::MediaPrevious),
    ("previous", Key::MediaPrevious),
    ("`", Key::Grave),
    ("backtick", Key::Grave),
    ("-", Key::Minus),
    ("=", Key::Equal),
    ("[", Key::LeftBracket),
    ("]", Key::RightBracket),
    ("\\", Key::Backslash),
    (";", Key::Semicolon),
    ("'", Key::Apostrophe),
    ("quote", Key::Apostrophe),
    (",", Key::Comma),
    (".", Key::Period),
    ("/", Key::Slash),
];

/// Looks up a key by name.
///
/// Matching is case-insensitive against canonical names first, then
/// against the alias table.  Unrecognized names return [`Key::Unknown`].
pub fn string_to_key(name: &str) -> Key {
    let name = name.trim();
    if name.is_empty() {
        return Key::Unknown;
    }
    if let Some(key) = Key::ALL
        .iter()
        .copied()
        .find(|k| key_to_string(*k).eq_ignore_ascii_case(name))
    {
        return key;
    }
    ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
        .unwrap_or(Key::Unknown)
}

/// Returned by [`Key::from_str`] when a name matches no key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized key name: {0:?}")]
pub struct ParseKeyError(pub String);

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match string_to_key(s) {
            Key::Unknown => Err(ParseKeyError(s.to_string())),
            key => Ok(key),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(key_to_string(*self))
    }
}
