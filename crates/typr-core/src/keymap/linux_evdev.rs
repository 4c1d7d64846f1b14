//! Logical key to Linux input event code translation table.
//!
//! Codes are the `KEY_*` constants from `linux/input-event-codes.h`.  The
//! same codes are written to a uinput virtual device and read back from
//! `/dev/input/event*` nodes.

use super::key::Key;

/// `KEY_COMPOSE`, the code most PC keyboards send for the context-menu key.
const KEY_COMPOSE: u16 = 127;

/// Translates a [`Key`] to a Linux `KEY_*` code.
///
/// Returns `None` only for [`Key::Unknown`].
pub fn key_to_code(key: Key) -> Option<u16> {
    let code = match key {
        Key::Unknown => return None,

        // Letters (input codes follow the QWERTY scan order)
        Key::Q => 16,
        Key::W => 17,
        Key::E => 18,
        Key::R => 19,
        Key::T => 20,
        Key::Y => 21,
        Key::U => 22,
        Key::I => 23,
        Key::O => 24,
        Key::P => 25,
        Key::A => 30,
        Key::S => 31,
        Key::D => 32,
        Key::F => 33,
        Key::G => 34,
        Key::H => 35,
        Key::J => 36,
        Key::K => 37,
        Key::L => 38,
        Key::Z => 44,
        Key::X => 45,
        Key::C => 46,
        Key::V => 47,
        Key::B => 48,
        Key::N => 49,
        Key::M => 50,

        // Digits
        Key::Num1 => 2,
        Key::Num2 => 3,
        Key::Num3 => 4,
        Key::Num4 => 5,
        Key::Num5 => 6,
        Key::Num6 => 7,
        Key::Num7 => 8,
        Key::Num8 => 9,
        Key::Num9 => 10,
        Key::Num0 => 11,

        // Function keys
        Key::F1 => 59,
        Key::F2 => 60,
        Key::F3 => 61,
        Key::F4 => 62,
        Key::F5 => 63,
        Key::F6 => 64,
        Key::F7 => 65,
        Key::F8 => 66,
        Key::F9 => 67,
        Key::F10 => 68,
        Key::F11 => 87,
        Key::F12 => 88,
        Key::F13 => 183,
        Key::F14 => 184,
        Key::F15 => 185,
        Key::F16 => 186,
        Key::F17 => 187,
        Key::F18 => 188,
        Key::F19 => 189,
        Key::F20 => 190,

        // Control
        Key::Escape => 1,
        Key::Backspace => 14,
        Key::Tab => 15,
        Key::Enter => 28,
        Key::Space => 57,

        // Navigation
        Key::PrintScreen => 99, // KEY_SYSRQ
        Key::Home => 102,
        Key::Up => 103,
        Key::PageUp => 104,
        Key::Left => 105,
        Key::Right => 106,
        Key::End => 107,
        Key::Down => 108,
        Key::PageDown => 109,
        Key::Insert => 110,
        Key::Delete => 111,
        Key::Pause => 119,
        Key::ScrollLock => 70,

        // Numpad
        Key::NumpadMultiply => 55,
        Key::Numpad7 => 71,
        Key::Numpad8 => 72,
        Key::Numpad9 => 73,
        Key::NumpadMinus => 74,
        Key::Numpad4 => 75,
        Key::Numpad5 => 76,
        Key::Numpad6 => 77,
        Key::NumpadPlus => 78,
        Key::Numpad1 => 79,
        Key::Numpad2 => 80,
        Key::Numpad3 => 81,
        Key::Numpad0 => 82,
        Key::NumpadDecimal => 83,
        Key::NumpadEnter => 96,
        Key::NumpadDivide => 98,

        // Modifiers and locks
        Key::CtrlLeft => 29,
        Key::ShiftLeft => 42,
        Key::ShiftRight => 54,
        Key::AltLeft => 56,
        Key::CapsLock => 58,
        Key::NumLock => 69,
        Key::CtrlRight => 97,
        Key::AltRight => 100,
        Key::SuperLeft => 125,
        Key::SuperRight => 126,

        // Menu and media
        Key::Menu => 139,
        Key::Mute => 113,
        Key::VolumeDown => 114,
        Key::VolumeUp => 115,
        Key::MediaNext => 163,
        Key::MediaPlayPause => 164,
        Key::MediaPrevious => 165,
        Key::MediaStop => 166,

        // Punctuation
        Key::Minus => 12,
        Key::Equal => 13,
        Key::LeftBracket => 26,
        Key::RightBracket => 27,
        Key::Semicolon => 39,
        Key::Apostrophe => 40,
        Key::Grave => 41,
        Key::Backslash => 43,
        Key::Comma => 51,
        Key::Period => 52,
        Key::Slash => 53,
    };
    Some(code)
}

/// Translates a Linux `KEY_*` code to a [`Key`].
///
/// Returns [`Key::Unknown`] for codes with no logical equivalent.
pub fn code_to_key(code: u16) -> Key {
    if code == KEY_COMPOSE {
        return Key::Menu;
    }
    Key::ALL
        .iter()
        .copied()
        .find(|k| key_to_code(*k) == Some(code))
        .unwrap_or(Key::Unknown)
}
