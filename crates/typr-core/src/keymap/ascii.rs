//! US-ANSI layout character table.
//!
//! Listeners attach the character a key press would produce to each event.
//! Resolving the real active layout is OS-specific and not always possible
//! from a capture thread, so every backend uses this fixed US table.

use super::key::Key;
use crate::domain::modifier::Modifier;

/// Returns the Unicode scalar produced by `key` under `modifiers`, or `0`
/// when the key produces no printable character.
///
/// Ctrl, Alt, and Super chords still report the base character; callers
/// that care about shortcuts inspect the modifier mask themselves.
pub fn codepoint_for(key: Key, modifiers: Modifier) -> u32 {
    let shift = modifiers.contains(Modifier::SHIFT);
    let caps = modifiers.contains(Modifier::CAPS_LOCK);
    let num_lock = modifiers.contains(Modifier::NUM_LOCK);

    if let Some(lower) = letter(key) {
        let upper = shift != caps;
        let ch = if upper { lower.to_ascii_uppercase() } else { lower };
        return u32::from(ch);
    }

    let ch = match key {
        Key::Space => ' ',

        Key::Num0 => pick(shift, '0', ')'),
        Key::Num1 => pick(shift, '1', '!'),
        Key::Num2 => pick(shift, '2', '@'),
        Key::Num3 => pick(shift, '3', '#'),
        Key::Num4 => pick(shift, '4', '$'),
        Key::Num5 => pick(shift, '5', '%'),
        Key::Num6 => pick(shift, '6', '^'),
        Key::Num7 => pick(shift, '7', '&'),
        Key::Num8 => pick(shift, '8', '*'),
        Key::Num9 => pick(shift, '9', '('),

        Key::Grave => pick(shift, '`', '~'),
        Key::Minus => pick(shift, '-', '_'),
        Key::Equal => pick(shift, '=', '+'),
        Key::LeftBracket => pick(shift, '[', '{'),
        Key::RightBracket => pick(shift, ']', '}'),
        Key::Backslash => pick(shift, '\\', '|'),
        Key::Semicolon => pick(shift, ';', ':'),
        Key::Apostrophe => pick(shift, '\'', '"'),
        Key::Comma => pick(shift, ',', '<'),
        Key::Period => pick(shift, '.', '>'),
        Key::Slash => pick(shift, '/', '?'),

        Key::NumpadDivide => '/',
        Key::NumpadMultiply => '*',
        Key::NumpadMinus => '-',
        Key::NumpadPlus => '+',

        Key::Numpad0 if num_lock => '0',
        Key::Numpad1 if num_lock => '1',
        Key::Numpad2 if num_lock => '2',
        Key::Numpad3 if num_lock => '3',
        Key::Numpad4 if num_lock => '4',
        Key::Numpad5 if num_lock => '5',
        Key::Numpad6 if num_lock => '6',
        Key::Numpad7 if num_lock => '7',
        Key::Numpad8 if num_lock => '8',
        Key::Numpad9 if num_lock => '9',
        Key::NumpadDecimal if num_lock => '.',

        _ => return 0,
    };
    u32::from(ch)
}

fn pick(shift: bool, base: char, shifted: char) -> char {
    if shift {
        shifted
    } else {
        base
    }
}

fn letter(key: Key) -> Option<char> {
    let value = key.as_u16();
    if (Key::A.as_u16()..=Key::Z.as_u16()).contains(&value) {
        // Letter variants are contiguous and alphabetical
        let offset = (value - Key::A.as_u16()) as u8;
        Some(char::from(b'a' + offset))
    } else {
        None
    }
}
