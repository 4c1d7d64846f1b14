//! Logical key to Windows Virtual Key code translation table.
//!
//! VK codes are from `WinUser.h`.  Low-level keyboard hooks report the
//! side-specific modifier codes (`VK_LSHIFT`, `VK_RCONTROL`, ...), so those
//! are used in both directions rather than the generic `VK_SHIFT` family.

use super::key::Key;

const VK_RETURN: u16 = 0x0D;

/// Translates a [`Key`] to a Windows Virtual Key code.
///
/// Returns `None` only for [`Key::Unknown`].
pub fn key_to_vk(key: Key) -> Option<u16> {
    let vk = match key {
        Key::Unknown => return None,

        // Letters map to their upper-case ASCII value
        Key::A => 0x41,
        Key::B => 0x42,
        Key::C => 0x43,
        Key::D => 0x44,
        Key::E => 0x45,
        Key::F => 0x46,
        Key::G => 0x47,
        Key::H => 0x48,
        Key::I => 0x49,
        Key::J => 0x4A,
        Key::K => 0x4B,
        Key::L => 0x4C,
        Key::M => 0x4D,
        Key::N => 0x4E,
        Key::O => 0x4F,
        Key::P => 0x50,
        Key::Q => 0x51,
        Key::R => 0x52,
        Key::S => 0x53,
        Key::T => 0x54,
        Key::U => 0x55,
        Key::V => 0x56,
        Key::W => 0x57,
        Key::X => 0x58,
        Key::Y => 0x59,
        Key::Z => 0x5A,

        // Digits map to their ASCII value
        Key::Num0 => 0x30,
        Key::Num1 => 0x31,
        Key::Num2 => 0x32,
        Key::Num3 => 0x33,
        Key::Num4 => 0x34,
        Key::Num5 => 0x35,
        Key::Num6 => 0x36,
        Key::Num7 => 0x37,
        Key::Num8 => 0x38,
        Key::Num9 => 0x39,

        // VK_F1 .. VK_F20
        Key::F1 => 0x70,
        Key::F2 => 0x71,
        Key::F3 => 0x72,
        Key::F4 => 0x73,
        Key::F5 => 0x74,
        Key::F6 => 0x75,
        Key::F7 => 0x76,
        Key::F8 => 0x77,
        Key::F9 => 0x78,
        Key::F10 => 0x79,
        Key::F11 => 0x7A,
        Key::F12 => 0x7B,
        Key::F13 => 0x7C,
        Key::F14 => 0x7D,
        Key::F15 => 0x7E,
        Key::F16 => 0x7F,
        Key::F17 => 0x80,
        Key::F18 => 0x81,
        Key::F19 => 0x82,
        Key::F20 => 0x83,

        // Control
        Key::Backspace => 0x08,
        Key::Tab => 0x09,
        Key::Enter => VK_RETURN,
        Key::Escape => 0x1B,
        Key::Space => 0x20,

        // Navigation
        Key::Pause => 0x13,
        Key::PageUp => 0x21,
        Key::PageDown => 0x22,
        Key::End => 0x23,
        Key::Home => 0x24,
        Key::Left => 0x25,
        Key::Up => 0x26,
        Key::Right => 0x27,
        Key::Down => 0x28,
        Key::PrintScreen => 0x2C, // VK_SNAPSHOT
        Key::Insert => 0x2D,
        Key::Delete => 0x2E,
        Key::ScrollLock => 0x91,

        // Numpad
        Key::Numpad0 => 0x60,
        Key::Numpad1 => 0x61,
        Key::Numpad2 => 0x62,
        Key::Numpad3 => 0x63,
        Key::Numpad4 => 0x64,
        Key::Numpad5 => 0x65,
        Key::Numpad6 => 0x66,
        Key::Numpad7 => 0x67,
        Key::Numpad8 => 0x68,
        Key::Numpad9 => 0x69,
        Key::NumpadMultiply => 0x6A,
        Key::NumpadPlus => 0x6B,
        Key::NumpadMinus => 0x6D,
        Key::NumpadDecimal => 0x6E,
        Key::NumpadDivide => 0x6F,
        Key::NumpadEnter => VK_RETURN, // + KEYEVENTF_EXTENDEDKEY

        // Modifiers and locks
        Key::ShiftLeft => 0xA0,
        Key::ShiftRight => 0xA1,
        Key::CtrlLeft => 0xA2,
        Key::CtrlRight => 0xA3,
        Key::AltLeft => 0xA4,
        Key::AltRight => 0xA5,
        Key::SuperLeft => 0x5B,
        Key::SuperRight => 0x5C,
        Key::CapsLock => 0x14,
        Key::NumLock => 0x90,

        // Menu and media
        Key::Menu => 0x5D, // VK_APPS
        Key::Mute => 0xAD,
        Key::VolumeDown => 0xAE,
        Key::VolumeUp => 0xAF,
        Key::MediaNext => 0xB0,
        Key::MediaPrevious => 0xB1,
        Key::MediaStop => 0xB2,
        Key::MediaPlayPause => 0xB3,

        // Punctuation (VK_OEM_*)
        Key::Semicolon => 0xBA,
        Key::Equal => 0xBB,
        Key::Comma => 0xBC,
        Key::Minus => 0xBD,
        Key::Period => 0xBE,
        Key::Slash => 0xBF,
        Key::Grave => 0xC0,
        Key::LeftBracket => 0xDB,
        Key::Backslash => 0xDC,
        Key::RightBracket => 0xDD,
        Key::Apostrophe => 0xDE,
    };
    Some(vk)
}

/// Whether `key` must be injected with `KEYEVENTF_EXTENDEDKEY`.
pub fn is_extended(key: Key) -> bool {
    matches!(
        key,
        Key::CtrlRight
            | Key::AltRight
            | Key::SuperLeft
            | Key::SuperRight
            | Key::Menu
            | Key::Insert
            | Key::Delete
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown
            | Key::Left
            | Key::Right
            | Key::Up
            | Key::Down
            | Key::NumLock
            | Key::NumpadDivide
            | Key::NumpadEnter
            | Key::PrintScreen
            | Key::Mute
            | Key::VolumeDown
            | Key::VolumeUp
            | Key::MediaPlayPause
            | Key::MediaStop
            | Key::MediaNext
            | Key::MediaPrevious
    )
}

/// Translates a Windows Virtual Key code to a [`Key`].
///
/// `extended` disambiguates `VK_RETURN`; it is ignored for every other code.
pub fn vk_to_key(vk: u16, extended: bool) -> Key {
    if vk == VK_RETURN {
        return if extended { Key::NumpadEnter } else { Key::Enter };
    }
    Key::ALL
        .iter()
        .copied()
        .find(|k| key_to_vk(*k) == Some(vk))
        .unwrap_or(Key::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_named_key_has_a_vk() {
        for key in Key::ALL {
            assert!(key_to_vk(key).is_some(), "{key:?} should have a VK code");
        }
        assert_eq!(key_to_vk(Key::Unknown), None);
    }

    #[test]
    fn test_letters_use_ascii_values() {
        assert_eq!(key_to_vk(Key::A), Some(0x41));
        assert_eq!(key_to_vk(Key::Z), Some(0x5A));
        assert_eq!(key_to_vk(Key::Num0), Some(0x30));
    }

    #[test]
    fn test_reverse_lookup_inverts_forward_table() {
        for key in Key::ALL {
            let vk = key_to_vk(key).unwrap();
            assert_eq!(vk_to_key(vk, is_extended(key)), key, "{key:?}");
        }
    }

    #[test]
    fn test_extended_flag_separates_the_two_enter_keys() {
        assert_eq!(vk_to_key(VK_RETURN, false), Key::Enter);
        assert_eq!(vk_to_key(VK_RETURN, true), Key::NumpadEnter);
        assert!(is_extended(Key::NumpadEnter));
        assert!(!is_extended(Key::Enter));
    }

    #[test]
    fn test_unmapped_vk_is_unknown() {
        // VK_LBUTTON is a mouse button
        assert_eq!(vk_to_key(0x01, false), Key::Unknown);
        assert_eq!(vk_to_key(0xFF, false), Key::Unknown);
    }
}
