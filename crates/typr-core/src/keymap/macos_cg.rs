//! Logical key to macOS `CGKeyCode` translation table.
//!
//! CGKeyCode values are the `kVK_*` constants from HIToolbox `Events.h`.
//! They identify ANSI key positions, not characters.  Media keys travel as
//! `NX_SYSDEFINED` events rather than key codes and are left unmapped.

use super::key::Key;

/// Translates a [`Key`] to a macOS `CGKeyCode` value.
///
/// Returns `None` if the key has no macOS virtual key code.
pub fn key_to_cgkeycode(key: Key) -> Option<u16> {
    let code = match key {
        // Letters
        Key::A => 0x00,
        Key::S => 0x01,
        Key::D => 0x02,
        Key::F => 0x03,
        Key::H => 0x04,
        Key::G => 0x05,
        Key::Z => 0x06,
        Key::X => 0x07,
        Key::C => 0x08,
        Key::V => 0x09,
        Key::B => 0x0B,
        Key::Q => 0x0C,
        Key::W => 0x0D,
        Key::E => 0x0E,
        Key::R => 0x0F,
        Key::Y => 0x10,
        Key::T => 0x11,
        Key::O => 0x1F,
        Key::U => 0x20,
        Key::I => 0x22,
        Key::P => 0x23,
        Key::L => 0x25,
        Key::J => 0x26,
        Key::K => 0x28,
        Key::N => 0x2D,
        Key::M => 0x2E,

        // Digits
        Key::Num1 => 0x12,
        Key::Num2 => 0x13,
        Key::Num3 => 0x14,
        Key::Num4 => 0x15,
        Key::Num6 => 0x16,
        Key::Num5 => 0x17,
        Key::Num9 => 0x19,
        Key::Num7 => 0x1A,
        Key::Num8 => 0x1C,
        Key::Num0 => 0x1D,

        // Function keys
        Key::F1 => 0x7A,
        Key::F2 => 0x78,
        Key::F3 => 0x63,
        Key::F4 => 0x76,
        Key::F5 => 0x60,
        Key::F6 => 0x61,
        Key::F7 => 0x62,
        Key::F8 => 0x64,
        Key::F9 => 0x65,
        Key::F10 => 0x6D,
        Key::F11 => 0x67,
        Key::F12 => 0x6F,
        Key::F13 => 0x69,
        Key::F14 => 0x6B,
        Key::F15 => 0x71,
        Key::F16 => 0x6A,
        Key::F17 => 0x40,
        Key::F18 => 0x4F,
        Key::F19 => 0x50,
        Key::F20 => 0x5A,

        // Control
        Key::Enter => 0x24,     // kVK_Return
        Key::Tab => 0x30,       // kVK_Tab
        Key::Space => 0x31,     // kVK_Space
        Key::Backspace => 0x33, // kVK_Delete
        Key::Escape => 0x35,    // kVK_Escape

        // Navigation
        Key::Insert => 0x72, // kVK_Help
        Key::Home => 0x73,
        Key::PageUp => 0x74,
        Key::Delete => 0x75, // kVK_ForwardDelete
        Key::End => 0x77,
        Key::PageDown => 0x79,
        Key::Left => 0x7B,
        Key::Right => 0x7C,
        Key::Down => 0x7D,
        Key::Up => 0x7E,

        // Numpad
        Key::NumpadDecimal => 0x41,
        Key::NumpadMultiply => 0x43,
        Key::NumpadPlus => 0x45,
        Key::NumLock => 0x47, // kVK_ANSI_KeypadClear
        Key::NumpadDivide => 0x4B,
        Key::NumpadEnter => 0x4C,
        Key::NumpadMinus => 0x4E,
        Key::Numpad0 => 0x52,
        Key::Numpad1 => 0x53,
        Key::Numpad2 => 0x54,
        Key::Numpad3 => 0x55,
        Key::Numpad4 => 0x56,
        Key::Numpad5 => 0x57,
        Key::Numpad6 => 0x58,
        Key::Numpad7 => 0x59,
        Key::Numpad8 => 0x5B,
        Key::Numpad9 => 0x5C,

        // Modifiers
        Key::SuperRight => 0x36, // kVK_RightCommand
        Key::SuperLeft => 0x37,  // kVK_Command
        Key::ShiftLeft => 0x38,
        Key::CapsLock => 0x39,
        Key::AltLeft => 0x3A, // kVK_Option
        Key::CtrlLeft => 0x3B,
        Key::ShiftRight => 0x3C,
        Key::AltRight => 0x3D,
        Key::CtrlRight => 0x3E,

        Key::VolumeUp => 0x48,
        Key::VolumeDown => 0x49,
        Key::Mute => 0x4A,
        Key::Menu => 0x6E, // kVK_ContextualMenu

        // Punctuation
        Key::Equal => 0x18,
        Key::Minus => 0x1B,
        Key::RightBracket => 0x1E,
        Key::LeftBracket => 0x21,
        Key::Apostrophe => 0x27,
        Key::Semicolon => 0x29,
        Key::Backslash => 0x2A,
        Key::Comma => 0x2B,
        Key::Slash => 0x2C,
        Key::Period => 0x2F,
        Key::Grave => 0x32,

        Key::PrintScreen
        | Key::ScrollLock
        | Key::Pause
        | Key::MediaPlayPause
        | Key::MediaStop
        | Key::MediaNext
        | Key::MediaPrevious
        | Key::Unknown => return None,
    };
    Some(code)
}

/// Translates a macOS `CGKeyCode` to a [`Key`].
///
/// Returns [`Key::Unknown`] for codes with no logical equivalent
/// (e.g. `kVK_Function`).
pub fn cgkeycode_to_key(code: u16) -> Key {
    Key::ALL
        .iter()
        .copied()
        .find(|k| key_to_cgkeycode(*k) == Some(code))
        .unwrap_or(Key::Unknown)
}
