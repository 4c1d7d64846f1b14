//! The closed set of logical keys shared by every backend.
//!
//! A [`Key`] names a physical key position on a US-ANSI keyboard, not the
//! character it produces.  The character depends on the active layout and
//! modifiers, which is why text injection is a separate operation.
//!
//! # Wire representation
//!
//! Each variant is a small `u16` starting at 1.  The value `0` is reserved
//! for [`Key::Unknown`], which stands for "no key" or "a key this library
//! has no name for".  Listeners report `Unknown` for unmapped native codes;
//! senders refuse to emit it.

use serde::{Deserialize, Serialize};

use crate::domain::modifier::Modifier;

/// A logical keyboard key, stable across all backends.
///
/// The numeric value of each variant is its wire value.  Backends may fail
/// to map a subset of keys; that is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum Key {
    /// Sentinel for "no key".
    Unknown = 0,

    // Letters
    A = 1,
    B = 2,
    C = 3,
    D = 4,
    E = 5,
    F = 6,
    G = 7,
    H = 8,
    I = 9,
    J = 10,
    K = 11,
    L = 12,
    M = 13,
    N = 14,
    O = 15,
    P = 16,
    Q = 17,
    R = 18,
    S = 19,
    T = 20,
    U = 21,
    V = 22,
    W = 23,
    X = 24,
    Y = 25,
    Z = 26,

    // Top-row digits
    Num0 = 27,
    Num1 = 28,
    Num2 = 29,
    Num3 = 30,
    Num4 = 31,
    Num5 = 32,
    Num6 = 33,
    Num7 = 34,
    Num8 = 35,
    Num9 = 36,

    // Function keys
    F1 = 37,
    F2 = 38,
    F3 = 39,
    F4 = 40,
    F5 = 41,
    F6 = 42,
    F7 = 43,
    F8 = 44,
    F9 = 45,
    F10 = 46,
    F11 = 47,
    F12 = 48,
    F13 = 49,
    F14 = 50,
    F15 = 51,
    F16 = 52,
    F17 = 53,
    F18 = 54,
    F19 = 55,
    F20 = 56,

    // Control
    Enter = 57,
    Escape = 58,
    Backspace = 59,
    Tab = 60,
    Space = 61,

    // Navigation
    Left = 62,
    Right = 63,
    Up = 64,
    Down = 65,
    Home = 66,
    End = 67,
    PageUp = 68,
    PageDown = 69,
    Delete = 70,
    Insert = 71,
    PrintScreen = 72,
    ScrollLock = 73,
    Pause = 74,

    // Numpad
    Numpad0 = 75,
    Numpad1 = 76,
    Numpad2 = 77,
    Numpad3 = 78,
    Numpad4 = 79,
    Numpad5 = 80,
    Numpad6 = 81,
    Numpad7 = 82,
    Numpad8 = 83,
    Numpad9 = 84,
    NumpadDivide = 85,
    NumpadMultiply = 86,
    NumpadMinus = 87,
    NumpadPlus = 88,
    NumpadEnter = 89,
    NumpadDecimal = 90,

    // Modifiers and locks
    ShiftLeft = 91,
    ShiftRight = 92,
    CtrlLeft = 93,
    CtrlRight = 94,
    AltLeft = 95,
    AltRight = 96,
    SuperLeft = 97,
    SuperRight = 98,
    CapsLock = 99,
    NumLock = 100,

    // Menu and media
    Menu = 101,
    Mute = 102,
    VolumeDown = 103,
    VolumeUp = 104,
    MediaPlayPause = 105,
    MediaStop = 106,
    MediaNext = 107,
    MediaPrevious = 108,

    // Punctuation (layout-dependent)
    Grave = 109,
    Minus = 110,
    Equal = 111,
    LeftBracket = 112,
    RightBracket = 113,
    Backslash = 114,
    Semicolon = 115,
    Apostrophe = 116,
    Comma = 117,
    Period = 118,
    Slash = 119,
}

impl Key {
    /// Every named key, ordered by wire value (`ALL[i].as_u16() == i + 1`).
    pub const ALL: [Key; 119] = [
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
        Key::Num0,
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
        Key::Num9,
        Key::F1,
        Key::F2,
        Key::F3,
        Key::F4,
        Key::F5,
        Key::F6,
        Key::F7,
        Key::F8,
        Key::F9,
        Key::F10,
        Key::F11,
        Key::F12,
        Key::F13,
        Key::F14,
        Key::F15,
        Key::F16,
        Key::F17,
        Key::F18,
        Key::F19,
        Key::F20,
        Key::Enter,
        Key::Escape,
        Key::Backspace,
        Key::Tab,
        Key::Space,
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Home,
        Key::End,
        Key::PageUp,
        Key::PageDown,
        Key::Delete,
        Key::Insert,
        Key::PrintScreen,
        Key::ScrollLock,
        Key::Pause,
        Key::Numpad0,
        Key::Numpad1,
        Key::Numpad2,
        Key::Numpad3,
        Key::Numpad4,
        Key::Numpad5,
        Key::Numpad6,
        Key::Numpad7,
        Key::Numpad8,
        Key::Numpad9,
        Key::NumpadDivide,
        Key::NumpadMultiply,
        Key::NumpadMinus,
        Key::NumpadPlus,
        Key::NumpadEnter,
        Key::NumpadDecimal,
        Key::ShiftLeft,
        Key::ShiftRight,
        Key::CtrlLeft,
        Key::CtrlRight,
        Key::AltLeft,
        Key::AltRight,
        Key::SuperLeft,
        Key::SuperRight,
        Key::CapsLock,
        Key::NumLock,
        Key::Menu,
        Key::Mute,
        Key::VolumeDown,
        Key::VolumeUp,
        Key::MediaPlayPause,
        Key::MediaStop,
        Key::MediaNext,
        Key::MediaPrevious,
        Key::Grave,
        Key::Minus,
        Key::Equal,
        Key::LeftBracket,
        Key::RightBracket,
        Key::Backslash,
        Key::Semicolon,
        Key::Apostrophe,
        Key::Comma,
        Key::Period,
        Key::Slash,
    ];

    /// Converts a raw wire value to a [`Key`].
    ///
    /// Returns [`Key::Unknown`] for `0` and for any value past the last
    /// assigned key.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => Key::Unknown,
            v => Key::ALL
                .get(usize::from(v) - 1)
                .copied()
                .unwrap_or(Key::Unknown),
        }
    }

    /// Returns the wire value of this key.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns `true` for the eight chord modifiers (left/right Shift, Ctrl,
    /// Alt, Super).  Lock keys are not chord modifiers.
    pub fn is_modifier(self) -> bool {
        !self.modifier_bit().is_empty()
    }

    /// The [`Modifier`] bit this key holds while pressed, or
    /// [`Modifier::NONE`] for every other key.
    pub fn modifier_bit(self) -> Modifier {
        match self {
            Key::ShiftLeft | Key::ShiftRight => Modifier::SHIFT,
            Key::CtrlLeft | Key::CtrlRight => Modifier::CTRL,
            Key::AltLeft | Key::AltRight => Modifier::ALT,
            Key::SuperLeft | Key::SuperRight => Modifier::SUPER,
            _ => Modifier::NONE,
        }
    }

    /// The [`Modifier`] lock bit this key toggles on press, or
    /// [`Modifier::NONE`].
    pub fn lock_bit(self) -> Modifier {
        match self {
            Key::CapsLock => Modifier::CAPS_LOCK,
            Key::NumLock => Modifier::NUM_LOCK,
            _ => Modifier::NONE,
        }
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::Unknown
    }
}

impl From<Key> for u16 {
    fn from(key: Key) -> Self {
        key.as_u16()
    }
}
