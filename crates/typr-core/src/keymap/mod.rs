//! Key naming and native key code translation.
//!
//! The canonical representation is the logical [`Key`] enumeration.
//! Native codes (Linux input event codes, macOS `CGKeyCode`, Windows
//! virtual-key codes) are translated to/from [`Key`] at the send and
//! capture boundaries.

pub mod ascii;
pub mod key;
pub mod linux_evdev;
pub mod macos_cg;
pub mod names;
pub mod windows_vk;

pub use key::Key;

use crate::domain::modifier::Modifier;

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a [`Key`] to a Linux input event code (`KEY_*`).
    ///
    /// Returns `None` if the key has no evdev equivalent.
    pub fn key_to_evdev(key: Key) -> Option<u16> {
        linux_evdev::key_to_code(key)
    }

    /// Translates a Linux input event code to a [`Key`].
    ///
    /// Returns [`Key::Unknown`] if no mapping exists for `code`.
    pub fn evdev_to_key(code: u16) -> Key {
        linux_evdev::code_to_key(code)
    }

    /// Translates a [`Key`] to a macOS `CGKeyCode` value.
    ///
    /// Returns `None` if the key has no macOS virtual key code.
    pub fn key_to_macos_cgkeycode(key: Key) -> Option<u16> {
        macos_cg::key_to_cgkeycode(key)
    }

    /// Translates a macOS `CGKeyCode` to a [`Key`].
    pub fn macos_cgkeycode_to_key(code: u16) -> Key {
        macos_cg::cgkeycode_to_key(code)
    }

    /// Translates a [`Key`] to a Windows Virtual Key code.
    ///
    /// Returns `None` if the key has no Windows VK equivalent.
    pub fn key_to_windows_vk(key: Key) -> Option<u16> {
        windows_vk::key_to_vk(key)
    }

    /// Translates a Windows Virtual Key code to a [`Key`].
    ///
    /// `extended` is the `LLKHF_EXTENDED` flag of the hook event; it is the
    /// only way to tell the numpad Enter key from the main Enter key.
    pub fn windows_vk_to_key(vk: u16, extended: bool) -> Key {
        windows_vk::vk_to_key(vk, extended)
    }

    /// The Unicode scalar a US-ANSI layout produces for `key` under
    /// `modifiers`, or `0` when the key produces no printable character.
    pub fn codepoint_for(key: Key, modifiers: Modifier) -> u32 {
        ascii::codepoint_for(key, modifiers)
    }
}
