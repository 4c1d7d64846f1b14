use serde::{Deserialize, Serialize};

use super::modifier::Modifier;
use crate::keymap::{ascii, key::Key};

/// One observed key transition, as delivered to a listener callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Character of the key under `modifiers` on a US layout, or `0` for
    /// none.  Set on releases too: a release carries the same character as
    /// the press it ends, provided the modifiers did not change in between.
    pub codepoint: u32,
    /// Logical key; [`Key::Unknown`] when the native code has no mapping.
    pub key: Key,
    /// Modifier mask after applying this transition.
    pub modifiers: Modifier,
    /// `true` for press (including auto-repeat), `false` for release.
    pub pressed: bool,
}

impl KeyEvent {
    /// Builds an event, filling `codepoint` from the US table.
    pub fn new(key: Key, modifiers: Modifier, pressed: bool) -> Self {
        Self {
            codepoint: ascii::codepoint_for(key, modifiers),
            key,
            modifiers,
            pressed,
        }
    }

    /// The event's character, if it has a valid non-zero one.
    pub fn character(&self) -> Option<char> {
        match self.codepoint {
            0 => None,
            cp => char::from_u32(cp),
        }
    }
}
