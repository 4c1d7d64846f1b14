//! Modifier state.
//!
//! [`Modifier`] is a bitmask over the four chord modifiers plus the two
//! lock states.  Left and right variants of a modifier share one bit.
//! [`ModifierTracker`] derives the mask from a stream of key transitions,
//! the way listeners see them.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::keymap::key::Key;

/// Bitmask of active modifiers.
///
/// | Bit  | Meaning   |
/// |------|-----------|
/// | 0x01 | Shift     |
/// | 0x02 | Ctrl      |
/// | 0x04 | Alt       |
/// | 0x08 | Super     |
/// | 0x10 | CapsLock  |
/// | 0x20 | NumLock   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifier(u8);

impl Modifier {
    pub const NONE: Modifier = Modifier(0x00);
    pub const SHIFT: Modifier = Modifier(0x01);
    pub const CTRL: Modifier = Modifier(0x02);
    pub const ALT: Modifier = Modifier(0x04);
    pub const SUPER: Modifier = Modifier(0x08);
    pub const CAPS_LOCK: Modifier = Modifier(0x10);
    pub const NUM_LOCK: Modifier = Modifier(0x20);

    /// The four chord modifiers a sender can hold.
    pub const CHORD: Modifier = Modifier(0x0F);
    const ALL_BITS: u8 = 0x3F;

    /// Builds a mask from raw bits, dropping undefined bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Modifier(bits & Self::ALL_BITS)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Modifier) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn toggle(&mut self, other: Modifier) {
        self.0 ^= other.0;
    }

    /// Each chord bit set in `self`, one at a time, in the order Shift,
    /// Ctrl, Alt, Super.  Lock bits are skipped.
    pub fn iter_chord(self) -> impl Iterator<Item = Modifier> {
        [Modifier::SHIFT, Modifier::CTRL, Modifier::ALT, Modifier::SUPER]
            .into_iter()
            .filter(move |bit| self.contains(*bit))
    }

    /// The left-side key for a single chord bit, or `None` for lock bits,
    /// combined masks, and the empty mask.
    pub fn left_key(self) -> Option<Key> {
        match self {
            Modifier::SHIFT => Some(Key::ShiftLeft),
            Modifier::CTRL => Some(Key::CtrlLeft),
            Modifier::ALT => Some(Key::AltLeft),
            Modifier::SUPER => Some(Key::SuperLeft),
            _ => None,
        }
    }
}

impl BitOr for Modifier {
    type Output = Modifier;

    fn bitor(self, rhs: Modifier) -> Modifier {
        Modifier(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifier {
    fn bitor_assign(&mut self, rhs: Modifier) {
        self.0 |= rhs.0;
    }
}

impl Sub for Modifier {
    type Output = Modifier;

    fn sub(self, rhs: Modifier) -> Modifier {
        Modifier(self.0 & !rhs.0)
    }
}

impl SubAssign for Modifier {
    fn sub_assign(&mut self, rhs: Modifier) {
        self.0 &= !rhs.0;
    }
}

impl BitAnd for Modifier {
    type Output = Modifier;

    fn bitand(self, rhs: Modifier) -> Modifier {
        Modifier(self.0 & rhs.0)
    }
}

impl BitAndAssign for Modifier {
    fn bitand_assign(&mut self, rhs: Modifier) {
        self.0 &= rhs.0;
    }
}

impl Not for Modifier {
    type Output = Modifier;

    fn not(self) -> Modifier {
        Modifier(!self.0 & Self::ALL_BITS)
    }
}

impl From<Modifier> for u8 {
    fn from(m: Modifier) -> u8 {
        m.0
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names = [
            (Modifier::SHIFT, "Shift"),
            (Modifier::CTRL, "Ctrl"),
            (Modifier::ALT, "Alt"),
            (Modifier::SUPER, "Super"),
            (Modifier::CAPS_LOCK, "CapsLock"),
            (Modifier::NUM_LOCK, "NumLock"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.contains(bit) {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ── Held-key tracking ─────────────────────────────────────────────────────────

/// Keys whose held state the tracker records, one bit each.
const TRACKED: [Key; 10] = [
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
];

/// Derives the current [`Modifier`] mask from observed key transitions.
///
/// A chord bit stays set while either side's key is held.  Lock bits flip
/// on the up-to-down transition of their key; auto-repeat presses of a held
/// lock key do not toggle again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierTracker {
    held: u16,
    locks: Modifier,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking with the lock bits of `locks` already on, e.g. as
    /// read from the keyboard LEDs.
    pub fn with_locks(locks: Modifier) -> Self {
        Self {
            held: 0,
            locks: locks & (Modifier::CAPS_LOCK | Modifier::NUM_LOCK),
        }
    }

    /// Records a key transition and returns the resulting mask.
    pub fn on_key(&mut self, key: Key, pressed: bool) -> Modifier {
        if let Some(index) = TRACKED.iter().position(|k| *k == key) {
            let bit = 1u16 << index;
            let was_held = self.held & bit != 0;
            if pressed {
                if !was_held {
                    self.locks.toggle(key.lock_bit());
                }
                self.held |= bit;
            } else {
                self.held &= !bit;
            }
        }
        self.current()
    }

    /// The mask implied by everything seen so far.
    pub fn current(&self) -> Modifier {
        let chords = TRACKED
            .iter()
            .enumerate()
            .filter(|(i, _)| self.held & (1u16 << *i) != 0)
            .fold(Modifier::NONE, |acc, (_, key)| acc | key.modifier_bit());
        chords | self.locks
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_values_are_stable() {
        assert_eq!(Modifier::SHIFT.bits(), 0x01);
        assert_eq!(Modifier::CTRL.bits(), 0x02);
        assert_eq!(Modifier::ALT.bits(), 0x04);
        assert_eq!(Modifier::SUPER.bits(), 0x08);
        assert_eq!(Modifier::CAPS_LOCK.bits(), 0x10);
        assert_eq!(Modifier::NUM_LOCK.bits(), 0x20);
    }

    #[test]
    fn test_bit_operators_combine_and_mask() {
        let m = Modifier::SHIFT | Modifier::CTRL;
        assert!(m.contains(Modifier::SHIFT));
        assert!(m.contains(Modifier::CTRL));
        assert!(!m.contains(Modifier::ALT));
        assert_eq!(m & Modifier::CTRL, Modifier::CTRL);
        assert_eq!((m & !Modifier::SHIFT), Modifier::CTRL);
    }

    #[test]
    fn test_from_bits_truncate_drops_undefined_bits() {
        assert_eq!(Modifier::from_bits_truncate(0xFF).bits(), 0x3F);
    }

    #[test]
    fn test_iter_chord_yields_single_bits_in_fixed_order() {
        let bits: Vec<Modifier> = (Modifier::SUPER | Modifier::SHIFT | Modifier::CAPS_LOCK)
            .iter_chord()
            .collect();
        assert_eq!(bits, vec![Modifier::SHIFT, Modifier::SUPER]);
    }

    #[test]
    fn test_left_key_only_for_single_chord_bits() {
        assert_eq!(Modifier::SHIFT.left_key(), Some(Key::ShiftLeft));
        assert_eq!(Modifier::SUPER.left_key(), Some(Key::SuperLeft));
        assert_eq!(Modifier::CAPS_LOCK.left_key(), None);
        assert_eq!((Modifier::SHIFT | Modifier::CTRL).left_key(), None);
    }

    #[test]
    fn test_subtraction_clears_only_named_bits() {
        let mut m = Modifier::SHIFT | Modifier::ALT | Modifier::NUM_LOCK;
        assert_eq!(m - Modifier::ALT, Modifier::SHIFT | Modifier::NUM_LOCK);
        m -= Modifier::SHIFT | Modifier::CTRL;
        assert_eq!(m, Modifier::ALT | Modifier::NUM_LOCK);
    }

    #[test]
    fn test_display_joins_names() {
        assert_eq!(Modifier::NONE.to_string(), "None");
        assert_eq!((Modifier::CTRL | Modifier::SHIFT).to_string(), "Shift+Ctrl");
    }

    #[test]
    fn test_tracker_keeps_shift_while_either_side_is_held() {
        // Arrange
        let mut tracker = ModifierTracker::new();

        // Act
        tracker.on_key(Key::ShiftLeft, true);
        tracker.on_key(Key::ShiftRight, true);
        let after_left_up = tracker.on_key(Key::ShiftLeft, false);
        let after_right_up = tracker.on_key(Key::ShiftRight, false);

        // Assert
        assert_eq!(after_left_up, Modifier::SHIFT);
        assert_eq!(after_right_up, Modifier::NONE);
    }

    #[test]
    fn test_tracker_toggles_locks_on_press_only() {
        let mut tracker = ModifierTracker::new();
        assert_eq!(tracker.on_key(Key::CapsLock, true), Modifier::CAPS_LOCK);
        // auto-repeat while held
        assert_eq!(tracker.on_key(Key::CapsLock, true), Modifier::CAPS_LOCK);
        assert_eq!(tracker.on_key(Key::CapsLock, false), Modifier::CAPS_LOCK);
        assert_eq!(tracker.on_key(Key::CapsLock, true), Modifier::NONE);
    }

    #[test]
    fn test_tracker_seeded_locks_survive_chords() {
        let mut tracker = ModifierTracker::with_locks(Modifier::NUM_LOCK | Modifier::SHIFT);
        assert_eq!(tracker.current(), Modifier::NUM_LOCK);
        let m = tracker.on_key(Key::CtrlRight, true);
        assert_eq!(m, Modifier::NUM_LOCK | Modifier::CTRL);
        assert_eq!(tracker.on_key(Key::A, true), m);
    }
}
