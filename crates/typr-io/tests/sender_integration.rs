//! Integration tests for the `Sender` facade.
//!
//! These drive a `Sender` through the public API with the recording
//! `MockDriver` and assert on the exact sequence of transitions that would
//! have reached the OS.

use typr_io::infrastructure::driver::mock::{MockDriver, MockOp};
use typr_io::{BackendType, Key, Modifier, Sender};

fn sender() -> Sender<MockDriver> {
    Sender::with_driver(MockDriver::new())
}

// ── Combos ────────────────────────────────────────────────────────────────────

#[test]
fn test_combo_emits_holds_then_tap_then_releases() {
    // Arrange
    let mut sender = sender();

    // Act
    let ok = sender.combo(Modifier::SHIFT | Modifier::CTRL, Key::A);

    // Assert
    assert!(ok);
    let events = sender.driver().key_events();
    assert_eq!(
        &events[..4],
        &[
            (Key::ShiftLeft, true),
            (Key::CtrlLeft, true),
            (Key::A, true),
            (Key::A, false),
        ]
    );
    let releases = &events[4..];
    assert_eq!(releases.len(), 2);
    assert!(releases.contains(&(Key::ShiftLeft, false)));
    assert!(releases.contains(&(Key::CtrlLeft, false)));
    assert_eq!(sender.active_modifiers(), Modifier::NONE);
}

#[test]
fn test_combo_pauses_around_the_tap() {
    let mut sender = sender();

    sender.combo(Modifier::ALT, Key::Tab);

    assert_eq!(
        sender.driver().ops(),
        vec![
            MockOp::Key { key: Key::AltLeft, down: true },
            MockOp::Delay,
            MockOp::Key { key: Key::Tab, down: true },
            MockOp::Delay,
            MockOp::Key { key: Key::Tab, down: false },
            MockOp::Delay,
            MockOp::Key { key: Key::AltLeft, down: false },
        ]
    );
}

#[test]
fn test_combo_with_unmapped_key_still_releases_modifiers() {
    // Arrange
    let mut sender = Sender::with_driver(MockDriver::new().with_unmapped([Key::F20]));

    // Act
    let ok = sender.combo(Modifier::SUPER, Key::F20);

    // Assert
    assert!(!ok);
    assert_eq!(
        sender.driver().key_events(),
        vec![(Key::SuperLeft, true), (Key::SuperLeft, false)]
    );
    assert_eq!(sender.active_modifiers(), Modifier::NONE);
}

// ── Not-ready backend ─────────────────────────────────────────────────────────

#[test]
fn test_not_ready_sender_fails_every_operation_without_output() {
    // Arrange
    let mut sender = Sender::with_driver(MockDriver::not_ready("/dev/uinput: permission denied"));

    // Act / Assert
    assert!(!sender.is_ready());
    assert!(!sender.capabilities().can_inject_keys);
    assert!(!sender.tap(Key::A));
    assert!(!sender.combo(Modifier::CTRL, Key::C));
    assert!(!sender.type_text("hello"));
    assert!(!sender.flush());
    assert!(sender.driver().ops().is_empty());
    assert_eq!(
        sender.diagnostic().as_deref(),
        Some("/dev/uinput: permission denied")
    );
}

#[test]
fn test_taken_sender_is_left_empty() {
    // Arrange
    let mut sender = sender();
    sender.key_down(Key::ShiftLeft);

    // Act
    let moved = std::mem::take(&mut sender);

    // Assert
    assert!(!sender.is_ready());
    assert_eq!(sender.active_modifiers(), Modifier::NONE);
    assert!(moved.is_ready());
    assert_eq!(moved.active_modifiers(), Modifier::SHIFT);
}

// ── Modifier bookkeeping ──────────────────────────────────────────────────────

#[test]
fn test_key_up_clears_only_its_own_bit() {
    let mut sender = sender();
    sender.key_down(Key::ShiftLeft);
    sender.key_down(Key::AltLeft);

    sender.key_up(Key::ShiftLeft);

    assert_eq!(sender.active_modifiers(), Modifier::ALT);
}

#[test]
fn test_release_all_modifiers_releases_every_held_chord_key() {
    let mut sender = sender();
    sender.hold_modifier(Modifier::CHORD);
    assert_eq!(sender.active_modifiers(), Modifier::CHORD);

    assert!(sender.release_all_modifiers());

    assert_eq!(sender.active_modifiers(), Modifier::NONE);
    assert_eq!(sender.driver().key_events().len(), 8);
}

// ── Text ──────────────────────────────────────────────────────────────────────

#[test]
fn test_text_is_refused_uniformly_without_text_support() {
    let mut sender = Sender::with_driver(MockDriver::new().with_text_support(false));

    assert!(!sender.capabilities().can_inject_text);
    assert!(!sender.type_text("abc"));
    assert!(!sender.type_text_utf32(&[0x61, 0x62]));
    assert!(!sender.type_character(0x61));
    assert!(sender.driver().ops().is_empty());
}

#[test]
fn test_utf32_text_reaches_driver_as_one_string() {
    let mut sender = sender();

    assert!(sender.type_text_utf32(&[0x48, 0x69, 0x1F600]));

    assert_eq!(
        sender.driver().ops(),
        vec![MockOp::Text("Hi\u{1F600}".to_string())]
    );
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[test]
fn test_key_delay_is_configurable() {
    let mut sender = sender();

    sender.set_key_delay(2500);

    assert_eq!(sender.key_delay(), 2500);
    assert_eq!(sender.backend_type(), BackendType::Mock);
}
