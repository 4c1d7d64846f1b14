//! Sender: synthesizes keyboard input through a platform [`KeyboardDriver`].
//!
//! The facade owns exactly one driver and a Sender-local modifier bitmask.
//! Every operation runs synchronously on the calling thread and reports
//! success as a `bool`; the driver's typed [`DriverError`] is logged and
//! folded into that flag here, so callers never see a panic or an error
//! value for ordinary failures such as an unmapped key.
//!
//! The platform drivers live in the infrastructure layer.

use thiserror::Error;
use tracing::{debug, error, warn};

use typr_core::{set_last_error, BackendType, Capabilities, Key, KeyDelay, Modifier};

use crate::infrastructure::config::SenderConfig;
use crate::infrastructure::driver::PlatformDriver;

/// Error type for driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("backend is not ready")]
    NotReady,
    #[error("no native key code for {0}")]
    UnmappedKey(Key),
    #[error("not supported by this backend: {0}")]
    Unsupported(&'static str),
    #[error("invalid Unicode codepoint {0:#x}")]
    InvalidCodepoint(u32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("platform error: {0}")]
    Platform(String),
}

/// A backend that turns logical key transitions into OS input events.
///
/// Each supported OS provides one implementation in the infrastructure
/// layer.  An implementation acquires its OS resource at construction and
/// never panics if that fails: it stays not-ready, keeps a diagnostic, and
/// every subsequent send returns [`DriverError::NotReady`].
#[cfg_attr(test, mockall::automock)]
pub trait KeyboardDriver: Send {
    fn backend_type(&self) -> BackendType;

    fn capabilities(&self) -> Capabilities;

    /// `true` iff the OS resource handle is valid.
    fn is_ready(&self) -> bool;

    /// Prompts for or re-checks OS permission grants where the platform
    /// supports it.  Returns readiness after the attempt.
    fn request_permissions(&mut self) -> bool {
        self.is_ready()
    }

    /// Native code the backend would emit for `key`, if it has one.
    fn key_code_for(&self, key: Key) -> Option<u32>;

    /// Emits one press or release followed by a synchronization event.
    ///
    /// # Errors
    ///
    /// [`DriverError::NotReady`] or [`DriverError::UnmappedKey`] without
    /// touching the OS; other variants if the OS write fails.
    fn send_key(&mut self, key: Key, down: bool) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// [`DriverError::Unsupported`] on backends that cannot inject
    /// arbitrary Unicode.
    fn type_text(&mut self, text: &str) -> Result<(), DriverError>;

    /// # Errors
    ///
    /// Same conditions as [`KeyboardDriver::type_text`].
    fn type_character(&mut self, ch: char) -> Result<(), DriverError>;

    /// Forces a pending synchronization event to the OS.
    fn flush(&mut self) -> Result<(), DriverError>;

    fn key_delay(&self) -> KeyDelay;

    fn set_key_delay(&mut self, delay: KeyDelay);

    /// Blocks for the configured inter-event delay.
    fn delay(&self) {
        self.key_delay().pause();
    }

    /// Why the driver is not ready, if it failed to acquire its resource.
    fn diagnostic(&self) -> Option<String>;
}

/// Keyboard input synthesizer.
///
/// ```no_run
/// use typr_io::{Key, Modifier, Sender};
///
/// let mut sender = Sender::new();
/// if sender.is_ready() {
///     sender.combo(Modifier::CTRL, Key::C);
/// }
/// ```
pub struct Sender<D: KeyboardDriver = PlatformDriver> {
    driver: D,
    active_modifiers: Modifier,
}

impl Sender<PlatformDriver> {
    /// Creates a Sender backed by this platform's driver with default
    /// settings.  Never fails; query [`Sender::is_ready`] afterwards.
    pub fn new() -> Self {
        Self::with_config(&SenderConfig::default())
    }

    pub fn with_config(config: &SenderConfig) -> Self {
        Self::with_driver(PlatformDriver::open(config))
    }
}

impl<D: KeyboardDriver + Default> Default for Sender<D> {
    /// The empty state left behind by `std::mem::take`: a not-ready
    /// driver holding no OS resource.
    fn default() -> Self {
        Self::with_driver(D::default())
    }
}

impl<D: KeyboardDriver> Sender<D> {
    /// Wraps an already-constructed driver.
    pub fn with_driver(driver: D) -> Self {
        Self {
            driver,
            active_modifiers: Modifier::NONE,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    // ── Status ───────────────────────────────────────────────────────────────

    pub fn capabilities(&self) -> Capabilities {
        self.driver.capabilities()
    }

    pub fn is_ready(&self) -> bool {
        self.driver.is_ready()
    }

    /// Which backend is compiled in.
    pub fn backend_type(&self) -> BackendType {
        self.driver.backend_type()
    }

    pub fn request_permissions(&mut self) -> bool {
        let ready = self.driver.request_permissions();
        debug!(ready, backend = %self.driver.backend_type(), "request_permissions");
        ready
    }

    /// The driver's acquisition-failure text, if any.
    pub fn diagnostic(&self) -> Option<String> {
        self.driver.diagnostic()
    }

    /// Modifiers this Sender believes it is holding.
    ///
    /// This is bookkeeping of calls made through this instance, not the
    /// real OS modifier state.
    pub fn active_modifiers(&self) -> Modifier {
        self.active_modifiers
    }

    // ── Single keys ──────────────────────────────────────────────────────────

    pub fn key_down(&mut self, key: Key) -> bool {
        debug!(%key, "key_down");
        if key.is_modifier() {
            self.active_modifiers |= key.modifier_bit();
        }
        self.send(key, true)
    }

    pub fn key_up(&mut self, key: Key) -> bool {
        debug!(%key, "key_up");
        let sent = self.send(key, false);
        if key.is_modifier() {
            self.active_modifiers -= key.modifier_bit();
        }
        sent
    }

    /// Press, pause, release.  No release is sent if the press failed.
    pub fn tap(&mut self, key: Key) -> bool {
        if !self.key_down(key) {
            return false;
        }
        self.driver.delay();
        self.key_up(key)
    }

    // ── Modifiers ────────────────────────────────────────────────────────────

    /// Presses the left variant of every modifier in `mods`.
    ///
    /// Every modifier is attempted even if an earlier one fails.
    pub fn hold_modifier(&mut self, mods: Modifier) -> bool {
        mods.iter_chord().fold(true, |all_ok, bit| {
            let ok = bit.left_key().is_some_and(|key| self.key_down(key));
            all_ok && ok
        })
    }

    /// Releases the left variant of every modifier in `mods`.
    pub fn release_modifier(&mut self, mods: Modifier) -> bool {
        mods.iter_chord().fold(true, |all_ok, bit| {
            let ok = bit.left_key().is_some_and(|key| self.key_up(key));
            all_ok && ok
        })
    }

    pub fn release_all_modifiers(&mut self) -> bool {
        self.release_modifier(Modifier::CHORD)
    }

    /// Holds `mods`, taps `key`, then releases `mods`.
    ///
    /// The release always runs so modifiers are never left logically
    /// stuck, but only the hold and tap decide the result.  If the hold
    /// fails nothing else is sent or waited for before the release.
    pub fn combo(&mut self, mods: Modifier, key: Key) -> bool {
        debug!(%mods, %key, "combo");
        let held = self.hold_modifier(mods);
        let tapped = held && {
            self.driver.delay();
            let tapped = self.tap(key);
            self.driver.delay();
            tapped
        };
        if !self.release_modifier(mods) {
            warn!(%mods, "combo: releasing modifiers failed");
        }
        tapped
    }

    // ── Text ─────────────────────────────────────────────────────────────────

    pub fn type_text(&mut self, text: &str) -> bool {
        debug!(chars = text.chars().count(), "type_text");
        Self::report("type_text", self.driver.type_text(text))
    }

    /// Types a UTF-32 buffer.  Any invalid codepoint fails the whole call
    /// before anything is sent.
    pub fn type_text_utf32(&mut self, codepoints: &[u32]) -> bool {
        let text: Result<String, DriverError> = codepoints
            .iter()
            .map(|&cp| char::from_u32(cp).ok_or(DriverError::InvalidCodepoint(cp)))
            .collect();
        match text {
            Ok(text) => self.type_text(&text),
            Err(e) => {
                set_last_error(format!("type_text_utf32: {e}"));
                Self::report("type_text_utf32", Err(e))
            }
        }
    }

    pub fn type_character(&mut self, codepoint: u32) -> bool {
        let Some(ch) = char::from_u32(codepoint) else {
            let err = DriverError::InvalidCodepoint(codepoint);
            set_last_error(format!("type_character: {err}"));
            return Self::report("type_character", Err(err));
        };
        debug!(?ch, "type_character");
        Self::report("type_character", self.driver.type_character(ch))
    }

    // ── Timing ───────────────────────────────────────────────────────────────

    /// Returns `true` if a synchronization event was written.
    pub fn flush(&mut self) -> bool {
        if !self.driver.is_ready() {
            return false;
        }
        Self::report("flush", self.driver.flush())
    }

    /// Takes effect on subsequent operations only.
    pub fn set_key_delay(&mut self, micros: u32) {
        debug!(micros, "set_key_delay");
        self.driver.set_key_delay(KeyDelay::from_micros(micros));
    }

    pub fn key_delay(&self) -> u32 {
        self.driver.key_delay().as_micros()
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn send(&mut self, key: Key, down: bool) -> bool {
        let result = self.driver.send_key(key, down);
        Self::report("send_key", result)
    }

    fn report(op: &str, result: Result<(), DriverError>) -> bool {
        match result {
            Ok(()) => true,
            Err(DriverError::UnmappedKey(key)) => {
                debug!(op, %key, "key has no mapping on this backend");
                false
            }
            Err(DriverError::NotReady) => {
                debug!(op, "backend not ready");
                false
            }
            Err(DriverError::Unsupported(what)) => {
                debug!(op, what, "operation not supported by backend");
                false
            }
            Err(e) => {
                error!(op, error = %e, "driver operation failed");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn ready_mock() -> MockKeyboardDriver {
        let mut driver = MockKeyboardDriver::new();
        driver.expect_is_ready().return_const(true);
        driver.expect_delay().return_const(());
        driver
    }

    // ── Single keys ──────────────────────────────────────────────────────────

    #[test]
    fn test_key_down_delegates_to_send_key() {
        // Arrange
        let mut driver = ready_mock();
        driver
            .expect_send_key()
            .with(eq(Key::A), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(sender.key_down(Key::A));
        assert_eq!(sender.active_modifiers(), Modifier::NONE);
    }

    #[test]
    fn test_unmapped_key_returns_false() {
        // Arrange
        let mut driver = ready_mock();
        driver
            .expect_send_key()
            .returning(|key, _| Err(DriverError::UnmappedKey(key)));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.key_down(Key::MediaNext));
    }

    #[test]
    fn test_tap_on_not_ready_driver_sends_no_key_up() {
        // Arrange – only the key-down may reach the driver
        let mut driver = MockKeyboardDriver::new();
        driver
            .expect_send_key()
            .with(eq(Key::A), eq(true))
            .times(1)
            .returning(|_, _| Err(DriverError::NotReady));
        driver
            .expect_send_key()
            .with(eq(Key::A), eq(false))
            .never();
        driver.expect_delay().never();
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.tap(Key::A));
    }

    #[test]
    fn test_tap_sends_down_delay_up_in_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut driver = MockKeyboardDriver::new();
        driver
            .expect_send_key()
            .with(eq(Key::Enter), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        driver
            .expect_delay()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        driver
            .expect_send_key()
            .with(eq(Key::Enter), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(sender.tap(Key::Enter));
    }

    // ── Modifier bookkeeping ─────────────────────────────────────────────────

    #[test]
    fn test_modifier_bits_follow_key_down_and_key_up() {
        // Arrange
        let mut driver = ready_mock();
        driver.expect_send_key().returning(|_, _| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act
        sender.key_down(Key::CtrlLeft);
        sender.key_down(Key::ShiftLeft);
        sender.key_up(Key::ShiftLeft);

        // Assert – only Shift was cleared
        assert_eq!(sender.active_modifiers(), Modifier::CTRL);
    }

    #[test]
    fn test_modifier_bits_update_even_when_send_fails() {
        // Arrange
        let mut driver = MockKeyboardDriver::new();
        driver
            .expect_send_key()
            .returning(|_, _| Err(DriverError::NotReady));
        let mut sender = Sender::with_driver(driver);

        // Act
        let ok = sender.key_down(Key::AltRight);

        // Assert
        assert!(!ok);
        assert!(sender.active_modifiers().contains(Modifier::ALT));
    }

    #[test]
    fn test_hold_modifier_attempts_every_bit_after_a_failure() {
        // Arrange – Shift fails, Ctrl and Alt must still be tried
        let mut driver = ready_mock();
        driver
            .expect_send_key()
            .with(eq(Key::ShiftLeft), eq(true))
            .times(1)
            .returning(|_, _| Err(DriverError::Platform("boom".into())));
        driver
            .expect_send_key()
            .with(eq(Key::CtrlLeft), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        driver
            .expect_send_key()
            .with(eq(Key::AltLeft), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act
        let ok = sender.hold_modifier(Modifier::SHIFT | Modifier::CTRL | Modifier::ALT);

        // Assert
        assert!(!ok);
    }

    #[test]
    fn test_hold_modifier_ignores_lock_bits() {
        // Arrange – CapsLock is not a chord modifier; nothing is sent
        let mut driver = ready_mock();
        driver.expect_send_key().never();
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(sender.hold_modifier(Modifier::CAPS_LOCK));
    }

    #[test]
    fn test_release_all_modifiers_releases_four_left_keys() {
        // Arrange
        let mut driver = ready_mock();
        for key in [Key::ShiftLeft, Key::CtrlLeft, Key::AltLeft, Key::SuperLeft] {
            driver
                .expect_send_key()
                .with(eq(key), eq(false))
                .times(1)
                .returning(|_, _| Ok(()));
        }
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(sender.release_all_modifiers());
    }

    // ── Combo ────────────────────────────────────────────────────────────────

    #[test]
    fn test_combo_failed_tap_still_releases_modifiers() {
        // Arrange
        let mut driver = ready_mock();
        driver
            .expect_send_key()
            .with(eq(Key::CtrlLeft), eq(true))
            .times(1)
            .returning(|_, _| Ok(()));
        driver
            .expect_send_key()
            .with(eq(Key::MediaNext), eq(true))
            .times(1)
            .returning(|key, _| Err(DriverError::UnmappedKey(key)));
        driver
            .expect_send_key()
            .with(eq(Key::CtrlLeft), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act
        let ok = sender.combo(Modifier::CTRL, Key::MediaNext);

        // Assert
        assert!(!ok);
        assert_eq!(sender.active_modifiers(), Modifier::NONE);
    }

    #[test]
    fn test_combo_failed_hold_skips_tap_and_pauses() {
        // Arrange
        let mut driver = MockKeyboardDriver::new();
        driver.expect_delay().never();
        driver
            .expect_send_key()
            .with(eq(Key::SuperLeft), eq(true))
            .returning(|_, _| Err(DriverError::NotReady));
        driver
            .expect_send_key()
            .with(eq(Key::L), eq(true))
            .never();
        driver
            .expect_send_key()
            .with(eq(Key::SuperLeft), eq(false))
            .times(1)
            .returning(|_, _| Err(DriverError::NotReady));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.combo(Modifier::SUPER, Key::L));
    }

    // ── Text ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_type_text_unsupported_returns_false() {
        // Arrange
        let mut driver = ready_mock();
        driver
            .expect_type_text()
            .returning(|_| Err(DriverError::Unsupported("unicode text")));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.type_text("héllo"));
    }

    #[test]
    fn test_type_text_utf32_converts_valid_codepoints() {
        // Arrange
        let mut driver = ready_mock();
        driver
            .expect_type_text()
            .with(eq("hé€"))
            .times(1)
            .returning(|_| Ok(()));
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(sender.type_text_utf32(&[0x68, 0xE9, 0x20AC]));
    }

    #[test]
    fn test_type_text_utf32_rejects_surrogates_without_sending() {
        // Arrange
        let mut driver = ready_mock();
        driver.expect_type_text().never();
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.type_text_utf32(&[0x61, 0xD800]));
    }

    #[test]
    fn test_type_character_rejects_out_of_range_codepoint() {
        // Arrange
        let mut driver = ready_mock();
        driver.expect_type_character().never();
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.type_character(0x11_0000));
    }

    // ── Timing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_set_key_delay_forwards_micros() {
        // Arrange
        let mut driver = MockKeyboardDriver::new();
        driver
            .expect_set_key_delay()
            .with(eq(KeyDelay::from_micros(250)))
            .times(1)
            .return_const(());
        driver
            .expect_key_delay()
            .return_const(KeyDelay::from_micros(250));
        let mut sender = Sender::with_driver(driver);

        // Act
        sender.set_key_delay(250);

        // Assert
        assert_eq!(sender.key_delay(), 250);
    }

    #[test]
    fn test_flush_is_noop_when_not_ready() {
        // Arrange
        let mut driver = MockKeyboardDriver::new();
        driver.expect_is_ready().return_const(false);
        driver.expect_flush().never();
        let mut sender = Sender::with_driver(driver);

        // Act / Assert
        assert!(!sender.flush());
    }
}
