//! Recording keyboard driver for tests.
//!
//! `MockDriver` performs no OS calls.  Every operation that would reach
//! the OS is appended to an in-memory log of [`MockOp`]s, so tests can
//! assert exactly what a `Sender` emitted and in what order, including
//! the pauses between transitions.
//!
//! ```
//! use typr_io::infrastructure::driver::mock::MockDriver;
//! use typr_io::{Key, Sender};
//!
//! let mut sender = Sender::with_driver(MockDriver::new());
//! sender.tap(Key::A);
//! assert_eq!(sender.driver().key_events(), vec![(Key::A, true), (Key::A, false)]);
//! ```
//!
//! # Failure knobs
//!
//! - [`MockDriver::not_ready`] builds a driver whose resource "failed to
//!   open": every send returns `NotReady` and nothing is logged.
//! - [`MockDriver::with_unmapped`] removes keys from the translation table.
//! - `should_fail` makes every send fail with a platform error after the
//!   ready and mapping checks.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use typr_core::{BackendType, Capabilities, Key, KeyDelay};

use crate::application::sender::{DriverError, KeyboardDriver};
use crate::infrastructure::config::SenderConfig;

/// One operation that reached the (pretend) OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Key { key: Key, down: bool },
    Text(String),
    Flush,
    Delay,
}

/// A driver that records operations instead of performing them.
#[derive(Debug)]
pub struct MockDriver {
    ready: bool,
    text_supported: bool,
    unmapped: HashSet<Key>,
    delay: KeyDelay,
    diagnostic: Option<String>,
    log: Mutex<Vec<MockOp>>,
    /// When `true`, every send fails with [`DriverError::Platform`].
    pub should_fail: bool,
}

impl Default for MockDriver {
    /// The empty, not-ready state.
    fn default() -> Self {
        Self {
            ready: false,
            text_supported: false,
            unmapped: HashSet::new(),
            delay: KeyDelay::ZERO,
            diagnostic: None,
            log: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }
}

impl MockDriver {
    /// A ready driver with no inter-event delay.
    pub fn new() -> Self {
        Self {
            ready: true,
            text_supported: true,
            ..Self::default()
        }
    }

    /// A driver whose resource could not be acquired.
    pub fn not_ready(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: Some(diagnostic.into()),
            ..Self::default()
        }
    }

    /// Platform driver stand-in on targets without an OS backend.
    pub fn open(_config: &SenderConfig) -> Self {
        Self::not_ready("no keyboard backend exists for this platform")
    }

    pub fn with_text_support(mut self, supported: bool) -> Self {
        self.text_supported = supported;
        self
    }

    pub fn with_unmapped(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.unmapped.extend(keys);
        self
    }

    pub fn with_key_delay(mut self, delay: KeyDelay) -> Self {
        self.delay = delay;
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn ops(&self) -> Vec<MockOp> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the key transitions, in order.
    pub fn key_events(&self) -> Vec<(Key, bool)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                MockOp::Key { key, down } => Some((key, down)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, op: MockOp) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn check_text(&self) -> Result<(), DriverError> {
        if !self.ready {
            return Err(DriverError::NotReady);
        }
        if !self.text_supported {
            return Err(DriverError::Unsupported("unicode text injection"));
        }
        if self.should_fail {
            return Err(DriverError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

impl KeyboardDriver for MockDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::Mock
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_inject_keys: self.ready,
            can_inject_text: self.ready && self.text_supported,
            supports_key_repeat: true,
            ..Capabilities::default()
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn key_code_for(&self, key: Key) -> Option<u32> {
        if key == Key::Unknown || self.unmapped.contains(&key) {
            return None;
        }
        Some(u32::from(key.as_u16()))
    }

    fn send_key(&mut self, key: Key, down: bool) -> Result<(), DriverError> {
        if !self.ready {
            return Err(DriverError::NotReady);
        }
        if self.key_code_for(key).is_none() {
            return Err(DriverError::UnmappedKey(key));
        }
        if self.should_fail {
            return Err(DriverError::Platform("mock failure".into()));
        }
        self.record(MockOp::Key { key, down });
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), DriverError> {
        self.check_text()?;
        self.record(MockOp::Text(text.to_string()));
        Ok(())
    }

    fn type_character(&mut self, ch: char) -> Result<(), DriverError> {
        self.check_text()?;
        self.record(MockOp::Text(ch.to_string()));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        if self.ready {
            self.record(MockOp::Flush);
        }
        Ok(())
    }

    fn key_delay(&self) -> KeyDelay {
        self.delay
    }

    fn set_key_delay(&mut self, delay: KeyDelay) {
        self.delay = delay;
    }

    fn delay(&self) {
        self.record(MockOp::Delay);
        self.delay.pause();
    }

    fn diagnostic(&self) -> Option<String> {
        self.diagnostic.clone()
    }
}
