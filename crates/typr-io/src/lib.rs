//! typr-io library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the `typr-consumer` binary share the same module tree.
//!
//! # What does typr-io do?
//!
//! - A [`Sender`] synthesizes keyboard input: single key transitions, taps,
//!   modifier chords, and (where the backend allows it) Unicode text.
//! - A [`Listener`] observes every key transition on the machine and hands
//!   each one to a callback running on a background capture thread.
//!
//! Both are thin facades.  The real work is done by one backend per target
//! OS, chosen at compile time:
//!
//! | OS      | Sender backend                  | Listener backend             |
//! |---------|---------------------------------|------------------------------|
//! | Linux   | uinput virtual keyboard         | `/dev/input/event*` readers  |
//! | macOS   | `CGEventPost`                   | `CGEventTap` (listen-only)   |
//! | Windows | `SendInput`                     | `WH_KEYBOARD_LL` hook        |
//!
//! Mock backends for both sides live next to the real ones and are public,
//! so downstream crates can test their own logic without touching the OS.

/// Application layer: the `Sender` and `Listener` facades and the traits
/// backends implement.
pub mod application;

/// Infrastructure layer: OS backends and configuration persistence.
pub mod infrastructure;

pub use application::listener::{
    CaptureBackend, CaptureError, CaptureThread, Listener, ListenerCallback, StartupSignal,
};
pub use application::sender::{DriverError, KeyboardDriver, Sender};
pub use infrastructure::capture::PlatformCapture;
pub use infrastructure::config::{ListenerConfig, SenderConfig, TyprConfig};
pub use infrastructure::driver::PlatformDriver;

pub use typr_core::{
    clear_last_error, key_to_string, last_error, library_version, string_to_key, BackendType,
    Capabilities, Key, KeyDelay, KeyEvent, Modifier,
};
