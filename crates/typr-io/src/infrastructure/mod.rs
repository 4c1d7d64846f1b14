//! Infrastructure layer for typr-io.
//!
//! Contains the OS-facing adapters behind the `Sender` and `Listener`
//! facades, plus configuration persistence.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `typr_core`, but MUST NOT be imported by `typr_core`.
//!
//! # Sub-modules
//!
//! - **`driver`** – `KeyboardDriver` implementations.  Linux creates a
//!   uinput virtual keyboard, macOS posts `CGEvent`s, Windows calls
//!   `SendInput`.  The platform's driver is exported as `PlatformDriver`,
//!   selected at compile time with `#[cfg(target_os)]`.  A recording
//!   `MockDriver` is always available.
//!
//! - **`capture`** – `CaptureBackend` implementations.  Linux reads every
//!   keyboard under `/dev/input`, macOS installs a listen-only event tap,
//!   Windows installs a `WH_KEYBOARD_LL` hook.  A scriptable `MockCapture`
//!   is always available.
//!
//! - **`config`** – TOML settings file in the platform config directory.

pub mod capture;
pub mod config;
pub mod driver;
