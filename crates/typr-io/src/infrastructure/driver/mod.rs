//! Keyboard driver implementations.
//!
//! The correct implementation is selected at compile time via
//! `#[cfg(target_os = ...)]` and exported as [`PlatformDriver`].  Every
//! driver has an `open(&SenderConfig) -> Self` constructor that never
//! fails; acquisition problems leave the driver not-ready with a
//! diagnostic instead.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod uinput;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub type PlatformDriver = uinput::UinputDriver;

#[cfg(target_os = "macos")]
pub type PlatformDriver = macos::MacosDriver;

#[cfg(target_os = "windows")]
pub type PlatformDriver = windows::WindowsDriver;

/// No OS backend exists here; the Sender is permanently not-ready.
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type PlatformDriver = mock::MockDriver;
