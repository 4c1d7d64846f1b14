//! # typr-core
//!
//! Shared, OS-free foundation for typr-io: the logical key and modifier
//! model, key code translation tables, capability descriptors, and the
//! process-wide error/version reporting used by boundary layers.
//!
//! This crate has zero dependencies on OS APIs.  Everything that touches a
//! device node, an event tap, or a hook lives in `typr-io`.
//!
//! # Architecture overview
//!
//! typr-io synthesizes keyboard input (`Sender`) and observes global
//! keyboard input (`Listener`) through one interface whose behavior is
//! supplied by a platform backend: a Linux virtual-HID device, macOS
//! CoreGraphics events, or Windows `SendInput` and low-level hooks.
//!
//! This crate defines what all of those backends agree on:
//!
//! - **`keymap`** – The closed [`Key`] enumeration, name lookup
//!   ([`string_to_key`], [`key_to_string`]), and translation tables from
//!   logical keys to each platform's native codes (Linux input event
//!   codes, macOS `CGKeyCode`, Windows virtual-key codes).
//!
//! - **`domain`** – Value types shared by every backend: the [`Modifier`]
//!   bitmask, [`Capabilities`], [`BackendType`], the normalized listener
//!   [`KeyEvent`], and the inter-event [`KeyDelay`].
//!
//! - **`report`** – The process-wide "last error" slot and the library
//!   version string.

pub mod domain;
pub mod keymap;
pub mod report;

pub use domain::backend::BackendType;
pub use domain::capabilities::Capabilities;
pub use domain::event::KeyEvent;
pub use domain::modifier::{Modifier, ModifierTracker};
pub use domain::timing::KeyDelay;
pub use keymap::key::Key;
pub use keymap::names::{key_to_string, string_to_key, ParseKeyError};
pub use keymap::KeyMapper;
pub use report::{clear_last_error, last_error, library_version, set_last_error};
