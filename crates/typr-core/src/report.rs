//! Process-wide error reporting and version information.
//!
//! Facade operations report success as a `bool`.  When they fail because a
//! precondition was violated or an OS resource could not be acquired, they
//! also store a message here so boundary layers (a CLI, a foreign-function
//! wrapper) can show something better than "false".  Ordinary outcomes such
//! as "this key has no mapping" do not touch the slot.

use std::sync::{Mutex, PoisonError};

static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// Replaces the stored error message.
pub fn set_last_error(message: impl Into<String>) {
    let message = message.into();
    tracing::debug!(%message, "recording last error");
    *LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
}

/// The most recently stored error message, if any.
pub fn last_error() -> Option<String> {
    LAST_ERROR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn clear_last_error() {
    *LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Version of this library, e.g. `"0.1.0"`.
pub fn library_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
