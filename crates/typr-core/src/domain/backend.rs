use std::fmt;

use serde::{Deserialize, Serialize};

/// Native mechanism behind a sender or listener.
///
/// Selected at build time by target OS; `Mock` is used by tests and by
/// consumers that want to exercise their own logic without an OS backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BackendType {
    LinuxUInput = 0,
    MacOS = 1,
    Windows = 2,
    Mock = 3,
}

impl BackendType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendType::LinuxUInput => "linux-uinput",
            BackendType::MacOS => "macos",
            BackendType::Windows => "windows",
            BackendType::Mock => "mock",
        };
        f.write_str(name)
    }
}
