//! What a sender backend can do on this machine.

use serde::{Deserialize, Serialize};

/// Feature flags reported by a backend.
///
/// The flags describe the backend as currently constructed: a uinput
/// backend that failed to open its device reports `can_inject_keys ==
/// false` while still reporting the static properties of the mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Physical-key injection is available right now.
    pub can_inject_keys: bool,
    /// Unicode text can be injected without a key mapping.
    pub can_inject_text: bool,
    /// Injected events come from a device the OS treats as real hardware.
    pub can_simulate_hid: bool,
    /// The OS generates auto-repeat for held synthesized keys.
    pub supports_key_repeat: bool,
    /// The backend needs write access to `/dev/uinput`.
    pub needs_uinput_access: bool,
    /// The backend needs the macOS Accessibility permission.
    pub needs_accessibility_perm: bool,
    /// The backend needs the macOS Input Monitoring permission.
    pub needs_input_monitoring_perm: bool,
}
