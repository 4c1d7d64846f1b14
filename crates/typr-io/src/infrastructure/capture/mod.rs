//! Global key capture backends.
//!
//! Each backend runs its OS mechanism on a [`CaptureThread`] and turns
//! native events into [`KeyEvent`]s.  The platform's backend is exported as
//! [`PlatformCapture`], chosen at compile time.
//!
//! [`CaptureThread`]: crate::application::listener::CaptureThread
//! [`KeyEvent`]: typr_core::KeyEvent

pub mod mock;

#[cfg(target_os = "linux")]
pub mod evdev;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "linux")]
pub type PlatformCapture = evdev::EvdevCapture;

#[cfg(target_os = "macos")]
pub type PlatformCapture = macos::MacosCapture;

#[cfg(target_os = "windows")]
pub type PlatformCapture = windows::WindowsCapture;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub type PlatformCapture = unsupported::UnsupportedCapture;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod unsupported {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use typr_core::BackendType;

    use crate::application::listener::{
        CaptureBackend, CaptureError, CaptureThread, ListenerCallback,
    };
    use crate::infrastructure::config::ListenerConfig;

    /// Refuses every start.
    pub struct UnsupportedCapture;

    impl UnsupportedCapture {
        pub fn new(_config: &ListenerConfig) -> Self {
            Self
        }
    }

    impl CaptureBackend for UnsupportedCapture {
        fn backend_type(&self) -> BackendType {
            BackendType::Mock
        }

        fn spawn_capture(
            &self,
            _callback: ListenerCallback,
            _running: Arc<AtomicBool>,
        ) -> Result<CaptureThread, CaptureError> {
            Err(CaptureError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ))
        }
    }
}
