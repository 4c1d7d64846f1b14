//! macOS keyboard driver posting Quartz events.
//!
//! Each transition is a `CGEvent` keyboard event created from a
//! `HIDSystemState` event source and posted at the HID tap location, so it
//! enters the event stream below every application.  The driver tracks
//! which modifiers it is holding and stamps every event with the matching
//! `CGEventFlags`; without that, a synthesized Cmd-down followed by C
//! reaches applications as a plain "c".
//!
//! Text is posted as keycode-0 events carrying a Unicode string, which
//! bypasses the active keyboard layout.
//!
//! # Permissions
//!
//! Posting events requires the Accessibility permission.  The driver
//! checks it at construction; [`KeyboardDriver::request_permissions`]
//! shows the system prompt and re-checks.

#![cfg(target_os = "macos")]

use std::ffi::c_void;

use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use tracing::{debug, info, warn};

use typr_core::keymap::macos_cg;
use typr_core::{
    set_last_error, BackendType, Capabilities, Key, KeyDelay, Modifier, ModifierTracker,
};

use crate::application::sender::{DriverError, KeyboardDriver};
use crate::infrastructure::config::SenderConfig;

// ── Accessibility FFI ─────────────────────────────────────────────────────────

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
    static kAXTrustedCheckOptionPrompt: *const c_void;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    fn CFDictionaryCreate(
        allocator: *const c_void,
        keys: *const *const c_void,
        values: *const *const c_void,
        num_values: isize,
        key_callbacks: *const c_void,
        value_callbacks: *const c_void,
    ) -> *const c_void;
    fn CFRelease(cf: *const c_void);
    static kCFTypeDictionaryKeyCallBacks: c_void;
    static kCFTypeDictionaryValueCallBacks: c_void;
    static kCFBooleanTrue: *const c_void;
}

/// Whether this process holds the Accessibility permission.  With
/// `prompt`, macOS shows its "grant access" dialog if it does not.
pub(crate) fn accessibility_trusted(prompt: bool) -> bool {
    if !prompt {
        // SAFETY: reads process permission state only.
        return unsafe { AXIsProcessTrusted() };
    }

    // SAFETY: the dictionary holds two immortal CF constants and is
    // released after use.
    unsafe {
        let keys = [kAXTrustedCheckOptionPrompt];
        let values = [kCFBooleanTrue];
        let options = CFDictionaryCreate(
            std::ptr::null(),
            keys.as_ptr(),
            values.as_ptr(),
            1,
            std::ptr::addr_of!(kCFTypeDictionaryKeyCallBacks),
            std::ptr::addr_of!(kCFTypeDictionaryValueCallBacks),
        );
        let trusted = AXIsProcessTrustedWithOptions(options);
        if !options.is_null() {
            CFRelease(options);
        }
        trusted
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// `CGEventPost`-backed [`KeyboardDriver`].
pub struct MacosDriver {
    source_available: bool,
    trusted: bool,
    delay: KeyDelay,
    held: ModifierTracker,
    diagnostic: Option<String>,
}

impl Default for MacosDriver {
    /// The released (not-ready) state.
    fn default() -> Self {
        Self {
            source_available: false,
            trusted: false,
            delay: KeyDelay::ZERO,
            held: ModifierTracker::new(),
            diagnostic: None,
        }
    }
}

impl MacosDriver {
    pub fn open(config: &SenderConfig) -> Self {
        let mut driver = Self {
            source_available: new_source().is_ok(),
            trusted: accessibility_trusted(false),
            delay: KeyDelay::from_micros(config.key_delay_us),
            ..Self::default()
        };
        driver.refresh_diagnostic();
        if driver.is_ready() {
            info!("using CGEventPost keyboard driver");
        }
        driver
    }

    fn refresh_diagnostic(&mut self) {
        self.diagnostic = if !self.source_available {
            Some("cannot create a HIDSystemState CGEventSource".to_string())
        } else if !self.trusted {
            Some(
                "Accessibility permission not granted (System Settings > Privacy & Security > Accessibility)"
                    .to_string(),
            )
        } else {
            None
        };
        if let Some(message) = &self.diagnostic {
            warn!(%message, "CGEventPost driver not ready");
            set_last_error(message.clone());
        }
    }

    fn post_unicode(&self, units: &[u16], down: bool) -> Result<(), DriverError> {
        let event = CGEvent::new_keyboard_event(new_source()?, 0, down)
            .map_err(|()| DriverError::Platform("CGEventCreateKeyboardEvent failed".into()))?;
        event.set_flags(CGEventFlags::CGEventFlagNull);
        event.set_string_from_utf16_unchecked(units);
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

fn new_source() -> Result<CGEventSource, DriverError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|()| DriverError::Platform("CGEventSourceCreate failed".into()))
}

/// Quartz flags for a modifier mask.
fn cg_flags(mods: Modifier) -> CGEventFlags {
    let mut flags = CGEventFlags::CGEventFlagNull;
    for (bit, flag) in [
        (Modifier::SHIFT, CGEventFlags::CGEventFlagShift),
        (Modifier::CTRL, CGEventFlags::CGEventFlagControl),
        (Modifier::ALT, CGEventFlags::CGEventFlagAlternate),
        (Modifier::SUPER, CGEventFlags::CGEventFlagCommand),
        (Modifier::CAPS_LOCK, CGEventFlags::CGEventFlagAlphaShift),
    ] {
        if mods.contains(bit) {
            flags |= flag;
        }
    }
    flags
}

impl KeyboardDriver for MacosDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::MacOS
    }

    fn capabilities(&self) -> Capabilities {
        let ready = self.is_ready();
        Capabilities {
            can_inject_keys: ready,
            can_inject_text: ready,
            needs_accessibility_perm: true,
            ..Capabilities::default()
        }
    }

    fn is_ready(&self) -> bool {
        self.source_available && self.trusted
    }

    fn request_permissions(&mut self) -> bool {
        self.trusted = accessibility_trusted(true);
        self.refresh_diagnostic();
        self.is_ready()
    }

    fn key_code_for(&self, key: Key) -> Option<u32> {
        macos_cg::key_to_cgkeycode(key).map(u32::from)
    }

    fn send_key(&mut self, key: Key, down: bool) -> Result<(), DriverError> {
        if !self.is_ready() {
            return Err(DriverError::NotReady);
        }
        let code = macos_cg::key_to_cgkeycode(key).ok_or(DriverError::UnmappedKey(key))?;

        let event = CGEvent::new_keyboard_event(new_source()?, code, down)
            .map_err(|()| DriverError::Platform("CGEventCreateKeyboardEvent failed".into()))?;
        let mods = self.held.on_key(key, down);
        event.set_flags(cg_flags(mods));
        event.post(CGEventTapLocation::HID);
        debug!(%key, code, down, %mods, "CGEventPost key");
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), DriverError> {
        for ch in text.chars() {
            self.type_character(ch)?;
            self.delay();
        }
        Ok(())
    }

    fn type_character(&mut self, ch: char) -> Result<(), DriverError> {
        if !self.is_ready() {
            return Err(DriverError::NotReady);
        }
        let mut buf = [0u16; 2];
        let units = ch.encode_utf16(&mut buf);
        self.post_unicode(units, true)?;
        self.post_unicode(units, false)
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        // CGEventPost delivers immediately
        Ok(())
    }

    fn key_delay(&self) -> KeyDelay {
        self.delay
    }

    fn set_key_delay(&mut self, delay: KeyDelay) {
        self.delay = delay;
    }

    fn diagnostic(&self) -> Option<String> {
        self.diagnostic.clone()
    }
}
