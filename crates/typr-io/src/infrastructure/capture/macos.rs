//! macOS capture backend using a listen-only `CGEventTap`.
//!
//! The tap is created on the capture thread and attached to that thread's
//! `CFRunLoop`.  The tap callback only forwards the raw keycode and flags
//! over a channel; the thread runs the loop in short slices, drains the
//! channel, and invokes the user callback between slices.  That keeps the
//! tap callback well inside the time macOS allows before it disables a
//! slow tap, and bounds `stop()` latency by the configured poll interval.
//!
//! Creating the tap requires the Input Monitoring permission; without it
//! `CGEventTap::new` fails and the session reports
//! [`CaptureError::PermissionDenied`].

#![cfg(target_os = "macos")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventTapProxy, CGEventType, EventField,
};
use tracing::{debug, error, info, warn};

use typr_core::keymap::macos_cg;
use typr_core::{BackendType, Key, KeyEvent, Modifier};

use crate::application::listener::{
    CaptureBackend, CaptureError, CaptureThread, ListenerCallback,
};
use crate::infrastructure::config::ListenerConfig;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGPreflightListenEventAccess() -> bool;
}

/// What the tap callback hands to the capture loop.
#[derive(Debug, Clone, Copy)]
enum TapMessage {
    Key { code: u16, flags: CGEventFlags, down: bool },
    Flags { code: u16, flags: CGEventFlags },
    Disabled,
}

/// `CGEventTap`-backed [`CaptureBackend`].
pub struct MacosCapture {
    poll_interval: Duration,
}

impl Default for MacosCapture {
    fn default() -> Self {
        Self::new(&ListenerConfig::default())
    }
}

impl MacosCapture {
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
        }
    }
}

impl CaptureBackend for MacosCapture {
    fn backend_type(&self) -> BackendType {
        BackendType::MacOS
    }

    fn spawn_capture(
        &self,
        mut callback: ListenerCallback,
        running: Arc<AtomicBool>,
    ) -> Result<CaptureThread, CaptureError> {
        let interval = self.poll_interval;
        let flag = Arc::clone(&running);
        CaptureThread::spawn("typr-event-tap", &running, move |startup| {
            // SAFETY: permission query only.
            if !unsafe { CGPreflightListenEventAccess() } {
                debug!("Input Monitoring preflight failed; trying the tap anyway");
            }

            let (tx, rx) = mpsc::channel::<TapMessage>();
            let tap = match CGEventTap::new(
                CGEventTapLocation::Session,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::ListenOnly,
                vec![
                    CGEventType::KeyDown,
                    CGEventType::KeyUp,
                    CGEventType::FlagsChanged,
                ],
                move |_proxy: CGEventTapProxy, event_type: CGEventType, event: &CGEvent| {
                    let code =
                        event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
                    let flags = event.get_flags();
                    let message = match event_type {
                        CGEventType::KeyDown => Some(TapMessage::Key { code, flags, down: true }),
                        CGEventType::KeyUp => Some(TapMessage::Key { code, flags, down: false }),
                        CGEventType::FlagsChanged => Some(TapMessage::Flags { code, flags }),
                        CGEventType::TapDisabledByTimeout
                        | CGEventType::TapDisabledByUserInput => Some(TapMessage::Disabled),
                        _ => None,
                    };
                    if let Some(message) = message {
                        let _ = tx.send(message);
                    }
                    None
                },
            ) {
                Ok(tap) => tap,
                Err(()) => {
                    error!("CGEventTapCreate failed; is Input Monitoring granted?");
                    startup.failed(CaptureError::PermissionDenied(
                        "CGEventTapCreate failed (System Settings > Privacy & Security > Input Monitoring)"
                            .into(),
                    ));
                    return;
                }
            };

            let source = match tap.mach_port.create_runloop_source(0) {
                Ok(source) => source,
                Err(()) => {
                    startup.failed(CaptureError::HookInstallFailed(
                        "cannot create run loop source for event tap".into(),
                    ));
                    return;
                }
            };
            // SAFETY: kCFRunLoopCommonModes is an immutable CF constant.
            unsafe {
                CFRunLoop::get_current().add_source(&source, kCFRunLoopCommonModes);
            }
            tap.enable();
            info!("CGEventTap installed");
            startup.ready(None);

            while flag.load(Ordering::SeqCst) {
                // SAFETY: kCFRunLoopDefaultMode is an immutable CF constant.
                unsafe {
                    CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, interval, true);
                }
                if !drain(&rx, &mut callback, &flag, || tap.enable()) {
                    break;
                }
            }
            debug!("CGEventTap removed");
        })
    }
}

/// Delivers every queued tap message, calling `reenable` when the system
/// disabled the tap.
///
/// The running flag is checked before each message; returns `false` as
/// soon as it is cleared, leaving the rest undelivered.
fn drain(
    rx: &mpsc::Receiver<TapMessage>,
    callback: &mut ListenerCallback,
    running: &AtomicBool,
    mut reenable: impl FnMut(),
) -> bool {
    while running.load(Ordering::SeqCst) {
        let Ok(message) = rx.try_recv() else {
            return true;
        };
        match message {
            TapMessage::Disabled => {
                warn!("event tap disabled by the system, re-enabling");
                reenable();
            }
            other => {
                if let Some(event) = translate(other) {
                    callback(event);
                }
            }
        }
    }
    false
}

/// Modifier mask carried by an event's flags.
fn modifiers_from_flags(flags: CGEventFlags) -> Modifier {
    let mut mods = Modifier::NONE;
    for (flag, bit) in [
        (CGEventFlags::CGEventFlagShift, Modifier::SHIFT),
        (CGEventFlags::CGEventFlagControl, Modifier::CTRL),
        (CGEventFlags::CGEventFlagAlternate, Modifier::ALT),
        (CGEventFlags::CGEventFlagCommand, Modifier::SUPER),
        (CGEventFlags::CGEventFlagAlphaShift, Modifier::CAPS_LOCK),
    ] {
        if flags.contains(flag) {
            mods |= bit;
        }
    }
    mods
}

/// Normalizes one tap message.  `FlagsChanged` carries no direction; the
/// key is pressed when its own bit is present in the new flags.
fn translate(message: TapMessage) -> Option<KeyEvent> {
    match message {
        TapMessage::Key { code, flags, down } => {
            let key = macos_cg::cgkeycode_to_key(code);
            if key == Key::Unknown {
                warn!(code, "unmapped CGKeyCode");
            }
            Some(KeyEvent::new(key, modifiers_from_flags(flags), down))
        }
        TapMessage::Flags { code, flags } => {
            let key = macos_cg::cgkeycode_to_key(code);
            let mods = modifiers_from_flags(flags);
            let bit = key.modifier_bit() | key.lock_bit();
            let pressed = !bit.is_empty() && mods.contains(bit);
            Some(KeyEvent::new(key, mods, pressed))
        }
        TapMessage::Disabled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_from_flags() {
        let flags = CGEventFlags::CGEventFlagShift | CGEventFlags::CGEventFlagCommand;
        assert_eq!(modifiers_from_flags(flags), Modifier::SHIFT | Modifier::SUPER);
    }

    #[test]
    fn test_translate_key_down_carries_character() {
        // Arrange – kVK_ANSI_A with Shift
        let message = TapMessage::Key {
            code: 0x00,
            flags: CGEventFlags::CGEventFlagShift,
            down: true,
        };

        // Act
        let event = translate(message).unwrap();

        // Assert
        assert_eq!(event.key, Key::A);
        assert!(event.pressed);
        assert_eq!(event.codepoint, u32::from('A'));
    }

    #[test]
    fn test_translate_flags_changed_infers_direction() {
        // kVK_Shift = 0x38
        let down = translate(TapMessage::Flags {
            code: 0x38,
            flags: CGEventFlags::CGEventFlagShift,
        })
        .unwrap();
        let up = translate(TapMessage::Flags {
            code: 0x38,
            flags: CGEventFlags::CGEventFlagNull,
        })
        .unwrap();

        assert!(down.pressed);
        assert!(!up.pressed);
        assert_eq!(up.modifiers, Modifier::NONE);
    }

    #[test]
    fn test_translate_disabled_yields_nothing() {
        assert!(translate(TapMessage::Disabled).is_none());
    }

    fn key_message(code: u16) -> TapMessage {
        TapMessage::Key {
            code,
            flags: CGEventFlags::CGEventFlagNull,
            down: true,
        }
    }

    #[test]
    fn test_drain_reenables_tap_and_delivers_the_rest() {
        // Arrange
        let (tx, rx) = mpsc::channel();
        for message in [key_message(0x00), TapMessage::Disabled, key_message(0x0B)] {
            tx.send(message).unwrap();
        }
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback: ListenerCallback = Box::new(move |e| sink.lock().unwrap().push(e.key));
        let running = AtomicBool::new(true);
        let mut reenabled = 0;

        // Act
        let keep_going = drain(&rx, &mut callback, &running, || reenabled += 1);

        // Assert
        assert!(keep_going);
        assert_eq!(reenabled, 1);
        assert_eq!(*seen.lock().unwrap(), vec![Key::A, Key::B]);
    }

    #[test]
    fn test_drain_stops_when_callback_clears_flag() {
        // Arrange
        let (tx, rx) = mpsc::channel();
        tx.send(key_message(0x00)).unwrap();
        tx.send(key_message(0x0B)).unwrap();
        let running = Arc::new(AtomicBool::new(true));
        let stopper = Arc::clone(&running);
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut callback: ListenerCallback = Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            stopper.store(false, Ordering::SeqCst);
        });

        // Act
        let keep_going = drain(&rx, &mut callback, &running, || {});

        // Assert
        assert!(!keep_going);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
