//! Windows capture backend using a `WH_KEYBOARD_LL` low-level hook.
//!
//! The hook is installed on a dedicated thread that runs a Win32 message
//! loop; Windows calls the hook procedure on that thread for every key
//! transition on the desktop.  The procedure translates the virtual-key
//! code and calls the user callback directly, then always passes the
//! event on with `CallNextHookEx` (the hook observes, it never swallows).
//!
//! Stopping posts `WM_QUIT` to the hook thread, which unblocks
//! `GetMessageW`, removes the hook and exits.  Events the hook receives
//! after the running flag is cleared are passed on but never delivered,
//! and the hook procedure quits the loop itself when the flag was cleared
//! from inside the callback.
//!
//! # Safety
//!
//! `unsafe` is used only for Win32 FFI calls, each with a `// SAFETY:`
//! note.  The hook procedure keeps to the OS time budget as long as the
//! user callback returns quickly.

#![cfg(target_os = "windows")]

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetKeyState, VK_CAPITAL, VK_NUMLOCK};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostQuitMessage,
    PostThreadMessageW, SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, KBDLLHOOKSTRUCT,
    KBDLLHOOKSTRUCT_FLAGS, LLKHF_EXTENDED, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WM_KEYDOWN,
    WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN, WM_SYSKEYUP, WM_USER,
};

use typr_core::keymap::windows_vk;
use typr_core::{BackendType, Key, KeyEvent, Modifier, ModifierTracker};

use crate::application::listener::{
    CaptureBackend, CaptureError, CaptureThread, ListenerCallback,
};
use crate::infrastructure::config::ListenerConfig;

/// Per-thread state reachable from the hook procedure, which receives no
/// user context pointer.
struct HookState {
    callback: ListenerCallback,
    tracker: ModifierTracker,
    running: Arc<AtomicBool>,
}

thread_local! {
    static HOOK_STATE: RefCell<Option<HookState>> = const { RefCell::new(None) };
}

/// `WH_KEYBOARD_LL`-backed [`CaptureBackend`].
#[derive(Default)]
pub struct WindowsCapture;

impl WindowsCapture {
    pub fn new(_config: &ListenerConfig) -> Self {
        Self
    }
}

impl CaptureBackend for WindowsCapture {
    fn backend_type(&self) -> BackendType {
        BackendType::Windows
    }

    fn spawn_capture(
        &self,
        callback: ListenerCallback,
        running: Arc<AtomicBool>,
    ) -> Result<CaptureThread, CaptureError> {
        let flag = Arc::clone(&running);
        CaptureThread::spawn("typr-win-hook", &running, move |startup| {
            HOOK_STATE.with(|state| {
                *state.borrow_mut() = Some(HookState {
                    callback,
                    tracker: ModifierTracker::with_locks(current_lock_state()),
                    running: Arc::clone(&flag),
                });
            });

            // SAFETY: this thread runs a message loop below for as long as
            // the hook is installed.
            let hook = match unsafe {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), None, 0)
            } {
                Ok(hook) => hook,
                Err(e) => {
                    HOOK_STATE.with(|state| state.borrow_mut().take());
                    startup.failed(CaptureError::HookInstallFailed(e.to_string()));
                    return;
                }
            };

            let mut msg = MSG::default();
            // SAFETY: forces creation of this thread's message queue so the
            // WM_QUIT posted by the waker cannot be lost.
            unsafe {
                let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);
            }
            // SAFETY: no preconditions.
            let thread_id = unsafe { GetCurrentThreadId() };
            info!(thread_id, "WH_KEYBOARD_LL hook installed");
            startup.ready(Some(Box::new(move || {
                // SAFETY: posting to a thread id; fails harmlessly if the
                // thread already exited.
                unsafe {
                    let _ = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
                }
            })));

            while flag.load(Ordering::SeqCst) {
                // SAFETY: standard GetMessage/DispatchMessage loop; 0 is
                // WM_QUIT and -1 is an error.
                unsafe {
                    if GetMessageW(&mut msg, None, 0, 0).0 <= 0 {
                        break;
                    }
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            // SAFETY: `hook` was returned by SetWindowsHookExW on this thread.
            unsafe {
                let _ = UnhookWindowsHookEx(hook);
            }
            HOOK_STATE.with(|state| state.borrow_mut().take());
            debug!("WH_KEYBOARD_LL hook removed");
        })
    }
}

/// CapsLock/NumLock toggle state right now.
fn current_lock_state() -> Modifier {
    // SAFETY: GetKeyState only reads the calling thread's key state.
    let toggled = |vk: i32| unsafe { GetKeyState(vk) } & 1 != 0;
    let mut locks = Modifier::NONE;
    if toggled(i32::from(VK_CAPITAL.0)) {
        locks |= Modifier::CAPS_LOCK;
    }
    if toggled(i32::from(VK_NUMLOCK.0)) {
        locks |= Modifier::NUM_LOCK;
    }
    locks
}

/// Converts one hook notification into a callback invocation.
///
/// Returns `false` once the session's running flag is cleared; no event is
/// delivered after that, even if more are already queued for the hook.
fn deliver(vk: u16, extended: bool, pressed: bool) -> bool {
    HOOK_STATE.with(|state| {
        // A callback that pumps messages could re-enter; drop those events
        let Ok(mut guard) = state.try_borrow_mut() else {
            return true;
        };
        let Some(hook) = guard.as_mut() else {
            return true;
        };
        if !hook.running.load(Ordering::SeqCst) {
            return false;
        }
        let key = windows_vk::vk_to_key(vk, extended);
        if key == Key::Unknown {
            warn!(vk, "unmapped virtual-key code");
        }
        let modifiers = hook.tracker.on_key(key, pressed);
        (hook.callback)(KeyEvent::new(key, modifiers, pressed));
        hook.running.load(Ordering::SeqCst)
    })
}

/// Low-level keyboard hook procedure.
///
/// # Safety
///
/// Called by Windows on the hook thread with `l_param` pointing to a
/// `KBDLLHOOKSTRUCT` whenever `n_code == HC_ACTION`.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code == HC_ACTION as i32 {
        // SAFETY: guaranteed by the hook contract for HC_ACTION.
        let kbs = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let pressed = match w_param.0 as u32 {
            WM_KEYDOWN | WM_SYSKEYDOWN => Some(true),
            WM_KEYUP | WM_SYSKEYUP => Some(false),
            _ => None,
        };
        if let Some(pressed) = pressed {
            let extended = (kbs.flags & LLKHF_EXTENDED) != KBDLLHOOKSTRUCT_FLAGS(0);
            if !deliver(kbs.vkCode as u16, extended, pressed) {
                // Stopped from the callback or by another thread; leave
                // GetMessageW without waiting for the next message
                PostQuitMessage(0);
            }
        }
    }

    // SAFETY: always forward; this hook never consumes input.
    CallNextHookEx(None, n_code, w_param, l_param)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(running: &Arc<AtomicBool>) -> Arc<std::sync::Mutex<Vec<KeyEvent>>> {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        HOOK_STATE.with(|state| {
            *state.borrow_mut() = Some(HookState {
                callback: Box::new(move |event| sink.lock().unwrap().push(event)),
                tracker: ModifierTracker::new(),
                running: Arc::clone(running),
            });
        });
        seen
    }

    #[test]
    fn test_deliver_without_state_is_a_no_op() {
        // No hook installed on the test thread
        assert!(deliver(0x41, false, true));
    }

    #[test]
    fn test_deliver_invokes_thread_local_callback() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let seen = install(&running);

        // Act – VK_LSHIFT down, then 'A'
        assert!(deliver(0xA0, false, true));
        assert!(deliver(0x41, false, true));
        HOOK_STATE.with(|state| state.borrow_mut().take());

        // Assert
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].modifiers, Modifier::SHIFT);
        assert_eq!(seen[1].codepoint, u32::from('A'));
    }

    #[test]
    fn test_deliver_after_stop_drops_queued_events() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let seen = install(&running);
        assert!(deliver(0x41, false, true));

        // Act – flag cleared while more events are queued for the hook
        running.store(false, Ordering::SeqCst);
        let keep_going = deliver(0x41, false, false);
        HOOK_STATE.with(|state| state.borrow_mut().take());

        // Assert
        assert!(!keep_going);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_deliver_reports_stop_requested_by_callback() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let stopper = Arc::clone(&running);
        HOOK_STATE.with(|state| {
            *state.borrow_mut() = Some(HookState {
                callback: Box::new(move |_| stopper.store(false, Ordering::SeqCst)),
                tracker: ModifierTracker::new(),
                running: Arc::clone(&running),
            });
        });

        // Act
        let first = deliver(0x41, false, true);
        let second = deliver(0x42, false, true);
        HOOK_STATE.with(|state| state.borrow_mut().take());

        // Assert
        assert!(!first);
        assert!(!second);
    }
}
