//! Windows keyboard driver using the `SendInput` API.
//!
//! Logical keys are translated to virtual-key codes; the hardware scan code
//! is filled in with `MapVirtualKeyW` so applications that read scan codes
//! (games, remote desktop clients) see a plausible value.  Keys on the
//! extended block (arrows, navigation cluster, right-hand modifiers,
//! numpad Enter) carry `KEYEVENTF_EXTENDEDKEY`.
//!
//! Text is injected with `KEYEVENTF_UNICODE`, one UTF-16 unit per event,
//! which bypasses the keyboard layout entirely.
//!
//! `SendInput` needs no handle, so the driver is ready as soon as it is
//! opened.  It can still be blocked by UIPI when the foreground window
//! belongs to a more privileged process; that shows up as a send error.

#![cfg(target_os = "windows")]

use tracing::{debug, error};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    MapVirtualKeyW, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MAPVK_VK_TO_VSC, VIRTUAL_KEY,
};

use typr_core::keymap::windows_vk;
use typr_core::{BackendType, Capabilities, Key, KeyDelay};

use crate::application::sender::{DriverError, KeyboardDriver};
use crate::infrastructure::config::SenderConfig;

/// `SendInput`-backed [`KeyboardDriver`].
///
/// `Default` is the released (not-ready) state.
pub struct WindowsDriver {
    ready: bool,
    delay: KeyDelay,
}

impl Default for WindowsDriver {
    fn default() -> Self {
        Self {
            ready: false,
            delay: KeyDelay::ZERO,
        }
    }
}

impl WindowsDriver {
    pub fn open(config: &SenderConfig) -> Self {
        debug!("using SendInput keyboard driver");
        Self {
            ready: true,
            delay: KeyDelay::from_micros(config.key_delay_us),
        }
    }
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Submits `inputs` as one batch so no other input is interleaved.
fn send_inputs(inputs: &[INPUT]) -> Result<(), DriverError> {
    // SAFETY: every INPUT is fully initialised and cbsize matches the struct.
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        let err = windows::core::Error::from_win32();
        error!(sent, expected = inputs.len(), error = %err, "SendInput rejected events");
        return Err(DriverError::Platform(format!("SendInput: {err}")));
    }
    Ok(())
}

impl KeyboardDriver for WindowsDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::Windows
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_inject_keys: self.ready,
            can_inject_text: self.ready,
            ..Capabilities::default()
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn key_code_for(&self, key: Key) -> Option<u32> {
        windows_vk::key_to_vk(key).map(u32::from)
    }

    fn send_key(&mut self, key: Key, down: bool) -> Result<(), DriverError> {
        if !self.ready {
            return Err(DriverError::NotReady);
        }
        let vk = windows_vk::key_to_vk(key).ok_or(DriverError::UnmappedKey(key))?;

        // SAFETY: pure table lookup in user32.
        let scan = unsafe { MapVirtualKeyW(u32::from(vk), MAPVK_VK_TO_VSC) } as u16;
        let mut flags = KEYBD_EVENT_FLAGS(0);
        if windows_vk::is_extended(key) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }
        if !down {
            flags |= KEYEVENTF_KEYUP;
        }

        send_inputs(&[keyboard_input(vk, scan, flags)])?;
        debug!(%key, vk, down, "SendInput key");
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<(), DriverError> {
        if !self.ready {
            return Err(DriverError::NotReady);
        }
        for ch in text.chars() {
            self.type_character(ch)?;
            self.delay();
        }
        Ok(())
    }

    fn type_character(&mut self, ch: char) -> Result<(), DriverError> {
        if !self.ready {
            return Err(DriverError::NotReady);
        }
        let mut units = [0u16; 2];
        let inputs: Vec<INPUT> = ch
            .encode_utf16(&mut units)
            .iter()
            .flat_map(|&unit| {
                [
                    keyboard_input(0, unit, KEYEVENTF_UNICODE),
                    keyboard_input(0, unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
                ]
            })
            .collect();
        send_inputs(&inputs)
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        // SendInput is synchronous with the input queue
        Ok(())
    }

    fn key_delay(&self) -> KeyDelay {
        self.delay
    }

    fn set_key_delay(&mut self, delay: KeyDelay) {
        self.delay = delay;
    }

    fn diagnostic(&self) -> Option<String> {
        None
    }
}
