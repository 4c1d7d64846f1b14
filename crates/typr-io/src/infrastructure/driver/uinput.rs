//! Linux keyboard driver backed by a uinput virtual keyboard.
//!
//! # How it works
//!
//! The driver asks the kernel (through `/dev/uinput`) to create a new input
//! device that advertises one `EV_KEY` code per mapped logical key.  The
//! kernel then treats everything written to it exactly like a USB
//! keyboard: X11, Wayland compositors and the console all see the events,
//! and auto-repeat is generated for held keys.
//!
//! Each transition is written as an `EV_KEY` event immediately followed by
//! `SYN_REPORT`, so readers never observe a half-delivered transition.
//!
//! # Permissions
//!
//! Creating the device needs write access to `/dev/uinput` (root, or a
//! udev rule granting the `input` group).  Without it the driver is
//! constructed not-ready, keeps the OS error as its diagnostic, and every
//! send fails without touching the OS.
//!
//! # Unicode
//!
//! A virtual keyboard only has key codes, and which character a key code
//! produces depends on the active layout.  Text injection is therefore
//! refused outright rather than approximated.

use std::collections::HashMap;
use std::io;
use std::thread;
use std::time::Duration;

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, BusType, EventType, InputEvent, InputId};
use tracing::{debug, error, info};

use typr_core::keymap::linux_evdev;
use typr_core::{set_last_error, BackendType, Capabilities, Key, KeyDelay};

use crate::application::sender::{DriverError, KeyboardDriver};
use crate::infrastructure::config::SenderConfig;

/// Version field reported in the virtual device's input id.
const DEVICE_VERSION: u16 = 1;

/// uinput-backed [`KeyboardDriver`].
pub struct UinputDriver {
    device: Option<VirtualDevice>,
    codes: HashMap<Key, u16>,
    delay: KeyDelay,
    diagnostic: Option<String>,
    capabilities: Capabilities,
}

impl Default for UinputDriver {
    /// The released state: no device, empty table, zero delay.
    fn default() -> Self {
        Self {
            device: None,
            codes: HashMap::new(),
            delay: KeyDelay::ZERO,
            diagnostic: None,
            capabilities: Capabilities::default(),
        }
    }
}

impl UinputDriver {
    /// Creates the virtual keyboard described by `config`.
    ///
    /// Never fails.  If the device cannot be created the driver is
    /// returned not-ready; see [`KeyboardDriver::diagnostic`].
    pub fn open(config: &SenderConfig) -> Self {
        let codes = build_code_table();
        let device = create_device(config, &codes);
        let driver = Self::from_device(device, codes, KeyDelay::from_micros(config.key_delay_us));
        if driver.device.is_some() && config.settle_ms > 0 {
            // udev needs a moment to publish the node before readers pick it up
            thread::sleep(Duration::from_millis(config.settle_ms));
        }
        driver
    }

    fn from_device(
        device: io::Result<VirtualDevice>,
        codes: HashMap<Key, u16>,
        delay: KeyDelay,
    ) -> Self {
        let (device, diagnostic) = match device {
            Ok(device) => {
                info!(keys = codes.len(), "created uinput virtual keyboard");
                (Some(device), None)
            }
            Err(e) => {
                let message = format!("cannot create uinput device via /dev/uinput: {e}");
                error!(error = %e, "uinput virtual keyboard unavailable");
                set_last_error(message.clone());
                (None, Some(message))
            }
        };

        let capabilities = Capabilities {
            can_inject_keys: device.is_some(),
            can_inject_text: false,
            can_simulate_hid: true,
            supports_key_repeat: true,
            needs_uinput_access: true,
            needs_accessibility_perm: false,
            needs_input_monitoring_perm: false,
        };

        Self {
            device,
            codes,
            delay,
            diagnostic,
            capabilities,
        }
    }
}

impl Drop for UinputDriver {
    fn drop(&mut self) {
        // Closing the fd destroys the kernel device
        if self.device.take().is_some() {
            info!("destroyed uinput virtual keyboard");
        }
    }
}

/// Every logical key with a Linux input code.
fn build_code_table() -> HashMap<Key, u16> {
    Key::ALL
        .iter()
        .filter_map(|&key| linux_evdev::key_to_code(key).map(|code| (key, code)))
        .collect()
}

fn create_device(config: &SenderConfig, codes: &HashMap<Key, u16>) -> io::Result<VirtualDevice> {
    let mut keys = AttributeSet::<evdev::Key>::new();
    for &code in codes.values() {
        keys.insert(evdev::Key::new(code));
    }

    VirtualDeviceBuilder::new()?
        .name(&config.device_name)
        .input_id(InputId::new(
            BusType::BUS_USB,
            config.vendor_id,
            config.product_id,
            DEVICE_VERSION,
        ))
        .with_keys(&keys)?
        .build()
}

impl KeyboardDriver for UinputDriver {
    fn backend_type(&self) -> BackendType {
        BackendType::LinuxUInput
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn is_ready(&self) -> bool {
        self.device.is_some()
    }

    fn key_code_for(&self, key: Key) -> Option<u32> {
        self.codes.get(&key).map(|&code| u32::from(code))
    }

    fn send_key(&mut self, key: Key, down: bool) -> Result<(), DriverError> {
        let device = self.device.as_mut().ok_or(DriverError::NotReady)?;
        let code = *self.codes.get(&key).ok_or(DriverError::UnmappedKey(key))?;

        // emit() appends SYN_REPORT after the batch
        let event = InputEvent::new(EventType::KEY, code, i32::from(down));
        device.emit(&[event])?;
        debug!(%key, code, down, "uinput key");
        Ok(())
    }

    fn type_text(&mut self, _text: &str) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("unicode text injection on uinput"))
    }

    fn type_character(&mut self, _ch: char) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("unicode text injection on uinput"))
    }

    fn flush(&mut self) -> Result<(), DriverError> {
        match self.device.as_mut() {
            // An empty batch is just SYN_REPORT
            Some(device) => Ok(device.emit(&[])?),
            None => Ok(()),
        }
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

// ── Tests ─────────────────────────────────────────────────────────────────────
