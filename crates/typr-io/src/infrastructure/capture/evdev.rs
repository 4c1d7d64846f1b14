//! Linux capture backend reading `/dev/input/event*` directly.
//!
//! # How it works
//!
//! At start the backend opens every event node under the configured
//! directory and keeps the ones that look like keyboards (they report both
//! `KEY_A` and `KEY_ENTER`).  The capture thread then `poll(2)`s all of
//! them with a bounded timeout, so a stop request is noticed within one
//! poll interval even when nobody is typing.  The running flag is also
//! checked before every event of a batch, so nothing is delivered once a
//! stop was requested, including from inside the callback.
//!
//! Keyboards plugged in after start are picked up by a rescan of the
//! directory every [`RESCAN_INTERVAL`]; unplugged ones are dropped when
//! their read fails.  The session keeps running with zero keyboards and
//! resumes when one appears again.
//!
//! The kernel reports no modifier state with key events, so a
//! [`ModifierTracker`] rebuilds it from the transitions; CapsLock and
//! NumLock are seeded from the keyboard LEDs at start.
//!
//! Autorepeat (`value == 2`) is delivered as another press.
//!
//! # Permissions
//!
//! Event nodes are normally readable only by root and the `input` group.
//! If every node fails to open with `EACCES` the start fails with
//! [`CaptureError::PermissionDenied`].
//!
//! Devices are read without `EVIOCGRAB`, so other applications keep
//! receiving the same events.

use std::fs;
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use evdev::{Device, EventType, InputEvent, LedType};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::{debug, error, info, trace, warn};

use typr_core::keymap::linux_evdev;
use typr_core::{BackendType, Key, KeyEvent, Modifier, ModifierTracker};

use crate::application::listener::{
    CaptureBackend, CaptureError, CaptureThread, ListenerCallback,
};
use crate::infrastructure::config::ListenerConfig;

/// First code of the `BTN_*` block; codes from here to `KEY_OK` are
/// buttons on mice, joysticks and touchpads.
const BTN_MISC: u16 = 0x100;
const KEY_OK: u16 = 0x160;

/// How often the device directory is re-read for new keyboards.
const RESCAN_INTERVAL: Duration = Duration::from_secs(2);

/// evdev-backed [`CaptureBackend`].
pub struct EvdevCapture {
    device_dir: PathBuf,
    poll_interval: Duration,
}

impl EvdevCapture {
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            device_dir: config.device_dir.clone(),
            poll_interval: config.poll_interval(),
        }
    }
}

impl CaptureBackend for EvdevCapture {
    fn backend_type(&self) -> BackendType {
        BackendType::LinuxUInput
    }

    fn spawn_capture(
        &self,
        mut callback: ListenerCallback,
        running: Arc<AtomicBool>,
    ) -> Result<CaptureThread, CaptureError> {
        let dir = self.device_dir.clone();
        let timeout = poll_timeout(self.poll_interval);
        let flag = Arc::clone(&running);

        CaptureThread::spawn("typr-evdev-capture", &running, move |startup| {
            let mut keyboards = match open_keyboards(&dir) {
                Ok(keyboards) => keyboards,
                Err(e) => {
                    startup.failed(e);
                    return;
                }
            };
            let mut tracker = ModifierTracker::with_locks(read_lock_state(&keyboards));
            info!(devices = keyboards.len(), dir = %dir.display(), "evdev capture started");
            startup.ready(None);

            run_poll_loop(&dir, &mut keyboards, &mut tracker, &mut callback, &flag, timeout);
            debug!("evdev capture loop exited");
        })
    }
}

/// One opened keyboard node.
struct Keyboard {
    path: PathBuf,
    device: Device,
}

fn poll_timeout(interval: Duration) -> PollTimeout {
    let millis = u16::try_from(interval.as_millis()).unwrap_or(u16::MAX);
    PollTimeout::from(millis)
}

/// `event*` nodes in `dir` whose path is not in `known`.
fn event_nodes(dir: &Path, known: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut nodes: Vec<PathBuf> = fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("event"))
        })
        .filter(|path| !known.contains(path))
        .collect();
    nodes.sort();
    Ok(nodes)
}

/// Opens `path` if it is a keyboard.  `Ok(None)` for any other input node.
fn open_keyboard(path: PathBuf) -> io::Result<Option<Keyboard>> {
    let device = Device::open(&path)?;
    if !is_keyboard(&device) {
        return Ok(None);
    }
    if let Err(e) = set_nonblocking(&device) {
        warn!(path = %path.display(), error = %e, "cannot set O_NONBLOCK; skipping");
        return Ok(None);
    }
    debug!(path = %path.display(), name = device.name().unwrap_or("?"), "listening to keyboard");
    Ok(Some(Keyboard { path, device }))
}

/// Opens every keyboard-like `event*` node in `dir`.
fn open_keyboards(dir: &Path) -> Result<Vec<Keyboard>, CaptureError> {
    let nodes = event_nodes(dir, &[])
        .map_err(|e| CaptureError::NoDevices(format!("{}: {e}", dir.display())))?;

    let mut keyboards = Vec::new();
    let mut denied = 0usize;
    for path in nodes {
        match open_keyboard(path.clone()) {
            Ok(Some(keyboard)) => keyboards.push(keyboard),
            Ok(None) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => denied += 1,
            Err(e) => trace!(path = %path.display(), error = %e, "skipping input node"),
        }
    }

    match (keyboards.is_empty(), denied) {
        (false, _) => Ok(keyboards),
        (true, 0) => Err(CaptureError::NoDevices(format!(
            "no keyboard event nodes in {}",
            dir.display()
        ))),
        (true, n) => Err(CaptureError::PermissionDenied(format!(
            "cannot open {n} input node(s) in {}; add the user to the `input` group",
            dir.display()
        ))),
    }
}

fn is_keyboard(device: &Device) -> bool {
    device.supported_keys().is_some_and(|keys| {
        keys.contains(evdev::Key::KEY_A) && keys.contains(evdev::Key::KEY_ENTER)
    })
}

fn set_nonblocking(device: &Device) -> nix::Result<()> {
    let fd = device.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// CapsLock/NumLock as shown by the first keyboard that reports LEDs.
fn read_lock_state(keyboards: &[Keyboard]) -> Modifier {
    keyboards
        .iter()
        .find_map(|kb| kb.device.get_led_state().ok())
        .map_or(Modifier::NONE, |leds| {
            let mut locks = Modifier::NONE;
            if leds.contains(LedType::LED_CAPSL) {
                locks |= Modifier::CAPS_LOCK;
            }
            if leds.contains(LedType::LED_NUML) {
                locks |= Modifier::NUM_LOCK;
            }
            locks
        })
}

/// Adds keyboards that appeared in `dir` since the last scan.
fn adopt_new_keyboards(dir: &Path, keyboards: &mut Vec<Keyboard>) {
    let known: Vec<PathBuf> = keyboards.iter().map(|kb| kb.path.clone()).collect();
    let nodes = match event_nodes(dir, &known) {
        Ok(nodes) => nodes,
        Err(e) => {
            trace!(dir = %dir.display(), error = %e, "rescan failed");
            return;
        }
    };
    for path in nodes {
        match open_keyboard(path.clone()) {
            Ok(Some(keyboard)) => {
                info!(path = %keyboard.path.display(), "keyboard added");
                keyboards.push(keyboard);
            }
            Ok(None) => {}
            Err(e) => trace!(path = %path.display(), error = %e, "skipping input node"),
        }
    }
}

/// Translates and delivers one batch of raw events.
///
/// The running flag is checked before each event; returns `false` as soon
/// as it is cleared, leaving the rest of the batch undelivered.
fn dispatch<I>(
    events: I,
    tracker: &mut ModifierTracker,
    callback: &mut ListenerCallback,
    running: &AtomicBool,
) -> bool
where
    I: IntoIterator<Item = InputEvent>,
{
    for event in events {
        if !running.load(Ordering::SeqCst) {
            return false;
        }
        if let Some(key_event) = translate(&event, tracker) {
            callback(key_event);
        }
    }
    running.load(Ordering::SeqCst)
}

fn run_poll_loop(
    dir: &Path,
    keyboards: &mut Vec<Keyboard>,
    tracker: &mut ModifierTracker,
    callback: &mut ListenerCallback,
    running: &AtomicBool,
    timeout: PollTimeout,
) {
    let mut last_scan = Instant::now();
    while running.load(Ordering::SeqCst) {
        if last_scan.elapsed() >= RESCAN_INTERVAL {
            adopt_new_keyboards(dir, keyboards);
            last_scan = Instant::now();
        }

        let readable = match wait_readable(keyboards, timeout) {
            Ok(readable) => readable,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!(error = %e, "poll on input devices failed");
                return;
            }
        };

        let mut lost = Vec::new();
        for index in readable {
            let keyboard = &mut keyboards[index];
            match keyboard.device.fetch_events() {
                Ok(events) => {
                    if !dispatch(events, tracker, callback, running) {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    warn!(path = %keyboard.path.display(), error = %e, "keyboard removed");
                    lost.push(index);
                }
            }
        }

        let removed = !lost.is_empty();
        for index in lost.into_iter().rev() {
            keyboards.remove(index);
        }
        if removed && keyboards.is_empty() {
            warn!("no keyboards left; waiting for one to be plugged in");
        }
    }
}

/// Indices of devices with pending input or an error condition.
fn wait_readable(keyboards: &[Keyboard], timeout: PollTimeout) -> Result<Vec<usize>, Errno> {
    let mut fds: Vec<PollFd<'_>> = keyboards
        .iter()
        // SAFETY: each fd is owned by a Device that outlives `fds`.
        .map(|kb| PollFd::new(unsafe { BorrowedFd::borrow_raw(kb.device.as_raw_fd()) }, PollFlags::POLLIN))
        .collect();

    // An empty set just sleeps out the timeout
    if poll(&mut fds, timeout)? == 0 {
        return Ok(Vec::new());
    }

    let wanted = PollFlags::POLLIN | PollFlags::POLLERR | PollFlags::POLLHUP;
    Ok(fds
        .iter()
        .enumerate()
        .filter(|(_, fd)| fd.revents().is_some_and(|r| r.intersects(wanted)))
        .map(|(index, _)| index)
        .collect())
}

/// Turns one raw input event into a listener event, updating `tracker`.
///
/// Returns `None` for non-key events and for mouse/joystick buttons.
fn translate(event: &InputEvent, tracker: &mut ModifierTracker) -> Option<KeyEvent> {
    if event.event_type() != EventType::KEY {
        return None;
    }
    let code = event.code();
    let pressed = match event.value() {
        0 => false,
        1 | 2 => true,
        _ => return None,
    };

    let key = linux_evdev::code_to_key(code);
    if key == Key::Unknown {
        if (BTN_MISC..KEY_OK).contains(&code) {
            return None;
        }
        warn!(code, "unmapped key code");
    }

    let modifiers = tracker.on_key(key, pressed);
    Some(KeyEvent::new(key, modifiers, pressed))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn key_event(code: u16, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, code, value)
    }

    // ── Translation ──────────────────────────────────────────────────────────

    #[test]
    fn test_translate_press_carries_codepoint_and_modifiers() {
        // Arrange – KEY_LEFTSHIFT (42) held, then KEY_A (30)
        let mut tracker = ModifierTracker::new();
        translate(&key_event(42, 1), &mut tracker).unwrap();

        // Act
        let event = translate(&key_event(30, 1), &mut tracker).unwrap();

        // Assert
        assert_eq!(event.key, Key::A);
        assert!(event.pressed);
        assert_eq!(event.modifiers, Modifier::SHIFT);
        assert_eq!(event.codepoint, u32::from('A'));
    }

    #[test]
    fn test_translate_repeat_is_a_press() {
        let mut tracker = ModifierTracker::new();
        let event = translate(&key_event(30, 2), &mut tracker).unwrap();
        assert!(event.pressed);
    }

    #[test]
    fn test_translate_ignores_sync_and_mouse_buttons() {
        let mut tracker = ModifierTracker::new();
        let syn = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert!(translate(&syn, &mut tracker).is_none());
        // BTN_LEFT
        assert!(translate(&key_event(0x110, 1), &mut tracker).is_none());
    }

    #[test]
    fn test_translate_unmapped_keyboard_code_is_unknown() {
        // KEY_ZENKAKUHANKAKU (85) has no logical key
        let mut tracker = ModifierTracker::new();
        let event = translate(&key_event(85, 1), &mut tracker).unwrap();
        assert_eq!(event.key, Key::Unknown);
        assert_eq!(event.codepoint, 0);
    }

    #[test]
    fn test_translate_caps_lock_toggles_on_press_only() {
        // Arrange – KEY_CAPSLOCK = 58
        let mut tracker = ModifierTracker::new();

        // Act
        translate(&key_event(58, 1), &mut tracker);
        let released = translate(&key_event(58, 0), &mut tracker).unwrap();
        let typed = translate(&key_event(30, 1), &mut tracker).unwrap();

        // Assert
        assert!(released.modifiers.contains(Modifier::CAPS_LOCK));
        assert_eq!(typed.codepoint, u32::from('A'));
    }

    // ── Device discovery ─────────────────────────────────────────────────────

    #[test]
    fn test_missing_device_dir_reports_no_devices() {
        let dir = std::env::temp_dir().join(format!("typr_missing_{}", Uuid::new_v4()));
        assert!(matches!(
            open_keyboards(&dir),
            Err(CaptureError::NoDevices(_))
        ));
    }

    #[test]
    fn test_dir_without_event_nodes_reports_no_devices() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("typr_input_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("mouse0"), b"").unwrap();

        // Act
        let result = open_keyboards(&dir);

        // Assert
        assert!(matches!(result, Err(CaptureError::NoDevices(_))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_spawn_capture_fails_cleanly_without_devices() {
        // Arrange
        let config = ListenerConfig {
            device_dir: std::env::temp_dir().join(format!("typr_none_{}", Uuid::new_v4())),
            ..ListenerConfig::default()
        };
        let capture = EvdevCapture::new(&config);
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let result = capture.spawn_capture(Box::new(|_| {}), Arc::clone(&running));

        // Assert
        assert!(result.is_err());
        assert!(!running.load(Ordering::SeqCst));
    }

    #[test]
    fn test_poll_timeout_saturates() {
        // Does not panic for huge intervals
        let _ = poll_timeout(Duration::from_secs(3600));
        let _ = poll_timeout(Duration::from_millis(100));
    }

    // ── Batch delivery ───────────────────────────────────────────────────────

    #[test]
    fn test_dispatch_delivers_whole_batch_in_order() {
        // Arrange – KEY_A, SYN_REPORT, KEY_B
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback: ListenerCallback = Box::new(move |e| sink.lock().unwrap().push(e.key));
        let running = AtomicBool::new(true);
        let batch = vec![
            key_event(30, 1),
            InputEvent::new(EventType::SYNCHRONIZATION, 0, 0),
            key_event(48, 1),
        ];

        // Act
        let keep_going = dispatch(batch, &mut ModifierTracker::new(), &mut callback, &running);

        // Assert
        assert!(keep_going);
        assert_eq!(*seen.lock().unwrap(), vec![Key::A, Key::B]);
    }

    #[test]
    fn test_dispatch_stops_mid_batch_when_callback_stops() {
        // Arrange – the callback clears the flag on the first event
        let running = Arc::new(AtomicBool::new(true));
        let stopper = Arc::clone(&running);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback: ListenerCallback = Box::new(move |e| {
            sink.lock().unwrap().push(e.key);
            stopper.store(false, Ordering::SeqCst);
        });
        let batch = vec![key_event(30, 1), key_event(30, 0), key_event(48, 1)];

        // Act
        let keep_going = dispatch(batch, &mut ModifierTracker::new(), &mut callback, &running);

        // Assert
        assert!(!keep_going);
        assert_eq!(*seen.lock().unwrap(), vec![Key::A]);
    }

    #[test]
    fn test_dispatch_after_stop_delivers_nothing() {
        let running = AtomicBool::new(false);
        let mut callback: ListenerCallback = Box::new(|_| panic!("delivered after stop"));

        let keep_going = dispatch(
            vec![key_event(30, 1)],
            &mut ModifierTracker::new(),
            &mut callback,
            &running,
        );

        assert!(!keep_going);
    }

    // ── Hotplug rescan ───────────────────────────────────────────────────────

    #[test]
    fn test_event_nodes_skips_known_and_non_event_entries() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("typr_scan_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["event0", "event3", "mouse0", "by-id"] {
            fs::write(dir.join(name), b"").unwrap();
        }

        // Act
        let nodes = event_nodes(&dir, &[dir.join("event0")]).unwrap();

        // Assert
        assert_eq!(nodes, vec![dir.join("event3")]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_adopt_new_keyboards_ignores_nodes_that_are_not_devices() {
        // Arrange – a node appears that cannot be opened as an input device
        let dir = std::env::temp_dir().join(format!("typr_hotplug_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("event7"), b"").unwrap();
        let mut keyboards = Vec::new();

        // Act
        adopt_new_keyboards(&dir, &mut keyboards);
        adopt_new_keyboards(&dir.join("gone"), &mut keyboards);

        // Assert
        assert!(keyboards.is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
