//! Scriptable capture backend for tests.
//!
//! `MockCapture` runs a real [`CaptureThread`], but instead of an OS hook
//! it waits on a channel.  Tests push events with [`MockCapture::inject`]
//! and they are delivered to the Listener callback on the capture thread,
//! in order, exactly as an OS backend would deliver them.
//!
//! ```
//! use typr_io::infrastructure::capture::mock::MockCapture;
//! use typr_io::{Key, KeyEvent, Listener, Modifier};
//!
//! let listener = Listener::with_backend(MockCapture::new());
//! assert!(listener.listen(|event| println!("{event:?}")));
//! listener.backend().inject(KeyEvent::new(Key::A, Modifier::NONE, true));
//! listener.stop();
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use typr_core::{BackendType, KeyEvent};

use crate::application::listener::{
    CaptureBackend, CaptureError, CaptureThread, ListenerCallback,
};

/// How long the mock capture loop blocks before re-checking its flag.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Capture backend fed by the test instead of the OS.
#[derive(Default)]
pub struct MockCapture {
    injector: Mutex<Option<mpsc::Sender<KeyEvent>>>,
    sessions: AtomicUsize,
    /// When `true`, the next starts fail as if the hook could not be
    /// installed.
    pub should_fail: AtomicBool,
}

impl MockCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event` for delivery.  Returns `false` if no session has
    /// been started or the session has ended.
    pub fn inject(&self, event: KeyEvent) -> bool {
        self.injector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    /// Number of capture threads successfully started.
    pub fn sessions_started(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

impl CaptureBackend for MockCapture {
    fn backend_type(&self) -> BackendType {
        BackendType::Mock
    }

    fn spawn_capture(
        &self,
        mut callback: ListenerCallback,
        running: Arc<AtomicBool>,
    ) -> Result<CaptureThread, CaptureError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(CaptureError::HookInstallFailed("mock failure".into()));
        }

        let (tx, rx) = mpsc::channel::<KeyEvent>();
        let flag = Arc::clone(&running);
        let thread = CaptureThread::spawn("typr-mock-capture", &running, move |startup| {
            startup.ready(None);
            while flag.load(Ordering::SeqCst) {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(event) => callback(event),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })?;

        *self.injector.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(thread)
    }
}
