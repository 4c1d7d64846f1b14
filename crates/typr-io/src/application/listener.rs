//! Listener: global keyboard monitoring on a background capture thread.
//!
//! A [`CaptureBackend`] installs the OS mechanism (evdev readers, an event
//! tap, a low-level hook) on a dedicated thread and invokes the user
//! callback there, once per key transition, in OS delivery order.
//!
//! [`CaptureThread`] is the session handle every backend returns.  It
//! carries the startup handshake (the spawning call only returns once the
//! hook is confirmed installed or has failed and been torn down) and acts
//! as the join barrier for [`Listener::stop`]: once `stop` returns, the
//! capture thread has exited and the callback will never run again.
//!
//! # Callback rules
//!
//! The callback runs on the capture thread.  It must return quickly, and
//! it must not call [`Listener::start`] on the Listener that owns it.
//! Calling [`Listener::stop`] from inside the callback does not join
//! (a thread cannot join itself); it only asks the capture thread to exit
//! once the callback returns.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use typr_core::{set_last_error, BackendType, KeyEvent};

use crate::infrastructure::capture::PlatformCapture;
use crate::infrastructure::config::ListenerConfig;

/// User callback invoked once per key transition on the capture thread.
pub type ListenerCallback = Box<dyn FnMut(KeyEvent) + Send + 'static>;

/// Wakes a capture thread that is blocked in the OS (e.g. posts a quit
/// message to its message loop).
pub type Waker = Box<dyn Fn() + Send + Sync + 'static>;

/// Error type for capture session setup.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("a callback is required to start listening")]
    MissingCallback,
    #[error("failed to install keyboard hook: {0}")]
    HookInstallFailed(String),
    #[error("no keyboard devices found: {0}")]
    NoDevices(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// An OS mechanism that can deliver global key events.
pub trait CaptureBackend: Send + Sync {
    fn backend_type(&self) -> BackendType;

    /// Starts a capture session that calls `callback` for every key
    /// transition while `running` is `true`.
    ///
    /// Returns only after the OS hook is confirmed active.  On failure no
    /// thread or hook is left behind.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the hook or device cannot be acquired.
    fn spawn_capture(
        &self,
        callback: ListenerCallback,
        running: Arc<AtomicBool>,
    ) -> Result<CaptureThread, CaptureError>;
}

// ── Capture thread ────────────────────────────────────────────────────────────

thread_local! {
    /// Address of the running flag owned by the session on this thread.
    static SESSION_FLAG: Cell<usize> = const { Cell::new(0) };
}

fn flag_id(running: &Arc<AtomicBool>) -> usize {
    Arc::as_ptr(running) as usize
}

/// `true` when called on the capture thread of the session that owns
/// `running`.
fn on_capture_thread_of(running: &Arc<AtomicBool>) -> bool {
    SESSION_FLAG.with(|id| id.get() == flag_id(running))
}

/// One-shot startup report from a capture thread to its spawner.
pub struct StartupSignal {
    tx: SyncSender<Result<Option<Waker>, CaptureError>>,
}

impl StartupSignal {
    /// The hook is installed.  `waker`, if given, is called by
    /// [`CaptureThread::stop`] to unblock the thread.
    pub fn ready(self, waker: Option<Waker>) {
        let _ = self.tx.send(Ok(waker));
    }

    /// Setup failed.  The thread must release whatever it acquired and
    /// return.
    pub fn failed(self, error: CaptureError) {
        let _ = self.tx.send(Err(error));
    }
}

/// Handle to a running capture session's thread.
pub struct CaptureThread {
    handle: Option<JoinHandle<()>>,
    waker: Option<Waker>,
    running: Arc<AtomicBool>,
}

impl CaptureThread {
    /// Spawns `body` on a named thread and waits for it to report through
    /// the [`StartupSignal`].
    ///
    /// `body` owns the whole session: install the hook, signal, loop while
    /// `running` is set, tear down.  `running` is cleared when `body`
    /// returns, whatever the reason.
    ///
    /// # Errors
    ///
    /// [`CaptureError::ThreadSpawn`] if the OS refuses the thread, or the
    /// error `body` reported.  Either way the thread has been joined.
    pub fn spawn<F>(name: &str, running: &Arc<AtomicBool>, body: F) -> Result<Self, CaptureError>
    where
        F: FnOnce(StartupSignal) + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let session_flag = Arc::clone(running);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                SESSION_FLAG.with(|id| id.set(flag_id(&session_flag)));
                body(StartupSignal { tx });
                session_flag.store(false, Ordering::SeqCst);
                SESSION_FLAG.with(|id| id.set(0));
            })
            .map_err(|e| CaptureError::ThreadSpawn(e.to_string()))?;

        let startup = rx.recv().unwrap_or_else(|_| {
            Err(CaptureError::HookInstallFailed(
                "capture thread exited during startup".to_string(),
            ))
        });

        match startup {
            Ok(waker) => {
                debug!(thread = name, "capture thread running");
                Ok(Self {
                    handle: Some(handle),
                    waker,
                    running: Arc::clone(running),
                })
            }
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                if handle.join().is_err() {
                    error!(thread = name, "capture thread panicked during startup");
                }
                Err(e)
            }
        }
    }

    /// `true` once the thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Clears the running flag, wakes the thread, and joins it.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(wake) = self.waker.take() {
            wake();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("capture thread panicked");
            }
        }
    }
}

// ── Listener facade ───────────────────────────────────────────────────────────

/// Global keyboard listener.
///
/// ```no_run
/// use typr_io::Listener;
///
/// let listener = Listener::new();
/// let started = listener.start(Some(Box::new(|event| {
///     println!("{} pressed={}", event.key, event.pressed);
/// })));
/// assert!(started || !listener.is_listening());
/// listener.stop();
/// ```
pub struct Listener<B: CaptureBackend = PlatformCapture> {
    backend: B,
    session: Mutex<Option<CaptureThread>>,
    listening: Arc<AtomicBool>,
}

impl Listener<PlatformCapture> {
    /// Listener using this platform's capture backend with default
    /// settings.  No OS resource is touched until [`Listener::start`].
    pub fn new() -> Self {
        Self::with_config(&ListenerConfig::default())
    }

    pub fn with_config(config: &ListenerConfig) -> Self {
        Self::with_backend(PlatformCapture::new(config))
    }
}

impl Default for Listener<PlatformCapture> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: CaptureBackend> Listener<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            session: Mutex::new(None),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Starts listening.  Returns `true` only if the OS hook is confirmed
    /// active.
    ///
    /// Starting while already listening keeps the current session and
    /// returns `true`; the new callback is dropped.
    pub fn start(&self, callback: Option<ListenerCallback>) -> bool {
        match self.try_start(callback) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, backend = %self.backend.backend_type(), "listener start failed");
                false
            }
        }
    }

    /// Convenience wrapper around [`Listener::start`] for closures.
    pub fn listen<F>(&self, callback: F) -> bool
    where
        F: FnMut(KeyEvent) + Send + 'static,
    {
        self.start(Some(Box::new(callback)))
    }

    /// Like [`Listener::start`], but returns the reason for a failure.
    ///
    /// # Errors
    ///
    /// [`CaptureError::MissingCallback`] if `callback` is `None`, otherwise
    /// whatever the backend reported.
    pub fn try_start(&self, callback: Option<ListenerCallback>) -> Result<(), CaptureError> {
        let Some(callback) = callback else {
            set_last_error("Listener::start: callback must not be null");
            return Err(CaptureError::MissingCallback);
        };

        let mut session = self.lock_session();
        if let Some(active) = session.as_ref() {
            if self.listening.load(Ordering::SeqCst) && !active.is_finished() {
                warn!("start called while already listening; keeping the current session");
                return Ok(());
            }
        }
        if let Some(stale) = session.take() {
            debug!("reaping finished capture session");
            stale.stop();
        }

        self.listening.store(true, Ordering::SeqCst);
        match self
            .backend
            .spawn_capture(callback, Arc::clone(&self.listening))
        {
            Ok(thread) => {
                *session = Some(thread);
                info!(backend = %self.backend.backend_type(), "listener started");
                Ok(())
            }
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                set_last_error(format!("Listener::start: {e}"));
                Err(e)
            }
        }
    }

    /// Stops listening and waits for the capture thread to exit.
    ///
    /// Idempotent.  After it returns the callback is never invoked again,
    /// except when called from the callback itself (see module docs).
    pub fn stop(&self) {
        if on_capture_thread_of(&self.listening) {
            error!("stop called from the listener callback; the session ends after the callback returns");
            set_last_error("Listener::stop: called from the capture thread; not joined");
            self.listening.store(false, Ordering::SeqCst);
            return;
        }

        let mut session = self.lock_session();
        if let Some(thread) = session.take() {
            thread.stop();
            info!(backend = %self.backend.backend_type(), "listener stopped");
        }
        self.listening.store(false, Ordering::SeqCst);
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<CaptureThread>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: CaptureBackend> Drop for Listener<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Backend whose thread loops until stopped, counting callback calls.
    struct SpinBackend {
        fail: bool,
        spawned: AtomicUsize,
    }

    impl SpinBackend {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                spawned: AtomicUsize::new(0),
            }
        }
    }

    impl CaptureBackend for SpinBackend {
        fn backend_type(&self) -> BackendType {
            BackendType::Mock
        }

        fn spawn_capture(
            &self,
            mut callback: ListenerCallback,
            running: Arc<AtomicBool>,
        ) -> Result<CaptureThread, CaptureError> {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            let flag = Arc::clone(&running);
            CaptureThread::spawn("test-capture", &running, move |startup| {
                if fail {
                    startup.failed(CaptureError::HookInstallFailed("scripted".into()));
                    return;
                }
                startup.ready(None);
                while flag.load(Ordering::SeqCst) {
                    callback(KeyEvent::new(typr_core::Key::A, typr_core::Modifier::NONE, true));
                    thread::sleep(Duration::from_millis(1));
                }
            })
        }
    }

    // ── start / stop ─────────────────────────────────────────────────────────

    #[test]
    fn test_start_without_callback_creates_no_session() {
        // Arrange
        let listener = Listener::with_backend(SpinBackend::new(false));

        // Act
        let started = listener.start(None);

        // Assert
        assert!(!started);
        assert!(!listener.is_listening());
        assert_eq!(listener.backend().spawned.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_backend_leaves_listener_idle() {
        // Arrange
        let listener = Listener::with_backend(SpinBackend::new(true));

        // Act
        let result = listener.try_start(Some(Box::new(|_| {})));

        // Assert
        assert!(matches!(result, Err(CaptureError::HookInstallFailed(_))));
        assert!(!listener.is_listening());
    }

    #[test]
    fn test_no_callback_runs_after_stop_returns() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let listener = Listener::with_backend(SpinBackend::new(false));
        assert!(listener.listen(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        // Act
        thread::sleep(Duration::from_millis(10));
        listener.stop();
        let after_stop = calls.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));

        // Assert
        assert!(!listener.is_listening());
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_start_while_listening_keeps_session() {
        // Arrange
        let listener = Listener::with_backend(SpinBackend::new(false));
        assert!(listener.listen(|_| {}));

        // Act
        let again = listener.listen(|_| {});

        // Assert
        assert!(again);
        assert_eq!(listener.backend().spawned.load(Ordering::SeqCst), 1);
        listener.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        // Arrange
        let listener = Listener::with_backend(SpinBackend::new(false));

        // Act – stop before start, then start/stop/stop
        listener.stop();
        assert!(listener.listen(|_| {}));
        listener.stop();
        listener.stop();

        // Assert
        assert!(!listener.is_listening());
    }

    #[test]
    fn test_restart_after_stop_spawns_new_session() {
        // Arrange
        let listener = Listener::with_backend(SpinBackend::new(false));
        assert!(listener.listen(|_| {}));
        listener.stop();

        // Act
        let restarted = listener.listen(|_| {});

        // Assert
        assert!(restarted);
        assert!(listener.is_listening());
        assert_eq!(listener.backend().spawned.load(Ordering::SeqCst), 2);
    }

    // ── Capture thread ───────────────────────────────────────────────────────

    #[test]
    fn test_capture_thread_clears_flag_when_body_returns() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let thread = CaptureThread::spawn("short-lived", &running, |startup| {
            startup.ready(None);
        })
        .unwrap();
        while !thread.is_finished() {
            thread::yield_now();
        }

        // Assert
        assert!(!running.load(Ordering::SeqCst));
        thread.stop();
    }

    #[test]
    fn test_capture_thread_reports_silent_exit_as_failure() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));

        // Act – body drops the signal without reporting
        let result = CaptureThread::spawn("silent", &running, |_startup| {});

        // Assert
        assert!(matches!(result, Err(CaptureError::HookInstallFailed(_))));
    }

    #[test]
    fn test_stop_invokes_waker() {
        // Arrange
        let woken = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&woken);
        let running = Arc::new(AtomicBool::new(true));
        let loop_flag = Arc::clone(&running);
        let thread = CaptureThread::spawn("wakeable", &running, move |startup| {
            startup.ready(Some(Box::new(move || flag.store(true, Ordering::SeqCst))));
            while loop_flag.load(Ordering::SeqCst) {
                thread::yield_now();
            }
        })
        .unwrap();

        // Act
        thread.stop();

        // Assert
        assert!(woken.load(Ordering::SeqCst));
    }
}
