//! Cancellation token observed between every blocking step of playback.
//!
//! Signal delivery only sets the token; shutdown itself always runs on the
//! playback thread, except when that thread stays blocked past a grace
//! period (see [`Termination::install_signal_handlers`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How long the signal watcher waits for the playback thread to shut down
/// on its own before restoring the terminal itself.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Result of an interruptible sleep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sleep {
    /// The deadline passed
    Elapsed,
    /// Termination was requested before the deadline
    Interrupted,
}

#[derive(Debug, Default)]
struct State {
    requested: bool,
    finished: bool,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    state: Mutex<State>,
    changed: Condvar,
}

/// Shared, cloneable termination request.
///
/// ## Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use tmv::{Sleep, Termination};
///
/// let token = Termination::new();
/// assert!(!token.is_requested());
///
/// token.request();
/// assert!(token.is_requested());
///
/// // Sleeps return immediately once termination is requested.
/// let deadline = Instant::now() + Duration::from_secs(60);
/// assert_eq!(token.sleep_until(deadline), Sleep::Interrupted);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Termination {
    inner: Arc<Inner>,
}

impl Termination {
    /// Create a token with no request pending.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask playback to stop. Wakes any pending [`sleep_until`](Self::sleep_until).
    pub fn request(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        let mut state = self.lock();
        state.requested = true;
        self.inner.changed.notify_all();
    }

    /// Check if termination has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Block until `deadline` or until termination is requested.
    pub fn sleep_until(&self, deadline: Instant) -> Sleep {
        let mut state = self.lock();
        loop {
            if state.requested {
                return Sleep::Interrupted;
            }
            let now = Instant::now();
            if now >= deadline {
                return Sleep::Elapsed;
            }
            state = self
                .inner
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Record that the playback thread has completed its shutdown.
    pub fn mark_finished(&self) {
        let mut state = self.lock();
        state.finished = true;
        self.inner.changed.notify_all();
    }

    /// Wait up to `timeout` for [`mark_finished`](Self::mark_finished).
    ///
    /// Returns `true` if shutdown completed in time.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (state, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |state| !state.finished)
            .unwrap_or_else(PoisonError::into_inner);
        state.finished
    }

    /// Watch SIGINT and SIGTERM on a background thread.
    ///
    /// The first signal requests termination. If playback has not called
    /// [`mark_finished`](Self::mark_finished) within [`SHUTDOWN_GRACE`]
    /// (for instance because it is blocked reading a silent pipe),
    /// `on_stall` runs on the watcher thread; it is expected to restore the
    /// terminal and exit the process.
    #[cfg(unix)]
    pub fn install_signal_handlers<F>(&self, on_stall: F) -> std::io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let token = self.clone();
        std::thread::Builder::new()
            .name("tmv-signals".into())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    log::debug!("received signal {sig}, stopping playback");
                    token.request();
                    if !token.wait_finished(SHUTDOWN_GRACE) {
                        log::debug!("playback did not stop within {SHUTDOWN_GRACE:?}");
                        on_stall();
                    }
                }
            })?;
        Ok(())
    }

    /// Signal watching is only available on unix; elsewhere the default
    /// handlers stay in place.
    #[cfg(not(unix))]
    pub fn install_signal_handlers<F>(&self, _on_stall: F) -> std::io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        log::debug!("termination signals are not watched on this platform");
        Ok(())
    }
}
