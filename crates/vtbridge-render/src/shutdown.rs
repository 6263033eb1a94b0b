//! Shared shutdown signal and the write-unblocking watchdog
//!
//! The signal is a monotonic latch: once set it stays set, every waiter
//! wakes, and later flushes stand down without touching the sink. The
//! watchdog is a one-shot background thread that waits for the signal and
//! then breaks a writer out of a blocked pipe write, so engine teardown
//! never hangs on a pipe nobody is reading.

use crate::pipeline::BlockedThreadMarker;
use crate::unblock;
use std::io;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A process-wide, once-set, idempotent shutdown latch with waiters
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<SignalInner>,
}

#[derive(Default)]
struct SignalInner {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and wake every waiter. Idempotent.
    pub fn set(&self) {
        let mut signaled = self.inner.signaled.lock().unwrap();
        if !*signaled {
            *signaled = true;
            self.inner.cond.notify_all();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.inner.signaled.lock().unwrap()
    }

    /// Block until the signal is set
    pub fn wait(&self) {
        let mut signaled = self.inner.signaled.lock().unwrap();
        while !*signaled {
            signaled = self.inner.cond.wait(signaled).unwrap();
        }
    }
}

/// Spawn the one-shot shutdown watchdog
///
/// The watchdog blocks on the shutdown signal. Once it fires, the marker
/// is read a single time; if a thread is parked inside the blocking pipe
/// write, its in-flight syscall is cancelled so the flush fails promptly
/// instead of hanging teardown. Cancellation is best-effort: failures are
/// logged and swallowed, never escalated.
pub(crate) fn spawn_watchdog(
    shutdown: ShutdownSignal,
    blocked_thread: Arc<BlockedThreadMarker>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("vtbridge-watchdog".to_string())
        .spawn(move || {
            shutdown.wait();

            if let Some(thread) = blocked_thread.load() {
                debug!("shutdown with a writer blocked in the pipe write, cancelling it");
                if let Err(err) = unblock::cancel_blocked_write(thread) {
                    warn!("failed to cancel blocked pipe write: {}", err);
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_starts_unset() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_set_is_idempotent_and_monotonic() {
        let signal = ShutdownSignal::new();

        signal.set();
        assert!(signal.is_set());

        signal.set();
        assert!(signal.is_set());
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ShutdownSignal::new();
        let observer = signal.clone();

        signal.set();
        assert!(observer.is_set());
    }

    #[test]
    fn test_wait_wakes_on_set() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();

        let handle = thread::spawn(move || {
            waiter.wait();
        });

        thread::sleep(Duration::from_millis(50));
        signal.set();
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_returns_immediately_when_already_set() {
        let signal = ShutdownSignal::new();
        signal.set();
        signal.wait();
    }
}
