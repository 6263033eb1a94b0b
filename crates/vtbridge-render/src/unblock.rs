//! Cancellation of an in-flight blocking pipe write
//!
//! A thread stuck in `write(2)` on a pipe nobody reads can be unstuck by
//! delivering a signal to exactly that thread: with a handler installed
//! without `SA_RESTART`, the interrupted syscall returns `EINTR` instead
//! of resuming, and the flush path treats that as an ordinary write
//! failure.

use nix::sys::pthread::{pthread_kill, Pthread};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::Once;
use tracing::error;

/// Signal used to interrupt a blocked writer
pub const UNBLOCK_SIGNAL: Signal = Signal::SIGUSR1;

static INSTALL_HANDLER: Once = Once::new();

extern "C" fn on_unblock(_signal: libc::c_int) {
    // The handler only exists so the blocked write returns EINTR.
}

/// Install the no-op handler for [`UNBLOCK_SIGNAL`]. Idempotent.
///
/// Must run before the watchdog can ever deliver the signal: with the
/// default disposition, SIGUSR1 terminates the process. `SA_RESTART` is
/// omitted so the kernel fails the interrupted write instead of
/// restarting it.
pub fn install_unblock_handler() {
    INSTALL_HANDLER.call_once(|| {
        let action = SigAction::new(
            SigHandler::Handler(on_unblock),
            SaFlags::empty(),
            SigSet::empty(),
        );

        // Safety: replaces the disposition of a signal this process does
        // not otherwise use, with a handler that touches no state.
        if let Err(err) = unsafe { sigaction(UNBLOCK_SIGNAL, &action) } {
            error!("failed to install write-unblock signal handler: {}", err);
        }
    });
}

/// Interrupt the blocking write in flight on `thread`
///
/// Best-effort: the caller logs and swallows failures.
pub(crate) fn cancel_blocked_write(thread: Pthread) -> nix::Result<()> {
    pthread_kill(thread, UNBLOCK_SIGNAL)
}
