//! Buffered output pipeline over the pipe sink
//!
//! Formatted protocol fragments accumulate in an in-memory buffer and are
//! transmitted as a single blocking write when the engine flushes. The
//! flush is the only operation in the engine that can block, and the only
//! one that sends bytes to the attached terminal.

use crate::shutdown::ShutdownSignal;
use crate::RenderError;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Destination for outgoing protocol bytes
///
/// The handle's identity and lifetime are managed by the session layer;
/// the pipeline only ever writes through it.
pub trait ByteSink {
    /// Blocking, all-or-nothing write of `buf`
    ///
    /// Failure covers both OS-level errors and a forced cancellation of
    /// the in-flight write. Implementations must surface an interruption
    /// (`EINTR`, or a short transfer after a signal) rather than retry
    /// it, or cancellation could never terminate the flush.
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// Shared slot naming the thread currently inside the blocking write
///
/// Zero means none. Written immediately before the write is issued and
/// cleared immediately after it returns, regardless of outcome. The
/// shutdown watchdog reads it once to decide whom to unblock.
#[derive(Default)]
pub struct BlockedThreadMarker(AtomicU64);

impl BlockedThreadMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the calling thread as the blocked writer
    pub fn mark_current(&self) {
        self.0
            .store(nix::sys::pthread::pthread_self() as u64, Ordering::SeqCst);
    }

    /// Clear the slot back to "none"
    pub fn clear(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    /// The blocked thread, if any
    pub fn load(&self) -> Option<nix::sys::pthread::Pthread> {
        let raw = self.0.load(Ordering::SeqCst);
        (raw != 0).then(|| raw as nix::sys::pthread::Pthread)
    }
}

/// Append-only output buffer plus the sink it flushes to
pub struct OutputPipeline {
    sink: Box<dyn ByteSink + Send>,

    /// Bytes accumulated since the last flush
    buffer: Vec<u8>,

    /// Shared teardown latch; a set signal turns flushes into no-ops
    shutdown: ShutdownSignal,

    /// Read by the shutdown watchdog
    blocked_thread: Arc<BlockedThreadMarker>,
}

impl OutputPipeline {
    pub fn new(
        sink: Box<dyn ByteSink + Send>,
        shutdown: ShutdownSignal,
        blocked_thread: Arc<BlockedThreadMarker>,
    ) -> Self {
        Self {
            sink,
            buffer: Vec::new(),
            shutdown,
            blocked_thread,
        }
    }

    /// Append bytes to the buffer. Never blocks, never fails.
    pub fn write(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Append an already-formatted fragment
    pub fn write_str(&mut self, fragment: &str) {
        self.write(fragment.as_bytes());
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Transmit the buffer to the sink as one blocking write
    ///
    /// When the shutdown signal is already set, the write is skipped and
    /// success reported: teardown is in progress and emitting further
    /// bytes would race the sink's closure. A failed write (including a
    /// forced cancellation) sets the shutdown signal so every other
    /// waiter and all subsequent flushes stand down.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        if self.shutdown.is_set() {
            return Ok(());
        }

        // Stash the thread identity before entering the potentially
        // blocking write, so the watchdog can unstick this thread if the
        // session is torn down mid-write.
        self.blocked_thread.mark_current();
        let result = self.sink.write_bytes(&self.buffer);
        self.blocked_thread.clear();

        self.buffer.clear();
        if let Err(err) = result {
            warn!("pipe write failed, signalling shutdown: {}", err);
            self.shutdown.set();
            return Err(RenderError::SinkWrite(err));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        let marker = BlockedThreadMarker::new();
        assert!(marker.load().is_none());

        marker.mark_current();
        assert_eq!(
            marker.load(),
            Some(nix::sys::pthread::pthread_self())
        );

        marker.clear();
        assert!(marker.load().is_none());
    }
}
