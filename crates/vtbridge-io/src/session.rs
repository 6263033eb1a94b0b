//! Session wiring between a pipe handle and the render engine

use crate::pipe::PipeSink;
use crate::IoError;
use std::os::unix::io::RawFd;
use tracing::debug;
use vtbridge_render::{RenderEngine, ShutdownSignal, Viewport};

/// A VT rendering session over one pipe
///
/// Validates the output handle, creates the shared shutdown signal, and
/// constructs the engine. The engine's cursor-report replies arrive on a
/// separate input channel owned elsewhere; this layer only ever writes.
pub struct VtSession {
    engine: RenderEngine,
    shutdown: ShutdownSignal,
}

impl VtSession {
    /// Establish a session writing to `output_fd`
    ///
    /// Fails immediately when the handle is invalid. Ownership of the
    /// descriptor passes to the session.
    pub fn new(output_fd: RawFd, initial_viewport: Viewport) -> Result<Self, IoError> {
        let sink = PipeSink::new(output_fd)?;
        let shutdown = ShutdownSignal::new();
        let engine = RenderEngine::new(Box::new(sink), shutdown.clone(), initial_viewport)?;

        debug!(fd = output_fd, "vt session established");
        Ok(Self { engine, shutdown })
    }

    /// Establish a session and ask the terminal where its cursor is
    ///
    /// Used when attaching to an already-running session: the caller
    /// feeds the reply to [`RenderEngine::inherit_cursor`] once it
    /// arrives on the input channel.
    pub fn new_inheriting_cursor(
        output_fd: RawFd,
        initial_viewport: Viewport,
    ) -> Result<Self, IoError> {
        let mut session = Self::new(output_fd, initial_viewport)?;
        session.engine.request_cursor()?;
        Ok(session)
    }

    pub fn engine_mut(&mut self) -> &mut RenderEngine {
        &mut self.engine
    }

    /// A handle onto the shared teardown latch
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Begin teardown; idempotent
    pub fn shutdown(&self) {
        self.shutdown.set();
    }
}

impl Drop for VtSession {
    fn drop(&mut self) {
        self.shutdown.set();
    }
}
