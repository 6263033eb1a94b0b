//! Render engine core for vtbridge
//!
//! Translates deltas of an in-memory terminal screen model into VT
//! escape-sequence bytes written to a pipe. The engine tracks which region
//! of the viewport needs repainting, batches formatted fragments in an
//! output buffer, and flushes the buffer to the sink at frame boundaries.
//! A background watchdog unblocks a writer stuck in the pipe write when
//! the session shuts down concurrently.

pub mod engine;
pub mod pipeline;
pub mod region;
pub mod shutdown;
pub mod unblock;
pub mod viewport;

pub use engine::{CursorPos, RenderEngine};
pub use pipeline::{ByteSink, OutputPipeline};
pub use region::RegionTracker;
pub use shutdown::ShutdownSignal;
pub use viewport::Viewport;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("pipe write failed: {0}")]
    SinkWrite(std::io::Error),

    #[error("failed to spawn shutdown watchdog: {0}")]
    WatchdogSpawn(std::io::Error),
}
