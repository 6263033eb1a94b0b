//! Pipe handles and session wiring for vtbridge
//!
//! Owns the byte-sink side of the render engine: a validated pipe handle
//! the engine writes through, and the session glue that connects a
//! handle, a shutdown signal, and an initial viewport into a running
//! engine.

pub mod pipe;
pub mod session;

pub use pipe::PipeSink;
pub use session::VtSession;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("invalid pipe handle")]
    InvalidHandle,

    #[error("render engine error: {0}")]
    Render(#[from] vtbridge_render::RenderError),
}
