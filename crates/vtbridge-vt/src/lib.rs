//! VT escape-sequence formatting for vtbridge
//!
//! Pure formatting utilities shared by the render engine: escape-sequence
//! builders and the color model. Nothing in this crate performs I/O or
//! holds engine state.

pub mod color;
pub mod sequences;

pub use color::{nearest_indexed, xterm_palette, Color};
