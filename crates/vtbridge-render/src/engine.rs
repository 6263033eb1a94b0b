//! The render state machine
//!
//! Orchestrates per-frame rendering for one attached terminal: decides
//! what changed using the region tracker, formats the matching escape
//! sequences, pushes them through the output pipeline, and flushes at
//! frame boundaries. Runs on whichever thread the screen-buffer owner
//! calls it from; the only other thread involved is the shutdown
//! watchdog spawned at construction.

use crate::pipeline::{BlockedThreadMarker, ByteSink, OutputPipeline};
use crate::region::RegionTracker;
use crate::shutdown::{self, ShutdownSignal};
use crate::unblock;
use crate::viewport::Viewport;
use crate::RenderError;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::debug;
use vtbridge_vt::{sequences, Color};

/// A cursor position in 0-based (row, col) cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    pub row: u16,
    pub col: u16,
}

impl CursorPos {
    pub fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }
}

/// VT rendering engine for one terminal session
pub struct RenderEngine {
    pipeline: OutputPipeline,
    tracker: RegionTracker,

    shutdown: ShutdownSignal,
    watchdog: Option<JoinHandle<()>>,

    /// Viewport as of the last update
    last_viewport: Viewport,

    /// Where the cursor ended up after the last emitted output
    last_text: CursorPos,

    /// Last emitted brush; `None` until the first SGR goes out
    last_fg: Option<Color>,
    last_bg: Option<Color>,
    last_bold: bool,

    /// Last title sent to the terminal
    last_title: Option<String>,

    /// The next frame is the first one and starts from a cleared screen
    first_paint: bool,

    /// The screen buffer has scrolled at least once since the session started
    circled: bool,

    /// One-shot gate: swallow the next resize echo
    suppress_resize: bool,

    /// An external resize negotiation is in progress
    in_resize_request: bool,

    /// No repaint is ever issued above this row
    virtual_top: u16,

    /// Cursor placement deferred to the end of the frame
    deferred_cursor: Option<CursorPos>,

    /// Swallow the next cursor invalidation (set by cursor inheritance)
    skip_cursor: bool,

    /// The cursor moved since the last frame
    cursor_moved: bool,
}

impl RenderEngine {
    /// Create an engine over the given sink
    ///
    /// Spawns the shutdown watchdog and installs the write-unblock signal
    /// handler. The shutdown signal is shared with the session layer so
    /// either side can initiate teardown.
    pub fn new(
        sink: Box<dyn ByteSink + Send>,
        shutdown: ShutdownSignal,
        initial_viewport: Viewport,
    ) -> Result<Self, RenderError> {
        unblock::install_unblock_handler();

        let blocked_thread = Arc::new(BlockedThreadMarker::new());
        let watchdog = shutdown::spawn_watchdog(shutdown.clone(), Arc::clone(&blocked_thread))
            .map_err(RenderError::WatchdogSpawn)?;

        Ok(Self {
            pipeline: OutputPipeline::new(sink, shutdown.clone(), blocked_thread),
            tracker: RegionTracker::new(initial_viewport),
            shutdown,
            watchdog: Some(watchdog),
            last_viewport: initial_viewport,
            last_text: CursorPos::new(0, 0),
            last_fg: None,
            last_bg: None,
            last_bold: false,
            last_title: None,
            first_paint: true,
            circled: false,
            suppress_resize: true,
            in_resize_request: false,
            virtual_top: 0,
            deferred_cursor: None,
            skip_cursor: false,
            cursor_moved: false,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.last_viewport
    }

    /// The region the owner must repaint this frame, if any
    pub fn dirty_region(&self) -> Option<Viewport> {
        self.tracker.bounding()
    }

    /// Combine a rectangle into the invalid region
    pub fn invalidate(&mut self, rect: Viewport) {
        self.tracker.invalidate(rect);
    }

    /// Mark the entire viewport for repaint
    pub fn invalidate_all(&mut self) {
        self.tracker.invalidate_all();
    }

    /// Note that the cursor occupies (or vacated) the given cell
    ///
    /// The invalidation immediately following cursor inheritance is
    /// swallowed: that position is already correct on the terminal side.
    pub fn invalidate_cursor(&mut self, cursor: CursorPos) {
        if self.skip_cursor {
            self.skip_cursor = false;
            return;
        }

        self.cursor_moved = true;
        self.tracker
            .invalidate(Viewport::from_dimensions(cursor.col, cursor.row, 1, 1));
    }

    /// Shift the invalid region by a scroll delta
    ///
    /// Rows revealed by the scroll are invalidated; the rest of the
    /// region rides along with the content.
    pub fn scroll(&mut self, delta_rows: i32) {
        self.tracker.shift_vertical(delta_rows);
    }

    /// Note that the screen buffer has circled
    ///
    /// Returns whether the owner should schedule a full repaint. While a
    /// resize negotiation is in progress the answer is always no: a
    /// second concurrent repaint trigger would race the resize.
    pub fn buffer_circled(&mut self) -> bool {
        self.circled = true;
        !self.in_resize_request
    }

    /// Update the viewport, negotiating a resize with the terminal
    ///
    /// Emits a resize-window sequence unless suppressed. The suppression
    /// flag is one-shot: the very first viewport report originated from
    /// the terminal itself and must never be echoed back, so the flag is
    /// always cleared here even when the dimensions did not change —
    /// clearing it only on change would swallow the first real resize.
    pub fn update_viewport(&mut self, new_viewport: Viewport) {
        let old_viewport = self.last_viewport;
        self.last_viewport = new_viewport;
        self.tracker.set_viewport(new_viewport);

        let size_changed = old_viewport.width() != new_viewport.width()
            || old_viewport.height() != new_viewport.height();
        if size_changed && !self.suppress_resize {
            self.pipeline.write_str(&sequences::resize_window(
                new_viewport.width(),
                new_viewport.height(),
            ));
        }
        self.suppress_resize = false;

        if old_viewport.height() > new_viewport.height()
            || old_viewport.width() > new_viewport.width()
        {
            // Shrank in at least one direction; invalidation computed for
            // the old, larger viewport no longer holds.
            self.tracker.invalidate_all();
        } else {
            // Grew. Invalidate the strip right of the old viewport, then
            // the strip below it. When both dimensions grow the corner is
            // covered twice; over-invalidation is the safe direction.
            if old_viewport.width() < new_viewport.width() {
                self.tracker.invalidate(Viewport::from_exclusive(
                    old_viewport.right_exclusive(),
                    0,
                    new_viewport.right_exclusive(),
                    old_viewport.bottom_exclusive(),
                ));
            }
            if old_viewport.height() < new_viewport.height() {
                self.tracker.invalidate(Viewport::from_exclusive(
                    0,
                    old_viewport.bottom_exclusive(),
                    new_viewport.right_exclusive(),
                    new_viewport.bottom_exclusive(),
                ));
            }
        }
    }

    /// Swallow the next resize echo
    ///
    /// Called by the session layer when the terminal itself requested the
    /// upcoming resize.
    pub fn suppress_resize_repaint(&mut self) {
        self.suppress_resize = true;
    }

    /// Inherit the cursor of an already-running session
    ///
    /// The terminal is already showing content up to this position, so
    /// nothing above it is ever repainted, the next cursor invalidation
    /// is swallowed, and the first frame skips its full clear.
    pub fn inherit_cursor(&mut self, cursor: CursorPos) {
        debug!(row = cursor.row, col = cursor.col, "inheriting cursor");
        self.virtual_top = cursor.row;
        self.last_text = cursor;
        self.skip_cursor = true;
        self.first_paint = false;
    }

    /// Ask the terminal to report its cursor position
    ///
    /// The reply arrives on the separate input channel. The request is
    /// flushed before returning so the terminal actually sees it.
    pub fn request_cursor(&mut self) -> Result<(), RenderError> {
        self.pipeline.write_str(sequences::REQUEST_CURSOR_POSITION);
        self.pipeline.flush()
    }

    /// Enter a resize negotiation bracket
    ///
    /// Until [`RenderEngine::end_resize_request`], circling events do not
    /// trigger repaint requests. Not reentrant; nesting is the caller's
    /// bug.
    pub fn begin_resize_request(&mut self) {
        self.in_resize_request = true;
    }

    /// Leave the resize negotiation bracket
    pub fn end_resize_request(&mut self) {
        self.in_resize_request = false;
    }

    /// Begin a paint frame
    ///
    /// Returns `false` when there is nothing to do this frame. On the
    /// first frame the remote screen is cleared outright (unless a cursor
    /// was inherited). An all-invalid region is collapsed into a single
    /// clear-screen sequence rather than per-row erases.
    pub fn start_paint(&mut self) -> bool {
        let mut cleared = false;
        if self.first_paint {
            self.pipeline.write_str(sequences::CLEAR_SCREEN);
            self.tracker.invalidate_all();
            self.first_paint = false;
            cleared = true;
        }

        if self.virtual_top > 0 {
            self.tracker.clip_top(self.virtual_top);
        }

        if self.tracker.is_empty()
            && !self.cursor_moved
            && self.deferred_cursor.is_none()
            && self.pipeline.is_empty()
        {
            return false;
        }

        if !cleared && self.tracker.is_all_invalid() {
            self.pipeline.write_str(sequences::CLEAR_SCREEN);
        }

        self.pipeline.write_str(sequences::HIDE_CURSOR);
        true
    }

    /// Set the brush for subsequent text, eliding redundant SGRs
    pub fn update_attrs(&mut self, fg: Color, bg: Color, bold: bool) {
        if self.last_fg == Some(fg) && self.last_bg == Some(bg) && self.last_bold == bold {
            return;
        }

        self.pipeline
            .write_str(&sequences::graphics(fg, bg, bold));
        self.last_fg = Some(fg);
        self.last_bg = Some(bg);
        self.last_bold = bold;
    }

    /// Paint a run of text starting at the given cell
    ///
    /// The cursor move is elided when the run continues where the last
    /// output ended.
    pub fn paint_buffer_line(&mut self, text: &str, start: CursorPos) {
        self.move_cursor(start);
        self.pipeline.write_str(text);

        let advanced = text.chars().count().min(usize::from(u16::MAX)) as u16;
        self.last_text.col = self.last_text.col.saturating_add(advanced);
    }

    /// Erase from the current output position to the end of the row
    ///
    /// Used instead of painting trailing blanks when a run got shorter.
    pub fn erase_to_line_end(&mut self) {
        self.pipeline.write_str(sequences::ERASE_TO_LINE_END);
    }

    /// Blank an entire row
    pub fn erase_row(&mut self, row: u16) {
        self.move_cursor(CursorPos::new(row, 0));
        self.pipeline.write_str(sequences::ERASE_LINE);
    }

    /// Record where the cursor belongs at the end of this frame
    ///
    /// The actual move is emitted once, in [`RenderEngine::end_paint`],
    /// after all text output.
    pub fn paint_cursor(&mut self, cursor: CursorPos) {
        self.deferred_cursor = Some(cursor);
    }

    /// Update the window title, eliding repeats
    pub fn update_title(&mut self, title: &str) {
        if self.last_title.as_deref() == Some(title) {
            return;
        }

        self.pipeline.write_str(&sequences::window_title(title));
        self.last_title = Some(title.to_string());
    }

    /// Finish the frame: place the cursor, flush, reset frame state
    pub fn end_paint(&mut self) -> Result<(), RenderError> {
        if let Some(cursor) = self.deferred_cursor.take() {
            self.move_cursor(cursor);
        }
        self.pipeline.write_str(sequences::SHOW_CURSOR);

        self.pipeline.flush()?;

        self.tracker.clear();
        self.cursor_moved = false;
        Ok(())
    }

    /// Whether the screen buffer has ever circled
    pub fn buffer_has_circled(&self) -> bool {
        self.circled
    }

    /// Flush the output buffer outside a frame boundary
    pub fn flush(&mut self) -> Result<(), RenderError> {
        self.pipeline.flush()
    }

    /// Font selection is owned by the attached terminal
    pub fn update_font(&mut self) {}

    /// DPI is owned by the attached terminal
    pub fn update_dpi(&mut self, _dpi: u32) {}

    /// Cell-based placeholder reported when a caller asks for pixel metrics
    pub fn font_size(&self) -> (u16, u16) {
        (1, 1)
    }

    fn move_cursor(&mut self, target: CursorPos) {
        if target == self.last_text {
            return;
        }

        self.pipeline
            .write_str(&sequences::cursor_position(target.row, target.col));
        self.last_text = target;
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        // Wake the watchdog and wait for it, so no dangling thread
        // references a destroyed engine. The join is bounded: the signal
        // is set before it.
        self.shutdown.set();
        if let Some(watchdog) = self.watchdog.take() {
            let _ = watchdog.join();
        }
    }
}
