//! Invalid-region tracking over the current viewport
//!
//! The tracker accumulates a single bounding rectangle of everything that
//! needs repainting. Combining is a bounding-box union: over-invalidation
//! is safe, under-invalidation is a correctness bug. The accumulated
//! region is always contained in the current viewport.

use crate::viewport::Viewport;

/// Tracks the invalid region of a viewport between paint frames
///
/// Invalidation is monotonic within a frame; only the owning engine resets
/// it, via [`RegionTracker::clear`], after a flush completes a paint cycle.
#[derive(Debug, Clone)]
pub struct RegionTracker {
    /// The viewport the region lives in
    viewport: Viewport,

    /// Bounding rectangle of all invalidations since the last clear
    invalid: Viewport,

    /// Whether `invalid` holds anything
    used: bool,
}

impl RegionTracker {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            invalid: Viewport::empty(),
            used: false,
        }
    }

    /// Replace the viewport, clipping the accumulated region to it
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.used {
            self.invalid = self.invalid.intersect(&viewport);
            self.used = !self.invalid.is_empty();
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Combine a rectangle into the invalid region
    ///
    /// The rectangle is clipped to the viewport first, upholding the
    /// containment invariant.
    pub fn invalidate(&mut self, rect: Viewport) {
        let clipped = rect.intersect(&self.viewport);
        if clipped.is_empty() {
            return;
        }

        if self.used {
            self.invalid = self.invalid.union(&clipped);
        } else {
            self.invalid = clipped;
            self.used = true;
        }
    }

    /// Mark the entire viewport invalid
    pub fn invalidate_all(&mut self) {
        self.invalid = self.viewport;
        self.used = !self.viewport.is_empty();
    }

    /// True iff the invalid region covers the viewport exactly
    ///
    /// Signals that a single clear-screen sequence beats erasing per row.
    pub fn is_all_invalid(&self) -> bool {
        self.used && self.invalid == self.viewport
    }

    pub fn is_empty(&self) -> bool {
        !self.used
    }

    /// The accumulated region, if any
    pub fn bounding(&self) -> Option<Viewport> {
        self.used.then_some(self.invalid)
    }

    /// Reset to empty; called after a flush completes a paint cycle
    pub fn clear(&mut self) {
        self.invalid = Viewport::empty();
        self.used = false;
    }

    /// Drop any invalid rows above `min_row`
    ///
    /// Used to honor the virtual top after cursor inheritance.
    pub fn clip_top(&mut self, min_row: u16) {
        if !self.used {
            return;
        }

        let below = Viewport::from_exclusive(
            self.viewport.left(),
            min_row.max(self.viewport.top()),
            self.viewport.right_exclusive(),
            self.viewport.bottom_exclusive(),
        );
        self.invalid = self.invalid.intersect(&below);
        self.used = !self.invalid.is_empty();
    }

    /// Shift the region by a scroll delta and invalidate the revealed strip
    ///
    /// Positive deltas move content down (rows revealed at the top),
    /// negative deltas move content up (rows revealed at the bottom).
    pub fn shift_vertical(&mut self, delta: i32) {
        if delta == 0 {
            return;
        }

        if self.used {
            let shifted = self.invalid.offset_rows(delta).intersect(&self.viewport);
            self.used = !shifted.is_empty();
            self.invalid = shifted;
        }

        let viewport = self.viewport;
        let rows = u16::try_from(delta.unsigned_abs())
            .unwrap_or(u16::MAX)
            .min(viewport.height());
        let revealed = if delta > 0 {
            Viewport::from_dimensions(viewport.left(), viewport.top(), viewport.width(), rows)
        } else {
            Viewport::from_dimensions(
                viewport.left(),
                viewport.bottom_exclusive() - rows,
                viewport.width(),
                rows,
            )
        };
        self.invalidate(revealed);
    }
}
