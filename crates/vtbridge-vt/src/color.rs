//! Color model and the xterm 256-color palette
//!
//! The palette is the standard xterm layout: 16 base colors, a 6x6x6
//! color cube, and a 24-step grayscale ramp.

/// Color representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Default terminal color
    Default,

    /// ANSI 256-color palette index
    Indexed(u8),

    /// RGB color
    Rgb(u8, u8, u8),
}

/// The 16 base colors, in xterm's default RGB values
const BASE_COLORS: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00), // black
    (0x80, 0x00, 0x00), // red
    (0x00, 0x80, 0x00), // green
    (0x80, 0x80, 0x00), // yellow
    (0x00, 0x00, 0x80), // blue
    (0x80, 0x00, 0x80), // magenta
    (0x00, 0x80, 0x80), // cyan
    (0xc0, 0xc0, 0xc0), // white
    (0x80, 0x80, 0x80), // bright black
    (0xff, 0x00, 0x00), // bright red
    (0x00, 0xff, 0x00), // bright green
    (0xff, 0xff, 0x00), // bright yellow
    (0x00, 0x00, 0xff), // bright blue
    (0xff, 0x00, 0xff), // bright magenta
    (0x00, 0xff, 0xff), // bright cyan
    (0xff, 0xff, 0xff), // bright white
];

/// Intensity levels of the 6x6x6 color cube
const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

/// Build the full 256-entry xterm palette
pub fn xterm_palette() -> [(u8, u8, u8); 256] {
    let mut palette = [(0u8, 0u8, 0u8); 256];

    palette[..16].copy_from_slice(&BASE_COLORS);

    // 6x6x6 color cube (indices 16..232)
    for r in 0..6 {
        for g in 0..6 {
            for b in 0..6 {
                let index = 16 + 36 * r + 6 * g + b;
                palette[index] = (CUBE_LEVELS[r], CUBE_LEVELS[g], CUBE_LEVELS[b]);
            }
        }
    }

    // Grayscale ramp (indices 232..256)
    for i in 0..24 {
        let level = 8 + 10 * (i as u8);
        palette[232 + i] = (level, level, level);
    }

    palette
}

/// Find the palette index closest to an RGB triple
///
/// Used when the attached terminal only understands 256-color SGR.
pub fn nearest_indexed(r: u8, g: u8, b: u8) -> u8 {
    let palette = xterm_palette();

    let mut best = 0usize;
    let mut best_distance = u32::MAX;

    for (index, &(pr, pg, pb)) in palette.iter().enumerate() {
        let dr = (r as i32 - pr as i32).unsigned_abs();
        let dg = (g as i32 - pg as i32).unsigned_abs();
        let db = (b as i32 - pb as i32).unsigned_abs();
        let distance = dr * dr + dg * dg + db * db;

        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }

    best as u8
}
