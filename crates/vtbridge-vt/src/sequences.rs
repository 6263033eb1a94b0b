//! Escape-sequence builders
//!
//! Every builder formats a complete sequence into an owned `String`, so the
//! caller can append it to an output buffer atomically. Fixed sequences are
//! exposed as constants.

use crate::color::Color;

/// Erase the entire display (ED 2)
pub const CLEAR_SCREEN: &str = "\x1b[2J";

/// Erase the entire current line (EL 2)
pub const ERASE_LINE: &str = "\x1b[2K";

/// Erase from the cursor to the end of the line (EL 0)
pub const ERASE_TO_LINE_END: &str = "\x1b[K";

/// Ask the terminal to report the cursor position (DSR-CPR)
pub const REQUEST_CURSOR_POSITION: &str = "\x1b[6n";

/// Reset all graphics attributes (SGR 0)
pub const GRAPHICS_RESET: &str = "\x1b[0m";

/// Make the cursor visible (DECTCEM)
pub const SHOW_CURSOR: &str = "\x1b[?25h";

/// Hide the cursor (DECTCEM)
pub const HIDE_CURSOR: &str = "\x1b[?25l";

/// Move the cursor to a 0-based (row, col) cell. The wire format is 1-based.
pub fn cursor_position(row: u16, col: u16) -> String {
    format!("\x1b[{};{}H", row + 1, col + 1)
}

/// Ask the terminal to resize its window to the given cell dimensions
pub fn resize_window(width: u16, height: u16) -> String {
    format!("\x1b[8;{};{}t", height, width)
}

/// Set the window title (OSC 2, BEL-terminated)
pub fn window_title(title: &str) -> String {
    format!("\x1b]2;{}\x07", title)
}

/// Build a single SGR sequence for the given brush
///
/// Always starts from a reset so the result fully describes the brush,
/// independent of whatever was emitted before.
pub fn graphics(fg: Color, bg: Color, bold: bool) -> String {
    let mut codes: Vec<u16> = vec![0];

    if bold {
        codes.push(1);
    }

    match fg {
        Color::Default => {}
        Color::Indexed(n) if n < 8 => codes.push(30 + n as u16),
        Color::Indexed(n) if n < 16 => codes.push(90 + (n - 8) as u16),
        Color::Indexed(n) => {
            codes.push(38);
            codes.push(5);
            codes.push(n as u16);
        }
        Color::Rgb(r, g, b) => {
            codes.push(38);
            codes.push(2);
            codes.push(r as u16);
            codes.push(g as u16);
            codes.push(b as u16);
        }
    }

    match bg {
        Color::Default => {}
        Color::Indexed(n) if n < 8 => codes.push(40 + n as u16),
        Color::Indexed(n) if n < 16 => codes.push(100 + (n - 8) as u16),
        Color::Indexed(n) => {
            codes.push(48);
            codes.push(5);
            codes.push(n as u16);
        }
        Color::Rgb(r, g, b) => {
            codes.push(48);
            codes.push(2);
            codes.push(r as u16);
            codes.push(g as u16);
            codes.push(b as u16);
        }
    }

    if codes.len() == 1 {
        return GRAPHICS_RESET.to_string();
    }

    format!(
        "\x1b[{}m",
        codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(";")
    )
}
