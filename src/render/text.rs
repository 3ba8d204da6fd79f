use std::fmt::Write as _;

use crate::{compress::frame::CompressedFrame, glyph::charset::Charset};

/// Plain glyph grid of `frame`, one line per row joined with `'\n'`.
///
/// Glyph indices past the end of `charset`'s ramp render as its brightest glyph.
pub fn render_text(frame: &CompressedFrame, charset: Charset) -> String {
    let glyphs = charset.glyphs();
    let mut out = String::with_capacity(frame.cell_count() + frame.height as usize);
    for row in 0..frame.height {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..frame.width {
            if let Some(cell) = frame.cell(row, col) {
                out.push_str(glyphs.glyph(usize::from(cell.glyph_index)));
            }
        }
    }
    out
}

/// Glyph grid with a 24-bit foreground color escape per cell.
///
/// Every line ends with an SGR reset so a truncated terminal line never bleeds color.
pub fn render_ansi(frame: &CompressedFrame, charset: Charset) -> String {
    let glyphs = charset.glyphs();
    let mut out = String::with_capacity(frame.cell_count() * 20);
    for row in 0..frame.height {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..frame.width {
            if let Some(cell) = frame.cell(row, col) {
                let [r, g, b] = cell.rgb;
                let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
                out.push_str(glyphs.glyph(usize::from(cell.glyph_index)));
            }
        }
        out.push_str("\x1b[0m");
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
