use crate::{
    foundation::core::rgba_len,
    foundation::error::{GlyphcastError, GlyphcastResult},
    glyph::charset::{Charset, resolve},
    glyph::luma::{clamp_brightness, map_luma_to_index, map_pixel},
};

/// Bytes stored per output cell: `[glyph_index, r, g, b]`.
pub const BYTES_PER_CELL: usize = 4;
/// Largest grid width or height a `.ascache` frame record can hold (16-bit fields).
pub const MAX_GRID_SIDE: u32 = u16::MAX as u32;

/// One converted frame: a grid of glyph indices with the sampled source color per cell.
///
/// Cell `(row, col)` lives at byte offset `(row * width + col) * 4`, row 0 at the top. The
/// glyph index refers to the charset recorded in the owning cache's metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedFrame {
    /// `width * height * 4` bytes of `[glyph_index, r, g, b]`.
    pub data: Vec<u8>,
    /// Columns in the glyph grid.
    pub width: u32,
    /// Rows in the glyph grid.
    pub height: u32,
}

impl CompressedFrame {
    /// Wrap raw cell bytes, checking `data.len() == width * height * 4`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> GlyphcastResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(GlyphcastError::invalid_input(format!(
                "compressed frame has {} bytes, expected {expected} for {width}x{height} cells",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Glyph index and color of cell `(row, col)`, or `None` outside the grid.
    pub fn cell(&self, row: u32, col: u32) -> Option<Cell> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let off = (row as usize * self.width as usize + col as usize) * BYTES_PER_CELL;
        let px = self.data.get(off..off + BYTES_PER_CELL)?;
        Some(Cell {
            glyph_index: px[0],
            rgb: [px[1], px[2], px[3]],
        })
    }
}

/// Decoded view of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Index into the cache's glyph set.
    pub glyph_index: u8,
    /// Color of the sampled source pixel.
    pub rgb: [u8; 3],
}

/// Glyph grid dimensions `(columns, rows)` for an image of the given size.
///
/// Rows are halved because a glyph cell is roughly twice as tall as it is wide, which keeps
/// the rendered grid proportional to the source image. Grids wider or taller than
/// [`MAX_GRID_SIDE`] are rejected before any cell memory is allocated.
pub fn grid_size(
    image_width: u32,
    image_height: u32,
    num_columns: u32,
) -> GlyphcastResult<(u32, u32)> {
    if image_width == 0 || image_height == 0 {
        return Err(GlyphcastError::invalid_input(format!(
            "image dimensions must be positive, got {image_width}x{image_height}"
        )));
    }
    let columns = num_columns.max(1);
    if columns > MAX_GRID_SIDE {
        return Err(GlyphcastError::invalid_input(format!(
            "{columns} columns exceed the cache limit of {MAX_GRID_SIDE}"
        )));
    }
    let aspect = f64::from(image_width) / f64::from(image_height);
    let rows = (f64::from(columns) / aspect / 2.0).round().max(1.0);
    if rows > f64::from(MAX_GRID_SIDE) {
        return Err(GlyphcastError::invalid_input(format!(
            "image aspect {image_width}x{image_height} yields {rows} rows for {columns} columns, \
             above the cache limit of {MAX_GRID_SIDE}"
        )));
    }
    Ok((columns, rows as u32))
}

/// Sample an RGBA8 image onto a glyph grid `num_columns` wide.
///
/// Each cell takes the pixel nearest its center; no averaging is done. Identical inputs
/// always produce byte-identical output.
pub fn compress(
    pixels: &[u8],
    image_width: u32,
    image_height: u32,
    num_columns: u32,
    charset: Charset,
    brightness: f64,
) -> GlyphcastResult<CompressedFrame> {
    let (columns, rows) = grid_size(image_width, image_height, num_columns)?;
    let expected = rgba_len(image_width, image_height)?;
    if pixels.len() < expected {
        return Err(GlyphcastError::invalid_input(format!(
            "pixel buffer has {} bytes, expected at least {expected} for {image_width}x{image_height} RGBA8",
            pixels.len()
        )));
    }
    let out_len = rgba_len(columns, rows)?;

    let glyph_count = resolve(charset).len();
    let brightness = clamp_brightness(brightness);
    let cell_w = f64::from(image_width) / f64::from(columns);
    let cell_h = f64::from(image_height) / f64::from(rows);

    let mut data = Vec::with_capacity(out_len);
    for row in 0..rows {
        let sy = sample_coord(row, cell_h, image_height);
        for col in 0..columns {
            let sx = sample_coord(col, cell_w, image_width);
            let off = (sy * image_width as usize + sx) * 4;
            let (r, g, b) = (pixels[off], pixels[off + 1], pixels[off + 2]);
            let idx = map_luma_to_index(map_pixel(r, g, b, brightness), glyph_count);
            data.extend_from_slice(&[idx as u8, r, g, b]);
        }
    }

    Ok(CompressedFrame {
        data,
        width: columns,
        height: rows,
    })
}

fn sample_coord(cell: u32, cell_size: f64, dim: u32) -> usize {
    let v = ((f64::from(cell) + 0.5) * cell_size).round();
    let max = f64::from(dim - 1);
    v.clamp(0.0, max) as usize
}

#[cfg(test)]
#[path = "../../tests/unit/compress/frame.rs"]
mod tests;
