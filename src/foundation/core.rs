use crate::foundation::error::{GlyphcastError, GlyphcastResult};

/// Owned RGBA8 pixel buffer for one captured frame.
///
/// Pixels are straight (not premultiplied) alpha, row-major, row 0 at the top. Alpha is
/// carried through but ignored by the glyph mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes of RGBA8.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA8 bytes, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> GlyphcastResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(GlyphcastError::invalid_input(format!(
                "pixel buffer has {} bytes, expected {expected} for {width}x{height} RGBA8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A buffer filled with a single RGBA color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }
}

/// Byte length of an RGBA8 buffer with the given dimensions.
pub(crate) fn rgba_len(width: u32, height: u32) -> GlyphcastResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| {
            GlyphcastError::invalid_input(format!("image dimensions {width}x{height} overflow"))
        })
}
