/// Upper bound for the brightness multiplier.
pub const MAX_BRIGHTNESS: f64 = 2.0;

/// Perceptual luma of an RGB pixel scaled by `brightness`, clamped to `[0, 1]`.
///
/// Uses Rec. 601 weights. `brightness` is expected in `[0, 2]`; values outside that range
/// are clamped first.
pub fn map_pixel(r: u8, g: u8, b: u8, brightness: f64) -> f64 {
    let luma = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;
    (luma * clamp_brightness(brightness)).clamp(0.0, 1.0)
}

/// Bucket a luma value in `[0, 1]` into a glyph index for a ramp of `glyph_count` glyphs.
///
/// The `- 0.001` keeps `luma == 1.0` on the last glyph instead of stepping one past the
/// end; it does not move any other bucket boundary that matters at 8-bit precision.
pub fn map_luma_to_index(luma: f64, glyph_count: usize) -> usize {
    if glyph_count == 0 {
        return 0;
    }
    let scaled = (luma * (glyph_count as f64 - 0.001)).floor();
    if scaled.is_nan() || scaled <= 0.0 {
        return 0;
    }
    (scaled as usize).min(glyph_count - 1)
}

pub(crate) fn clamp_brightness(brightness: f64) -> f64 {
    if brightness.is_nan() {
        return 1.0;
    }
    brightness.clamp(0.0, MAX_BRIGHTNESS)
}

#[cfg(test)]
#[path = "../../tests/unit/glyph/luma.rs"]
mod tests;
