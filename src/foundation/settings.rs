use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::error::{GlyphcastError, GlyphcastResult},
    glyph::charset::Charset,
    glyph::luma::clamp_brightness,
};

/// Default glyph columns per frame.
pub const DEFAULT_COLUMNS: u32 = 80;
/// Largest accepted column count.
pub const MAX_COLUMNS: u32 = 1024;
/// Default capture spacing (20 Hz).
pub const DEFAULT_FRAME_INTERVAL_MS: u32 = 50;

/// Conversion settings applied to every frame of a recording.
///
/// Deserializes from JSON with every field optional. Out-of-range values are clamped by
/// [`ConvertSettings::normalized`] rather than rejected.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSettings {
    /// Glyph columns per frame, clamped to `[1, MAX_COLUMNS]`.
    pub num_columns: u32,
    /// Brightness multiplier, clamped to `[0, 2]`.
    pub brightness: f64,
    /// Glyph ramp; unknown keys resolve to the default ramp.
    pub charset: Charset,
    /// Capture spacing in milliseconds, clamped to `[1, 65535]`.
    pub frame_interval_ms: u32,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            num_columns: DEFAULT_COLUMNS,
            brightness: 1.0,
            charset: Charset::default(),
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
        }
    }
}

impl ConvertSettings {
    /// Read settings from a JSON file.
    pub fn from_path(path: &Path) -> GlyphcastResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        Self::from_json(&bytes)
    }

    /// Parse settings from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> GlyphcastResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| GlyphcastError::serde(format!("parse settings JSON: {e}")))
    }

    /// Copy with every field clamped into its accepted range.
    pub fn normalized(&self) -> Self {
        Self {
            num_columns: self.num_columns.clamp(1, MAX_COLUMNS),
            brightness: clamp_brightness(self.brightness),
            charset: self.charset,
            frame_interval_ms: self.frame_interval_ms.clamp(1, u32::from(u16::MAX)),
        }
    }

    /// Capture rate implied by the frame interval.
    pub fn fps(&self) -> f64 {
        1000.0 / f64::from(self.normalized().frame_interval_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/settings.rs"]
mod tests;
