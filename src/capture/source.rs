use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::{
    core::PixelBuffer,
    error::{GlyphcastError, GlyphcastResult},
};

/// One raw frame handed to the recorder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Capture time relative to the start of the video.
    pub timestamp_ms: u64,
    /// Straight-alpha RGBA8 pixels.
    pub pixels: PixelBuffer,
}

/// Producer of raw frames on a fixed cadence.
///
/// The recorder pulls frames synchronously and does not know how they are scheduled.
pub trait FrameSource {
    /// Nominal spacing between produced frames.
    fn frame_interval_ms(&self) -> u32;

    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> GlyphcastResult<Option<CapturedFrame>>;
}

/// Timestamp generator for a fixed capture interval: `0, interval, 2 * interval, ...`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCadence {
    interval_ms: u32,
    next_index: u64,
}

impl FixedCadence {
    /// Cadence with the given interval (at least 1 ms).
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_index: 0,
        }
    }

    /// Interval in milliseconds.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Timestamp for the next frame; advances the cadence.
    pub fn tick(&mut self) -> u64 {
        let ts = self.next_index.saturating_mul(u64::from(self.interval_ms));
        self.next_index += 1;
        ts
    }
}

/// Frames already held in memory.
#[derive(Debug)]
pub struct MemoryFrameSource {
    frames: VecDeque<PixelBuffer>,
    cadence: FixedCadence,
}

impl MemoryFrameSource {
    /// Source yielding `frames` in order, `interval_ms` apart.
    pub fn new(frames: Vec<PixelBuffer>, interval_ms: u32) -> Self {
        Self {
            frames: frames.into(),
            cadence: FixedCadence::new(interval_ms),
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn frame_interval_ms(&self) -> u32 {
        self.cadence.interval_ms()
    }

    fn next_frame(&mut self) -> GlyphcastResult<Option<CapturedFrame>> {
        Ok(self.frames.pop_front().map(|pixels| CapturedFrame {
            timestamp_ms: self.cadence.tick(),
            pixels,
        }))
    }
}

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff"];

/// Still images decoded one per frame, in path order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    cadence: FixedCadence,
}

impl ImageSequenceSource {
    /// Source over explicit image paths.
    pub fn new(paths: Vec<PathBuf>, interval_ms: u32) -> Self {
        Self {
            paths: paths.into(),
            cadence: FixedCadence::new(interval_ms),
        }
    }

    /// Every image file directly inside `dir`, sorted by file name.
    pub fn from_dir(dir: &Path, interval_ms: u32) -> GlyphcastResult<Self> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| GlyphcastError::io(format!("list frames in '{}'", dir.display()), e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| GlyphcastError::io(format!("list frames in '{}'", dir.display()), e))?
                .path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(GlyphcastError::invalid_input(format!(
                "no image frames found in '{}'",
                dir.display()
            )));
        }
        paths.sort();
        Ok(Self::new(paths, interval_ms))
    }

    /// Frames not yet produced.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_interval_ms(&self) -> u32 {
        self.cadence.interval_ms()
    }

    fn next_frame(&mut self) -> GlyphcastResult<Option<CapturedFrame>> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        let rgba = image::open(&path)
            .with_context(|| format!("decode frame image '{}'", path.display()))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = PixelBuffer::new(width, height, rgba.into_raw())?;
        Ok(Some(CapturedFrame {
            timestamp_ms: self.cadence.tick(),
            pixels,
        }))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|x| x.to_str())
        .is_some_and(|x| IMAGE_EXTENSIONS.iter().any(|e| x.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/source.rs"]
mod tests;
