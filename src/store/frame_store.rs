use std::collections::BTreeMap;

use crate::{
    codec::ascache::DecodedCache,
    compress::frame::{CompressedFrame, compress},
    foundation::error::GlyphcastResult,
    foundation::settings::{ConvertSettings, DEFAULT_FRAME_INTERVAL_MS},
    glyph::charset::Charset,
};

/// Capture settings shared by every frame of one cache.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CacheMetadata {
    /// Caller-chosen identifier of the source video.
    pub video_id: String,
    /// Glyph columns per frame.
    pub num_columns: u32,
    /// Brightness multiplier in `[0, 2]`.
    pub brightness: f64,
    /// Glyph ramp the frame glyph indices refer to.
    pub charset: Charset,
    /// Nominal spacing between captured frames.
    pub frame_interval_ms: u32,
}

impl CacheMetadata {
    /// Build metadata for `video_id` from (normalized) conversion settings.
    pub fn new(video_id: impl Into<String>, settings: &ConvertSettings) -> Self {
        let s = settings.normalized();
        Self {
            video_id: video_id.into(),
            num_columns: s.num_columns,
            brightness: s.brightness,
            charset: s.charset,
            frame_interval_ms: s.frame_interval_ms,
        }
    }
}

/// Lifecycle state of a [`FrameStore`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordingState {
    /// Not capturing; frames (if any) came from a finished recording.
    #[default]
    Idle,
    /// Accepting frames through [`FrameStore::add_frame`].
    Recording,
    /// Frames and metadata were installed from a persisted cache.
    Loaded,
}

/// Ordered, in-memory sequence of compressed frames for one video.
///
/// Insertion order is temporal order. Frames are only appended while
/// [`RecordingState::Recording`]; every other mutation goes through an explicit transition.
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: Vec<CompressedFrame>,
    timestamps: BTreeMap<u64, usize>,
    metadata: Option<CacheMetadata>,
    state: RecordingState,
}

impl FrameStore {
    /// Empty store in [`RecordingState::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard any frames, adopt `metadata` and start accepting frames.
    ///
    /// Calling this while already recording restarts the recording from scratch.
    pub fn start_recording(&mut self, metadata: CacheMetadata) {
        tracing::debug!(
            video_id = %metadata.video_id,
            num_columns = metadata.num_columns,
            charset = %metadata.charset,
            frame_interval_ms = metadata.frame_interval_ms,
            "start recording"
        );
        self.frames.clear();
        self.timestamps.clear();
        self.metadata = Some(metadata);
        self.state = RecordingState::Recording;
    }

    /// Compress an RGBA8 frame and append it.
    ///
    /// Returns `Ok(false)` without touching the store unless it is recording. Compression
    /// errors are returned and leave the store unchanged.
    pub fn add_frame(
        &mut self,
        timestamp_ms: u64,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> GlyphcastResult<bool> {
        if self.state != RecordingState::Recording {
            return Ok(false);
        }
        let Some(meta) = self.metadata.as_ref() else {
            return Ok(false);
        };

        let frame = compress(
            pixels,
            width,
            height,
            meta.num_columns,
            meta.charset,
            meta.brightness,
        )?;
        self.timestamps.insert(timestamp_ms, self.frames.len());
        self.frames.push(frame);
        Ok(true)
    }

    /// Stop accepting frames. Captured frames are kept.
    pub fn stop_recording(&mut self) {
        if self.state == RecordingState::Recording {
            tracing::debug!(frames = self.frames.len(), "stop recording");
            self.state = RecordingState::Idle;
        }
    }

    /// Frame shown at `timestamp_ms`, assuming frames were captured exactly
    /// `frame_interval_ms` apart.
    ///
    /// The index is `round(timestamp_ms / frame_interval_ms)` clamped to the stored range,
    /// so times past the end return the last frame. Recorded per-frame timestamps are not
    /// consulted: persisted caches carry no timestamps and are replayed with this rule.
    ///
    /// Decoded caches never carry a 0 ms interval. Metadata built by hand with 0 is
    /// replayed at [`DEFAULT_FRAME_INTERVAL_MS`].
    pub fn frame_at_time(&self, timestamp_ms: f64) -> Option<&CompressedFrame> {
        let last = self.frames.len().checked_sub(1)?;
        let interval = self
            .metadata
            .as_ref()
            .map(|m| m.frame_interval_ms)
            .filter(|&ms| ms > 0)
            .unwrap_or(DEFAULT_FRAME_INTERVAL_MS);
        let pos = (timestamp_ms / f64::from(interval)).round();
        let index = if pos.is_nan() || pos <= 0.0 {
            0
        } else {
            (pos as usize).min(last)
        };
        self.frames.get(index)
    }

    /// Index of the frame recorded at exactly `timestamp_ms` during this session.
    ///
    /// Only populated by [`FrameStore::add_frame`]; loaded caches have no timestamps.
    pub fn recorded_index(&self, timestamp_ms: u64) -> Option<usize> {
        self.timestamps.get(&timestamp_ms).copied()
    }

    /// Empty the store, unset metadata and return to [`RecordingState::Idle`].
    pub fn clear(&mut self) {
        self.frames.clear();
        self.timestamps.clear();
        self.metadata = None;
        self.state = RecordingState::Idle;
    }

    /// Replace all contents with a fully decoded cache and enter
    /// [`RecordingState::Loaded`].
    pub fn apply_decoded(&mut self, decoded: DecodedCache) {
        self.frames = decoded.frames;
        self.timestamps.clear();
        self.metadata = Some(decoded.metadata);
        self.state = RecordingState::Loaded;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Metadata of the current recording or loaded cache.
    pub fn metadata(&self) -> Option<&CacheMetadata> {
        self.metadata.as_ref()
    }

    /// Frames in temporal order.
    pub fn frames(&self) -> &[CompressedFrame] {
        &self.frames
    }

    /// Number of stored frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Bytes held by frame cell data.
    pub fn memory_usage_bytes(&self) -> usize {
        self.frames.iter().map(|f| f.data.len()).sum()
    }

    /// `true` while frames are being accepted.
    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    /// `true` when no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/frame_store.rs"]
mod tests;
