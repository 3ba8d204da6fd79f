//! glyphcast converts raw RGBA video frames into colored glyph grids ("ASCII art") and
//! persists the converted sequence in a compact `.ascache` binary file for replay.
//!
//! # Pipeline overview
//!
//! 1. **Capture**: a [`FrameSource`] yields RGBA8 frames on a fixed cadence
//!    (image sequences, or videos through the system `ffmpeg` with `media-ffmpeg`).
//! 2. **Compress**: each frame is sampled onto a glyph grid by [`compress`], keeping one
//!    `[glyph_index, r, g, b]` cell per glyph.
//! 3. **Record**: a [`FrameStore`] keeps the frames in temporal order behind an explicit
//!    [`RecordingState`] machine.
//! 4. **Persist**: [`FrameCache`] encodes the store with [`encode`] and writes it through a
//!    [`CacheDirectory`]; loading reverses the path and installs the frames only when the
//!    whole file decodes.
//!
//! Replay looks frames up by time with [`FrameCache::frame_at_time`] and renders them with
//! [`render_text`] or [`render_ansi`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod cache;
mod capture;
mod codec;
mod compress;
mod foundation;
mod glyph;
mod pipeline;
mod render;
mod store;

pub use cache::directory::{
    CacheDirectory, CacheFileStat, FsCacheDirectory, cache_file_name, sanitize_video_id,
};
pub use cache::frame_cache::{CachedVideoInfo, FrameCache};
pub use capture::media::{FfmpegFrameSource, VideoSourceInfo, probe_video};
pub use capture::source::{
    CapturedFrame, FixedCadence, FrameSource, ImageSequenceSource, MemoryFrameSource,
};
pub use codec::ascache::{
    DecodedCache, FILE_EXTENSION, FORMAT_VERSION, HeaderPeek, MAGIC, decode, encode,
    encode_store, peek_header,
};
pub use codec::schema::{FRAME_HEADER_LEN, HEADER_LEN};
pub use compress::frame::{
    BYTES_PER_CELL, Cell, CompressedFrame, MAX_GRID_SIDE, compress, grid_size,
};
pub use foundation::core::PixelBuffer;
pub use foundation::error::{GlyphcastError, GlyphcastResult};
pub use foundation::settings::{
    ConvertSettings, DEFAULT_COLUMNS, DEFAULT_FRAME_INTERVAL_MS, MAX_COLUMNS,
};
pub use glyph::charset::{Charset, GlyphSet, resolve};
pub use glyph::luma::{MAX_BRIGHTNESS, map_luma_to_index, map_pixel};
pub use pipeline::batch::{
    BatchJob, BatchOptions, BatchReport, JobOutcome, RecordStats, SourceOpener, convert_batch,
    record_from_source,
};
pub use render::text::{render_ansi, render_text};
pub use store::frame_store::{CacheMetadata, FrameStore, RecordingState};
