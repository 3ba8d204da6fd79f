use std::time::SystemTime;

use crate::{
    cache::directory::{CacheDirectory, CacheFileStat, cache_file_name},
    codec::ascache::{FILE_EXTENSION, decode, encode_store, peek_header},
    codec::schema::HEADER_LEN,
    compress::frame::CompressedFrame,
    foundation::error::{GlyphcastError, GlyphcastResult},
    foundation::settings::ConvertSettings,
    store::frame_store::{CacheMetadata, FrameStore, RecordingState},
};

/// Listing entry for a persisted cache, built from its header alone.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CachedVideoInfo {
    /// Video id as recovered from the file name (sanitized form).
    pub video_id: String,
    /// Human-friendly label derived from the id.
    pub display_name: String,
    /// Size of the cache file.
    pub file_size_bytes: u64,
    /// Frame count from the header; 0 for unreadable headers.
    pub frame_count: u32,
    /// Glyph columns from the header; 0 for unreadable headers.
    pub num_columns: u32,
    /// Last modification time of the file.
    pub modified_at: Option<SystemTime>,
}

/// Recording, playback and persistence of one video's glyph frames.
///
/// Owns a [`FrameStore`] and the [`CacheDirectory`] it persists to. All mutation takes
/// `&mut self`; share it across threads only behind a lock.
#[derive(Debug)]
pub struct FrameCache<D> {
    store: FrameStore,
    dir: D,
}

impl<D: CacheDirectory> FrameCache<D> {
    /// Empty cache persisting into `dir`.
    pub fn new(dir: D) -> Self {
        Self {
            store: FrameStore::new(),
            dir,
        }
    }

    /// Underlying frame store.
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// Underlying cache directory.
    pub fn directory(&self) -> &D {
        &self.dir
    }

    /// Begin a fresh recording of `video_id`, discarding any frames held.
    pub fn start_recording(&mut self, video_id: &str, settings: &ConvertSettings) {
        self.store.start_recording(CacheMetadata::new(video_id, settings));
    }

    /// Compress and append a frame; ignored unless recording.
    pub fn add_frame(
        &mut self,
        timestamp_ms: u64,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> GlyphcastResult<bool> {
        self.store.add_frame(timestamp_ms, pixels, width, height)
    }

    /// Stop recording; frames are kept for saving or playback.
    pub fn stop_recording(&mut self) {
        self.store.stop_recording();
    }

    /// Frame to show at `timestamp_ms` (see [`FrameStore::frame_at_time`]).
    pub fn frame_at_time(&self, timestamp_ms: f64) -> Option<&CompressedFrame> {
        self.store.frame_at_time(timestamp_ms)
    }

    /// Empty the store and unset its metadata.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Persist the current frames under the recording's video id.
    ///
    /// Refused while recording or when there is nothing to save. On failure no file is
    /// created or modified.
    #[tracing::instrument(skip(self), fields(video_id))]
    pub fn save(&self) -> GlyphcastResult<()> {
        if self.store.state() == RecordingState::Recording {
            return Err(GlyphcastError::invalid_input(
                "stop recording before saving the cache",
            ));
        }
        if self.store.is_empty() {
            return Err(GlyphcastError::invalid_input("no frames to save"));
        }
        let metadata = self
            .store
            .metadata()
            .ok_or_else(|| GlyphcastError::invalid_input("store has no recording metadata"))?;
        tracing::Span::current().record("video_id", metadata.video_id.as_str());

        let bytes = encode_store(&self.store)?;
        self.dir.write(&cache_file_name(&metadata.video_id), &bytes)?;
        tracing::info!(
            frames = self.store.frame_count(),
            bytes = bytes.len(),
            "saved cache"
        );
        Ok(())
    }

    /// [`FrameCache::save`] reporting success as a bool; failures are logged.
    pub fn save_to_disk(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "save cache failed");
                false
            }
        }
    }

    /// Replace the store contents with the persisted cache of `video_id`.
    ///
    /// The file is fully decoded before anything is replaced, so on error the previous
    /// frames and metadata are still in place.
    #[tracing::instrument(skip(self))]
    pub fn load(&mut self, video_id: &str) -> GlyphcastResult<()> {
        let bytes = self.dir.read(&cache_file_name(video_id))?;
        let decoded = decode(video_id, &bytes)?;
        tracing::info!(frames = decoded.frames.len(), "loaded cache");
        self.store.apply_decoded(decoded);
        Ok(())
    }

    /// [`FrameCache::load`] reporting success as a bool; failures are logged.
    pub fn load_from_disk(&mut self, video_id: &str) -> bool {
        match self.load(video_id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(video_id, error = %e, "load cache failed");
                false
            }
        }
    }

    /// `true` if a cache for `video_id` is stored.
    pub fn cache_exists(&self, video_id: &str) -> bool {
        self.dir.exists(&cache_file_name(video_id))
    }

    /// Remove the stored cache of `video_id`. `Ok(false)` if there was none.
    pub fn delete(&self, video_id: &str) -> GlyphcastResult<bool> {
        self.dir.delete(&cache_file_name(video_id))
    }

    /// [`FrameCache::delete`] as a bool; `false` if nothing was deleted or deletion failed.
    pub fn delete_cache(&self, video_id: &str) -> bool {
        match self.delete(video_id) {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(video_id, error = %e, "delete cache failed");
                false
            }
        }
    }

    /// Summaries of every stored cache, newest first, read from file headers only.
    ///
    /// Files whose header or metadata cannot be read are listed with zero values.
    pub fn list_cached_videos_with_info(&self) -> GlyphcastResult<Vec<CachedVideoInfo>> {
        let mut out = Vec::new();
        for file_name in self.dir.list()? {
            let stat = self.dir.stat(&file_name).unwrap_or_else(|e| {
                tracing::debug!(
                    file_name = %file_name,
                    error = %e,
                    "cannot stat cache file, listing with zero size"
                );
                CacheFileStat::default()
            });
            let peek = self
                .dir
                .read_prefix(&file_name, HEADER_LEN)
                .map(|prefix| peek_header(&prefix))
                .unwrap_or_default();
            let video_id = file_name
                .strip_suffix(&format!(".{FILE_EXTENSION}"))
                .unwrap_or(&file_name)
                .to_string();
            out.push(CachedVideoInfo {
                display_name: display_name(&video_id),
                video_id,
                file_size_bytes: stat.size_bytes,
                frame_count: peek.frame_count,
                num_columns: peek.num_columns,
                modified_at: stat.modified,
            });
        }
        out.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        Ok(out)
    }

    /// Number of stored frames.
    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    /// Bytes held by frame cell data.
    pub fn memory_usage_bytes(&self) -> usize {
        self.store.memory_usage_bytes()
    }

    /// `true` while recording.
    pub fn is_recording(&self) -> bool {
        self.store.is_recording()
    }

    /// `true` when no frames are held.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn display_name(video_id: &str) -> String {
    let stem = video_id
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && ext.len() <= 4)
        .map_or(video_id, |(stem, _)| stem);
    stem.replace('_', " ").trim().to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/cache/frame_cache.rs"]
mod tests;
