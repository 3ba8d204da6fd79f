//! `.ascache` binary format.
//!
//! ```text
//! magic u32 "ASC\0" | version u8 | num_columns u16 | brightness*100 u16 |
//! charset_index u8 | frame_interval_ms u16 | frame_count u32
//! frame_count x ( width u16 | height u16 | data_len u32 | data )
//! ```
//!
//! All integers are unsigned big-endian. The video id is not stored; it is the file name.

use crate::{
    codec::schema::{
        BeReader, BeWriter, FRAME_FIELDS, FRAME_HEADER_LEN, HEADER_FIELDS, HEADER_LEN, header,
    },
    compress::frame::CompressedFrame,
    foundation::core::rgba_len,
    foundation::error::{GlyphcastError, GlyphcastResult},
    glyph::charset::Charset,
    store::frame_store::{CacheMetadata, FrameStore},
};

/// `"ASC\0"` read as a big-endian `u32`.
pub const MAGIC: u32 = 0x4153_4300;
/// The only format version this build reads and writes.
pub const FORMAT_VERSION: u8 = 1;
/// File extension for persisted caches, without the dot.
pub const FILE_EXTENSION: &str = "ascache";

/// Fully decoded cache contents.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedCache {
    /// Header metadata, with the caller-supplied video id.
    pub metadata: CacheMetadata,
    /// Frames in file order.
    pub frames: Vec<CompressedFrame>,
}

/// Fields recovered from the first [`HEADER_LEN`] bytes of a cache file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeaderPeek {
    /// Glyph columns per frame.
    pub num_columns: u32,
    /// Number of frames in the file.
    pub frame_count: u32,
}

/// Serialize metadata and frames.
///
/// Fails with `InvalidInput` if any value does not fit its field (for example a frame
/// wider than 65535 cells) or a frame's data length disagrees with its dimensions.
pub fn encode(metadata: &CacheMetadata, frames: &[CompressedFrame]) -> GlyphcastResult<Vec<u8>> {
    let brightness_centi = (metadata.brightness * 100.0).round();
    if !brightness_centi.is_finite() || brightness_centi < 0.0 {
        return Err(GlyphcastError::invalid_input(format!(
            "brightness {} cannot be stored",
            metadata.brightness
        )));
    }

    if metadata.frame_interval_ms == 0 {
        return Err(GlyphcastError::invalid_input("frame interval must be at least 1 ms"));
    }

    let capacity = HEADER_LEN
        + frames
            .iter()
            .map(|f| FRAME_HEADER_LEN + f.data.len())
            .sum::<usize>();
    let mut w = BeWriter::with_capacity(capacity);
    w.put_record(
        &HEADER_FIELDS,
        &[
            u64::from(MAGIC),
            u64::from(FORMAT_VERSION),
            u64::from(metadata.num_columns),
            brightness_centi as u64,
            u64::from(metadata.charset.index()),
            u64::from(metadata.frame_interval_ms),
            frames.len() as u64,
        ],
    )?;

    for (i, frame) in frames.iter().enumerate() {
        if frame.data.len() != rgba_len(frame.width, frame.height)? {
            return Err(GlyphcastError::invalid_input(format!(
                "frame {i}: {} data bytes for {}x{} cells",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        w.put_record(
            &FRAME_FIELDS,
            &[
                u64::from(frame.width),
                u64::from(frame.height),
                frame.data.len() as u64,
            ],
        )?;
        w.put_bytes(&frame.data);
    }

    Ok(w.into_inner())
}

/// Serialize a store's metadata and frames.
pub fn encode_store(store: &FrameStore) -> GlyphcastResult<Vec<u8>> {
    let metadata = store
        .metadata()
        .ok_or_else(|| GlyphcastError::invalid_input("store has no recording metadata"))?;
    encode(metadata, store.frames())
}

/// Parse a complete cache file.
///
/// Either every frame decodes or an error is returned; there is no partial result. Wrong
/// magic, a zero frame interval, truncation and length mismatches are `CorruptCache`; a
/// version other than [`FORMAT_VERSION`] is `UnsupportedVersion`.
pub fn decode(video_id: &str, bytes: &[u8]) -> GlyphcastResult<DecodedCache> {
    let mut r = BeReader::new(bytes);

    let magic = r.get(&HEADER_FIELDS[header::MAGIC])?;
    if magic != u64::from(MAGIC) {
        return Err(GlyphcastError::corrupt(format!(
            "bad magic {magic:#010x}, expected {MAGIC:#010x}"
        )));
    }
    let version = r.get(&HEADER_FIELDS[header::VERSION])?;
    if version != u64::from(FORMAT_VERSION) {
        return Err(GlyphcastError::UnsupportedVersion(version as u8));
    }

    let mut fields = [0u64; HEADER_FIELDS.len()];
    for (i, f) in HEADER_FIELDS.iter().enumerate().skip(header::NUM_COLUMNS) {
        fields[i] = r.get(f)?;
    }

    if fields[header::FRAME_INTERVAL_MS] == 0 {
        return Err(GlyphcastError::corrupt("frame interval of 0 ms"));
    }

    let charset_index = fields[header::CHARSET_INDEX] as u8;
    let charset = Charset::from_index_checked(charset_index).unwrap_or_else(|| {
        tracing::warn!(
            video_id,
            charset_index,
            "unknown charset ordinal, using default charset"
        );
        Charset::default()
    });
    let metadata = CacheMetadata {
        video_id: video_id.to_string(),
        num_columns: fields[header::NUM_COLUMNS] as u32,
        brightness: fields[header::BRIGHTNESS_CENTI] as f64 / 100.0,
        charset,
        frame_interval_ms: fields[header::FRAME_INTERVAL_MS] as u32,
    };

    let frame_count = fields[header::FRAME_COUNT] as usize;
    let mut frames = Vec::with_capacity(frame_count.min(r.remaining() / FRAME_HEADER_LEN));
    for i in 0..frame_count {
        let [width, height, data_len] = r.read_record(&FRAME_FIELDS)?;
        let (width, height) = (width as u32, height as u32);
        let expected = rgba_len(width, height)?;
        if data_len as usize != expected {
            return Err(GlyphcastError::corrupt(format!(
                "frame {i}: data length {data_len} does not match {width}x{height} cells"
            )));
        }
        let data = r.take(expected, "frame data")?.to_vec();
        frames.push(CompressedFrame {
            data,
            width,
            height,
        });
    }

    if r.remaining() > 0 {
        tracing::debug!(
            video_id,
            offset = r.offset(),
            trailing = r.remaining(),
            "ignoring trailing bytes after last frame"
        );
    }

    Ok(DecodedCache { metadata, frames })
}

/// Read column and frame counts from the start of a cache file without touching frame
/// data.
///
/// Short input or a wrong magic number yields zero values instead of an error.
pub fn peek_header(prefix: &[u8]) -> HeaderPeek {
    let Some(head) = prefix.get(..HEADER_LEN) else {
        return HeaderPeek::default();
    };
    let mut r = BeReader::new(head);
    match r.read_record(&HEADER_FIELDS) {
        Ok(fields) if fields[header::MAGIC] == u64::from(MAGIC) => HeaderPeek {
            num_columns: fields[header::NUM_COLUMNS] as u32,
            frame_count: fields[header::FRAME_COUNT] as u32,
        },
        _ => HeaderPeek::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/ascache.rs"]
mod tests;
