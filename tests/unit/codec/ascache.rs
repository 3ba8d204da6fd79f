use super::*;
use crate::foundation::settings::ConvertSettings;

fn metadata() -> CacheMetadata {
    CacheMetadata {
        video_id: "clip".to_string(),
        num_columns: 80,
        brightness: 1.25,
        charset: Charset::Blocks,
        frame_interval_ms: 50,
    }
}

fn frame(width: u32, height: u32, seed: u8) -> CompressedFrame {
    let data = (0..width * height * 4)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    CompressedFrame::new(data, width, height).unwrap()
}

#[test]
fn header_bytes_are_exact() {
    let bytes = encode(&metadata(), &[frame(2, 1, 0)]).unwrap();
    assert_eq!(
        &bytes[..HEADER_LEN],
        &[
            0x41, 0x53, 0x43, 0x00, // magic
            1,    // version
            0, 80, // columns
            0, 125, // brightness * 100
            2,   // charset ordinal
            0, 50, // interval
            0, 0, 0, 1, // frame count
        ]
    );
    assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + FRAME_HEADER_LEN], &[0, 2, 0, 1, 0, 0, 0, 8]);
    assert_eq!(bytes.len(), HEADER_LEN + FRAME_HEADER_LEN + 8);
}

#[test]
fn round_trip_preserves_metadata_and_frames() {
    for count in 0..4u8 {
        let frames: Vec<_> = (0..count)
            .map(|i| frame(3 + u32::from(i), 1 + u32::from(i) * 2, i))
            .collect();
        let bytes = encode(&metadata(), &frames).unwrap();
        let decoded = decode("clip", &bytes).unwrap();
        assert_eq!(decoded.metadata, metadata());
        assert_eq!(decoded.frames, frames);
    }
}

#[test]
fn round_trip_through_a_recorded_store() {
    let mut store = FrameStore::new();
    let settings = ConvertSettings {
        num_columns: 12,
        brightness: 0.8,
        charset: Charset::Detailed,
        frame_interval_ms: 40,
    };
    store.start_recording(CacheMetadata::new("rec", &settings));
    for v in [0u8, 90, 200] {
        let img = crate::foundation::core::PixelBuffer::solid(48, 20, [v, v / 2, 255 - v, 255]);
        store.add_frame(u64::from(v), &img.data, 48, 20).unwrap();
    }
    store.stop_recording();

    let bytes = encode_store(&store).unwrap();
    let decoded = decode("rec", &bytes).unwrap();
    assert_eq!(Some(&decoded.metadata), store.metadata());
    assert_eq!(decoded.frames.as_slice(), store.frames());
}

#[test]
fn encode_store_without_metadata_fails() {
    let err = encode_store(&FrameStore::new()).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
}

#[test]
fn encode_rejects_oversized_frames() {
    let wide = CompressedFrame {
        data: vec![0; 70_000 * 4],
        width: 70_000,
        height: 1,
    };
    let err = encode(&metadata(), &[wide]).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
}

#[test]
fn wrong_magic_is_corrupt() {
    let mut bytes = encode(&metadata(), &[frame(2, 2, 1)]).unwrap();
    bytes[0] = b'X';
    let err = decode("clip", &bytes).unwrap_err();
    assert!(matches!(err, GlyphcastError::CorruptCache(_)));
}

#[test]
fn unknown_version_is_reported() {
    let mut bytes = encode(&metadata(), &[]).unwrap();
    bytes[4] = 2;
    let err = decode("clip", &bytes).unwrap_err();
    assert!(matches!(err, GlyphcastError::UnsupportedVersion(2)));
}

#[test]
fn truncation_anywhere_is_corrupt() {
    let bytes = encode(&metadata(), &[frame(3, 2, 0), frame(1, 1, 9)]).unwrap();
    for cut in 0..bytes.len() {
        let err = decode("clip", &bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, GlyphcastError::CorruptCache(_)),
            "cut at {cut}: {err}"
        );
    }
}

#[test]
fn frame_count_larger_than_payload_is_corrupt() {
    let mut bytes = encode(&metadata(), &[frame(1, 1, 0)]).unwrap();
    bytes[12..16].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);
    let err = decode("clip", &bytes).unwrap_err();
    assert!(matches!(err, GlyphcastError::CorruptCache(_)));
}

#[test]
fn data_length_mismatch_is_corrupt() {
    let mut bytes = encode(&metadata(), &[frame(2, 2, 0)]).unwrap();
    // data_len 16 -> 12, with the frame still claiming 2x2 cells
    bytes[HEADER_LEN + 7] = 12;
    let err = decode("clip", &bytes).unwrap_err();
    assert!(matches!(err, GlyphcastError::CorruptCache(_)));
}

#[test]
fn zero_frame_interval_is_corrupt() {
    let mut bytes = encode(&metadata(), &[frame(1, 1, 0)]).unwrap();
    bytes[10..12].copy_from_slice(&[0, 0]);
    let err = decode("clip", &bytes).unwrap_err();
    assert!(matches!(err, GlyphcastError::CorruptCache(_)));

    let zero = CacheMetadata {
        frame_interval_ms: 0,
        ..metadata()
    };
    assert!(matches!(
        encode(&zero, &[frame(1, 1, 0)]),
        Err(GlyphcastError::InvalidInput(_))
    ));
}

#[test]
fn unknown_charset_ordinal_falls_back_to_default() {
    let mut bytes = encode(&metadata(), &[]).unwrap();
    bytes[9] = 42;
    let decoded = decode("clip", &bytes).unwrap();
    assert_eq!(decoded.metadata.charset, Charset::Standard);
}

#[test]
fn trailing_bytes_are_ignored() {
    let mut bytes = encode(&metadata(), &[frame(1, 1, 3)]).unwrap();
    bytes.extend_from_slice(&[1, 2, 3]);
    let decoded = decode("clip", &bytes).unwrap();
    assert_eq!(decoded.frames.len(), 1);
}

#[test]
fn peek_reads_columns_and_frame_count() {
    let bytes = encode(&metadata(), &[frame(1, 1, 0), frame(1, 1, 1)]).unwrap();
    assert_eq!(
        peek_header(&bytes[..HEADER_LEN]),
        HeaderPeek {
            num_columns: 80,
            frame_count: 2,
        }
    );
    assert_eq!(peek_header(&bytes).frame_count, 2);
}

#[test]
fn peek_tolerates_garbage() {
    assert_eq!(peek_header(&[]), HeaderPeek::default());
    assert_eq!(peek_header(&[0x41, 0x53, 0x43]), HeaderPeek::default());
    assert_eq!(peek_header(&[0u8; 16]), HeaderPeek::default());
}
