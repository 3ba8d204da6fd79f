use super::*;
use crate::foundation::core::PixelBuffer;

fn gradient(width: u32, height: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 7 % 256) as u8, (y * 3 % 256) as u8, 40, 255]);
        }
    }
    PixelBuffer::new(width, height, data).unwrap()
}

#[test]
fn portrait_scenario_black_and_white() {
    let black = PixelBuffer::solid(320, 480, [0, 0, 0, 255]);
    let frame = compress(&black.data, 320, 480, 80, Charset::Standard, 1.0).unwrap();
    assert_eq!(frame.width, 80);
    assert_eq!(frame.height, 60);
    assert_eq!(frame.data.len(), 80 * 60 * 4);
    assert!(frame.data.chunks_exact(4).all(|c| c == [0, 0, 0, 0]));

    let white = PixelBuffer::solid(320, 480, [255, 255, 255, 255]);
    let frame = compress(&white.data, 320, 480, 80, Charset::Standard, 1.0).unwrap();
    assert!(frame.data.chunks_exact(4).all(|c| c == [9, 255, 255, 255]));
}

#[test]
fn compress_is_deterministic() {
    let img = gradient(97, 41);
    let a = compress(&img.data, 97, 41, 33, Charset::Detailed, 1.3).unwrap();
    let b = compress(&img.data, 97, 41, 33, Charset::Detailed, 1.3).unwrap();
    assert_eq!(a, b);
}

#[test]
fn zero_dimensions_are_rejected() {
    let err = compress(&[], 0, 10, 8, Charset::Standard, 1.0).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
    let err = compress(&[], 10, 0, 8, Charset::Standard, 1.0).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
}

#[test]
fn short_pixel_buffer_is_rejected() {
    let err = compress(&[0u8; 12], 2, 2, 2, Charset::Standard, 1.0).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));
}

#[test]
fn very_wide_image_keeps_one_row() {
    let (cols, rows) = grid_size(1000, 10, 20).unwrap();
    assert_eq!((cols, rows), (20, 1));
}

#[test]
fn grids_too_large_for_the_cache_are_rejected() {
    // 1x140 at 1024 columns would need 71680 rows.
    let tall = PixelBuffer::solid(1, 140, [255, 255, 255, 255]);
    let err = compress(&tall.data, 1, 140, 1024, Charset::Standard, 1.0).unwrap_err();
    assert!(matches!(err, GlyphcastError::InvalidInput(_)));

    assert!(matches!(
        grid_size(100, 100, MAX_GRID_SIDE + 1),
        Err(GlyphcastError::InvalidInput(_))
    ));
    let (_, rows) = grid_size(1, 2, 4).unwrap();
    assert_eq!(rows, 4);
}

#[test]
fn zero_columns_clamp_to_one() {
    let img = PixelBuffer::solid(4, 4, [10, 20, 30, 255]);
    let frame = compress(&img.data, 4, 4, 0, Charset::Standard, 1.0).unwrap();
    assert_eq!(frame.width, 1);
    assert_eq!(frame.height, 1);
}

#[test]
fn cells_sample_the_center_pixel() {
    // 4x2 image, 4 columns -> aspect 2 -> rows = round(4 / 2 / 2) = 1.
    let mut data = Vec::new();
    for y in 0..2u8 {
        for x in 0..4u8 {
            data.extend_from_slice(&[x * 10, y * 100, 7, 255]);
        }
    }
    let frame = compress(&data, 4, 2, 4, Charset::Standard, 1.0).unwrap();
    assert_eq!((frame.width, frame.height), (4, 1));
    // cell_w = 1: col c samples x = round(c + 0.5); cell_h = 2: y = round(1.0) = 1.
    let xs: Vec<u8> = (0..4).map(|c| frame.cell(0, c).unwrap().rgb[0]).collect();
    assert_eq!(xs, vec![10, 20, 30, 30]);
    assert!((0..4).all(|c| frame.cell(0, c).unwrap().rgb[1] == 100));
    assert_eq!(frame.cell(1, 0), None);
}

#[test]
fn glyph_indices_stay_inside_the_ramp() {
    let img = gradient(64, 64);
    for charset in Charset::ALL {
        let n = resolve(charset).len();
        let frame = compress(&img.data, 64, 64, 16, charset, 2.0).unwrap();
        assert!(frame.data.chunks_exact(4).all(|c| usize::from(c[0]) < n));
    }
}

#[test]
fn compressed_frame_new_checks_length() {
    assert!(CompressedFrame::new(vec![0; 8], 2, 1).is_ok());
    assert!(CompressedFrame::new(vec![0; 7], 2, 1).is_err());
}
