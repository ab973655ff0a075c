//! Palette expansion tests.

mod common;

use subpix::bitmap::{convert_frame, convert_rect, expand_palette};
use subpix::{IndexPlane, Palette, RawRect, RectContent, Rgba, SubtitleError};

use common::{BLUE, GREEN, RED, frame, palette_rect, text_rect};

fn pixel(buffer: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
    let offset = (y * width + x) * 4;
    [
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ]
}

#[test]
fn expands_every_pixel_through_the_palette() {
    // 3x2 image, rows padded to 5 bytes with indices that are not in the
    // palette.
    let indices = [0, 1, 2, 9, 9, 2, 1, 0, 9, 9];
    let palette = Palette::from_colors(&[RED, GREEN, BLUE]);
    let plane = IndexPlane::new(&indices, 3, 2, 5).expect("Plane should be valid");

    let rgba = expand_palette(&plane, &palette);

    let mut expected = Vec::new();
    for color in [RED, GREEN, BLUE, BLUE, GREEN, RED] {
        expected.extend_from_slice(&color.to_bytes());
    }
    assert_eq!(rgba, expected);
}

#[test]
fn converted_rect_matches_palette_lookup() {
    let rect = palette_rect(10, 20, 4, 3);
    let bitmap = convert_rect(0, &rect).expect("Palette rect should convert");

    assert_eq!((bitmap.x, bitmap.y, bitmap.width, bitmap.height), (10, 20, 4, 3));
    assert_eq!(bitmap.pixels.len(), 4 * 3 * 4);
    assert_eq!(bitmap.stride(), 16);
    for y in 0..3 {
        for x in 0..4 {
            let expected = if x == y { GREEN } else { RED };
            assert_eq!(pixel(&bitmap.pixels, 4, x, y), expected.to_bytes(), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn last_row_does_not_need_padding() {
    let indices = [1, 1, 0xFF, 0xFF, 0, 0];
    let plane = IndexPlane::new(&indices, 2, 2, 4).expect("Unpadded last row is valid");
    assert_eq!(plane.row(1), Some(&[0u8, 0][..]));
    assert_eq!(plane.get(1, 0), Some(1));
    assert_eq!(plane.get(2, 0), None);
    assert_eq!(plane.row(2), None);
    assert_eq!(plane.rows().count(), 2);
}

#[test]
fn index_plane_rejects_short_buffer() {
    let indices = [0u8; 7];
    let result = IndexPlane::new(&indices, 4, 2, 4);
    assert!(result.is_err());
}

#[test]
fn index_plane_rejects_stride_below_width() {
    let indices = [0u8; 64];
    let result = IndexPlane::new(&indices, 8, 2, 4);
    let reason = result.expect_err("Stride below width must fail");
    assert!(reason.contains("stride"), "Unexpected reason: {reason}");
}

#[test]
fn indices_past_the_palette_are_transparent() {
    let indices = [0, 200];
    let palette = Palette::from_colors(&[RED]);
    let plane = IndexPlane::new(&indices, 2, 1, 2).expect("Plane should be valid");

    let rgba = expand_palette(&plane, &palette);
    assert_eq!(&rgba[..4], &RED.to_bytes());
    assert_eq!(&rgba[4..], &Rgba::TRANSPARENT.to_bytes());
}

#[test]
fn malformed_rect_is_rejected() {
    let rect = RawRect {
        x: 0,
        y: 0,
        width: 16,
        height: 16,
        content: RectContent::PaletteBitmap {
            indices: vec![0; 32],
            stride: 16,
            palette: Palette::from_colors(&[RED]),
        },
    };
    let error = convert_rect(3, &rect).expect_err("Short plane must fail");
    assert!(matches!(error, SubtitleError::MalformedRectangle { index: 3, .. }));
}

#[test]
fn unsupported_rect_drops_the_whole_frame() {
    let frame = frame(vec![palette_rect(0, 0, 2, 2), text_rect()], 0, 0);
    let error = convert_frame(&frame).expect_err("Text rect must fail");
    match error {
        SubtitleError::UnsupportedRectangle { index, kind } => {
            assert_eq!(index, 1);
            assert_eq!(kind, "text");
        }
        other => panic!("Unexpected error: {other}"),
    }
}

#[test]
fn empty_rect_converts_to_empty_buffer() {
    let rect = RawRect {
        x: 5,
        y: 5,
        width: 0,
        height: 0,
        content: RectContent::PaletteBitmap {
            indices: Vec::new(),
            stride: 0,
            palette: Palette::new(),
        },
    };
    let bitmap = convert_rect(0, &rect).expect("Empty rect should convert");
    assert!(bitmap.pixels.is_empty());
}

#[test]
fn palette_unpacks_native_argb_words() {
    let mut plane = Vec::new();
    plane.extend_from_slice(&0x80FF_0000_u32.to_ne_bytes());
    plane.extend_from_slice(&0xFF00_FF00_u32.to_ne_bytes());

    let palette = Palette::from_argb_plane(&plane, 2).expect("Plane holds two words");
    assert_eq!(palette.len(), 2);
    assert_eq!(palette.get(0), Rgba::new(255, 0, 0, 128));
    assert_eq!(palette.get(1), Rgba::new(0, 255, 0, 255));
    assert_eq!(palette.get(2), Rgba::TRANSPARENT);

    assert!(Palette::from_argb_plane(&plane, 3).is_none());
}

#[test]
fn palette_caps_at_256_entries() {
    let colors = vec![RED; 300];
    let palette = Palette::from_colors(&colors);
    assert_eq!(palette.len(), 256);
    assert_eq!(palette.get(255), RED);
}
