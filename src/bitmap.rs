//! Palette expansion.
//!
//! Converts the palette-indexed rectangles of a [`RawFrame`] into tightly
//! packed RGBA buffers. Rows in the source index plane may be padded; the
//! padding is skipped via [`IndexPlane`], which checks the declared
//! geometry against the buffer once, up front, so the expansion loop cannot
//! index out of bounds.

use crate::decoder::{RawFrame, RawRect, RectContent};
use crate::error::SubtitleError;
use crate::palette::Palette;

/// A read-only view of an 8-bit index plane with row padding.
#[derive(Debug, Clone, Copy)]
pub struct IndexPlane<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> IndexPlane<'a> {
    /// Validate `data` as a `width` x `height` plane with rows `stride`
    /// bytes apart.
    ///
    /// The last row only needs `width` bytes; trailing padding after it is
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns the reason the geometry does not fit.
    pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self, String> {
        if height > 0 && stride < width {
            return Err(format!("stride {stride} is smaller than width {width}"));
        }
        let required = match height {
            0 => 0,
            rows => stride
                .checked_mul(rows - 1)
                .and_then(|bytes| bytes.checked_add(width))
                .ok_or_else(|| "plane size overflows".to_string())?,
        };
        if data.len() < required {
            return Err(format!(
                "index plane holds {} bytes, {width}x{height} with stride {stride} needs {required}",
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The `width` meaningful bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.stride;
        self.data.get(start..start + self.width)
    }

    /// Index at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x])
    }

    /// Iterate rows top to bottom, padding stripped.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }
}

/// A decoded subtitle region in source coordinates with its RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBitmap {
    /// Left edge in source coordinates.
    pub x: i32,
    /// Top edge in source coordinates.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, R G B A, no row padding.
    pub pixels: Vec<u8>,
}

impl InputBitmap {
    /// Row stride of [`pixels`](InputBitmap::pixels) in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }
}

/// Expand an index plane through `palette` into packed RGBA bytes.
pub fn expand_palette(plane: &IndexPlane<'_>, palette: &Palette) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(plane.width() * plane.height() * 4);
    for row in plane.rows() {
        for &index in row {
            rgba.extend_from_slice(&palette.get(index).to_bytes());
        }
    }
    rgba
}

/// Convert one rectangle. `index` is its position in the frame, for errors.
///
/// # Errors
///
/// - [`SubtitleError::UnsupportedRectangle`] if the rectangle is not a
///   palette bitmap.
/// - [`SubtitleError::MalformedRectangle`] if its buffers do not match its
///   declared size.
pub fn convert_rect(index: usize, rect: &RawRect) -> Result<InputBitmap, SubtitleError> {
    match &rect.content {
        RectContent::PaletteBitmap {
            indices,
            stride,
            palette,
        } => {
            let plane = IndexPlane::new(indices, rect.width as usize, rect.height as usize, *stride)
                .map_err(|reason| SubtitleError::MalformedRectangle { index, reason })?;
            Ok(InputBitmap {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                pixels: expand_palette(&plane, palette),
            })
        }
        RectContent::Unsupported(kind) => Err(SubtitleError::UnsupportedRectangle {
            index,
            kind: (*kind).to_string(),
        }),
    }
}

/// Convert every rectangle of a frame.
///
/// All or nothing: the first failing rectangle discards the whole frame.
///
/// # Errors
///
/// See [`convert_rect`].
pub fn convert_frame(frame: &RawFrame) -> Result<Vec<InputBitmap>, SubtitleError> {
    frame
        .rects
        .iter()
        .enumerate()
        .map(|(index, rect)| convert_rect(index, rect))
        .collect()
}
