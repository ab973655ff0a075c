//! Scaling and change tracking for the RGBA path.
//!
//! Each render query maps the held [`InputBitmap`]s from source coordinates
//! onto the current display area and reports, through two counters, whether
//! the renderer has to re-upload pixels (content id) or only move what it
//! already has (position id).

use image::RgbaImage;

use crate::bitmap::InputBitmap;

/// Borders around the video inside the display area, in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    /// Left border.
    pub left: i32,
    /// Right border.
    pub right: i32,
    /// Top border.
    pub top: i32,
    /// Bottom border.
    pub bottom: i32,
}

/// The surface subtitles are composited onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayArea {
    /// Total width in pixels, margins included.
    pub width: i32,
    /// Total height in pixels, margins included.
    pub height: i32,
    /// Borders around the video.
    pub margins: Margins,
}

impl DisplayArea {
    /// A display area without margins.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            margins: Margins::default(),
        }
    }

    /// Set the margins.
    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Width available to the video.
    pub fn video_width(&self) -> i32 {
        self.width - self.margins.left - self.margins.right
    }

    /// Height available to the video.
    pub fn video_height(&self) -> i32 {
        self.height - self.margins.top - self.margins.bottom
    }
}

/// Source-to-display scale factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    /// Horizontal factor.
    pub x: f64,
    /// Vertical factor.
    pub y: f64,
}

impl Scale {
    /// Factors mapping a `source` frame onto the video part of `area`.
    ///
    /// A zero source dimension is treated as 1.
    pub fn between(source: (u32, u32), area: &DisplayArea) -> Self {
        Self {
            x: f64::from(area.video_width()) / f64::from(source.0.max(1)),
            y: f64::from(area.video_height()) / f64::from(source.1.max(1)),
        }
    }

    /// Returns `true` unless both factors are exactly 1.
    pub fn is_scaled(&self) -> bool {
        self.x != 1.0 || self.y != 1.0
    }
}

/// Where one bitmap lands on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Left edge, display pixels.
    pub x: i32,
    /// Top edge, display pixels.
    pub y: i32,
    /// Width to draw at.
    pub display_width: i32,
    /// Height to draw at.
    pub display_height: i32,
}

impl Placement {
    /// Scale `bitmap` into `area`.
    pub fn of(bitmap: &InputBitmap, scale: Scale, area: &DisplayArea) -> Self {
        Self {
            x: (f64::from(bitmap.x) * scale.x).round() as i32 + area.margins.left,
            y: (f64::from(bitmap.y) * scale.y).round() as i32 + area.margins.top,
            display_width: (f64::from(bitmap.width) * scale.x).round() as i32,
            display_height: (f64::from(bitmap.height) * scale.y).round() as i32,
        }
    }
}

/// Returns `true` if any placement differs. Different lengths count as a
/// change.
pub fn placements_changed(previous: &[Placement], current: &[Placement]) -> bool {
    previous != current
}

/// The content/position counter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeState {
    /// Bumped when the renderer must upload new pixels.
    pub content_id: u64,
    /// Bumped whenever anything visible changed, position included.
    pub position_id: u64,
}

impl ChangeState {
    /// The next state given what changed since the last query.
    ///
    /// New content moves both counters to the same fresh value; a pure
    /// position change only bumps `position_id`.
    #[must_use]
    pub fn advance(self, content_changed: bool, position_changed: bool) -> Self {
        if content_changed {
            let id = self.position_id + 1;
            Self {
                content_id: id,
                position_id: id,
            }
        } else if position_changed {
            Self {
                position_id: self.position_id + 1,
                ..self
            }
        } else {
            self
        }
    }
}

/// Pixel layout of [`SubBitmaps::parts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitmapFormat {
    /// Nothing to draw on the RGBA path.
    #[default]
    Empty,
    /// Straight-alpha RGBA, 4 bytes per pixel.
    Rgba,
}

/// One part ready for compositing. Borrows the track's pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBitmap<'a> {
    /// Left edge, display pixels.
    pub x: i32,
    /// Top edge, display pixels.
    pub y: i32,
    /// Width to draw at.
    pub display_width: i32,
    /// Height to draw at.
    pub display_height: i32,
    /// Source width of `pixels`.
    pub width: u32,
    /// Source height of `pixels`.
    pub height: u32,
    /// Packed RGBA, `width * 4` bytes per row.
    pub pixels: &'a [u8],
}

impl OutputBitmap<'_> {
    /// Row stride of `pixels` in bytes.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Copy the unscaled pixels into an [`RgbaImage`].
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.to_vec())
    }
}

/// Result of a render query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubBitmaps<'a> {
    /// Parts in decoder order.
    pub parts: Vec<OutputBitmap<'a>>,
    /// Pixel layout of `parts`.
    pub format: BitmapFormat,
    /// See [`ChangeState::content_id`].
    pub content_id: u64,
    /// See [`ChangeState::position_id`].
    pub position_id: u64,
    /// Whether parts are drawn at a size other than their source size.
    pub scaled: bool,
}

impl SubBitmaps<'_> {
    /// Returns `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Remembers the previous query's placements and the change counters.
#[derive(Debug, Clone, Default)]
pub struct LayoutTracker {
    placements: Vec<Placement>,
    content_changed: bool,
    ids: ChangeState,
}

impl LayoutTracker {
    /// A tracker with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the held bitmaps were replaced or cleared.
    pub fn mark_content_changed(&mut self) {
        self.content_changed = true;
        self.placements.clear();
    }

    /// Current counters.
    pub fn ids(&self) -> ChangeState {
        self.ids
    }

    /// Placements computed by the last [`layout`](LayoutTracker::layout).
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// The counters as seen by a query that produces no RGBA output.
    pub fn empty(&self) -> SubBitmaps<'static> {
        SubBitmaps {
            content_id: self.ids.content_id,
            position_id: self.ids.position_id,
            ..SubBitmaps::default()
        }
    }

    /// Place `inputs` (authored for a `source` sized frame) onto `area` and
    /// advance the counters.
    pub fn layout<'a>(
        &mut self,
        inputs: &'a [InputBitmap],
        source: (u32, u32),
        area: &DisplayArea,
    ) -> SubBitmaps<'a> {
        let scale = Scale::between(source, area);
        let placements: Vec<Placement> = inputs
            .iter()
            .map(|bitmap| Placement::of(bitmap, scale, area))
            .collect();

        let position_changed = placements_changed(&self.placements, &placements);
        self.ids = self.ids.advance(self.content_changed, position_changed);
        self.content_changed = false;
        self.placements = placements;

        let parts = inputs
            .iter()
            .zip(&self.placements)
            .map(|(bitmap, placement)| OutputBitmap {
                x: placement.x,
                y: placement.y,
                display_width: placement.display_width,
                display_height: placement.display_height,
                width: bitmap.width,
                height: bitmap.height,
                pixels: &bitmap.pixels,
            })
            .collect();

        SubBitmaps {
            parts,
            format: BitmapFormat::Rgba,
            content_id: self.ids.content_id,
            position_id: self.ids.position_id,
            scaled: scale.is_scaled(),
        }
    }
}
