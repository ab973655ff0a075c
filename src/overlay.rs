//! Legacy paletted overlay bridge.
//!
//! Renderers without RGBA support, and stream types whose geometry cannot be
//! mapped reliably, go through an older overlay that takes palette + index
//! data directly and does its own blending and scaling. That overlay is long
//! lived and shared by every subtitle track: [`OverlayHandle`] is the single
//! creation site, cloned into each track, which instantiates the overlay
//! through its factory the first time a track needs it.

use std::cell::RefCell;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::rc::Rc;

use crate::bitmap::IndexPlane;
use crate::decoder::{RawRect, RectContent};
use crate::error::SubtitleError;
use crate::palette::Palette;
use crate::timing::ValidityWindow;

/// A palette-indexed image, as handed to the legacy overlay.
#[derive(Debug, Clone, Copy)]
pub struct PalettedImage<'a> {
    /// Left edge in source coordinates.
    pub x: i32,
    /// Top edge in source coordinates.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row stride of `indices` in bytes.
    pub stride: usize,
    /// Index plane, at least `stride * (height - 1) + width` bytes.
    pub indices: &'a [u8],
    /// Colour lookup table.
    pub palette: &'a Palette,
}

/// One command for the legacy overlay.
#[derive(Debug, Clone, Copy)]
pub enum OverlayUpdate<'a> {
    /// Display `image` during `window`.
    Show {
        /// Image to show.
        image: PalettedImage<'a>,
        /// When to show it.
        window: ValidityWindow,
    },
    /// Remove whatever is shown, effective at `window`.
    Clear {
        /// Timing of the clear.
        window: ValidityWindow,
    },
}

/// The push interface of a legacy paletted overlay renderer.
pub trait PalettedOverlay {
    /// Replace the overlay's content.
    fn update(&mut self, update: OverlayUpdate<'_>);
}

type OverlayFactory = Box<dyn FnMut(u32, u32) -> Box<dyn PalettedOverlay>>;

struct OverlaySlot {
    overlay: Option<Box<dyn PalettedOverlay>>,
    factory: OverlayFactory,
    redraw_pending: bool,
}

/// Shared, lazily created legacy overlay.
///
/// Cloning the handle shares the same overlay.
#[derive(Clone)]
pub struct OverlayHandle {
    slot: Rc<RefCell<OverlaySlot>>,
}

impl OverlayHandle {
    /// Create a handle. `factory` receives the source frame size and is
    /// called at most once.
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut(u32, u32) -> Box<dyn PalettedOverlay> + 'static,
    {
        Self {
            slot: Rc::new(RefCell::new(OverlaySlot {
                overlay: None,
                factory: Box::new(factory),
                redraw_pending: false,
            })),
        }
    }

    /// Returns `true` once the overlay has been instantiated.
    pub fn is_created(&self) -> bool {
        self.slot.borrow().overlay.is_some()
    }

    /// Returns `true` if the overlay changed since the last call.
    pub fn take_redraw_request(&self) -> bool {
        std::mem::take(&mut self.slot.borrow_mut().redraw_pending)
    }

    fn show(&self, frame_size: (u32, u32), image: PalettedImage<'_>, window: ValidityWindow) {
        let mut slot = self.slot.borrow_mut();
        let slot = &mut *slot;
        let overlay = slot.overlay.get_or_insert_with(|| {
            log::debug!(
                "Creating legacy subtitle overlay ({}x{})",
                frame_size.0,
                frame_size.1
            );
            (slot.factory)(frame_size.0, frame_size.1)
        });
        overlay.update(OverlayUpdate::Show { image, window });
        slot.redraw_pending = true;
    }

    fn clear(&self, window: ValidityWindow) -> bool {
        let mut slot = self.slot.borrow_mut();
        let Some(overlay) = slot.overlay.as_mut() else {
            return false;
        };
        overlay.update(OverlayUpdate::Clear { window });
        slot.redraw_pending = true;
        true
    }
}

impl Debug for OverlayHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let slot = self.slot.borrow();
        f.debug_struct("OverlayHandle")
            .field("created", &slot.overlay.is_some())
            .field("redraw_pending", &slot.redraw_pending)
            .finish()
    }
}

/// Routes one track's decode results to the shared legacy overlay.
#[derive(Debug, Clone)]
pub struct LegacyOverlayBridge {
    handle: OverlayHandle,
}

impl LegacyOverlayBridge {
    /// Bridge onto a shared overlay.
    pub fn new(handle: OverlayHandle) -> Self {
        Self { handle }
    }

    /// The shared overlay handle.
    pub fn handle(&self) -> &OverlayHandle {
        &self.handle
    }

    /// Push the first of `rects` to the overlay, creating it if needed.
    ///
    /// Only one region is supported; further rectangles are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// [`SubtitleError::UnsupportedRectangle`] or
    /// [`SubtitleError::MalformedRectangle`] if the first rectangle cannot
    /// be shown. Nothing is pushed in that case.
    pub fn push(
        &self,
        rects: &[RawRect],
        frame_size: (u32, u32),
        window: ValidityWindow,
    ) -> Result<(), SubtitleError> {
        let Some(rect) = rects.first() else {
            self.push_clear(window);
            return Ok(());
        };
        if rects.len() > 1 {
            log::warn!(
                "Legacy subtitle overlay shows one region, dropping {} more",
                rects.len() - 1
            );
        }

        let (indices, stride, palette) = match &rect.content {
            RectContent::PaletteBitmap {
                indices,
                stride,
                palette,
            } => (indices, *stride, palette),
            RectContent::Unsupported(kind) => {
                return Err(SubtitleError::UnsupportedRectangle {
                    index: 0,
                    kind: (*kind).to_string(),
                });
            }
        };

        IndexPlane::new(indices, rect.width as usize, rect.height as usize, stride)
            .map_err(|reason| SubtitleError::MalformedRectangle { index: 0, reason })?;

        let image = PalettedImage {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            stride,
            indices,
            palette,
        };
        self.handle.show(frame_size, image, window);
        Ok(())
    }

    /// Clear the overlay if it exists. Returns `true` if a clear was pushed.
    pub fn push_clear(&self, window: ValidityWindow) -> bool {
        self.handle.clear(window)
    }
}
