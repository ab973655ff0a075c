//! Subtitle tracks.
//!
//! [`SubtitleTrack`] owns a decoder and the currently displayed subtitle and
//! wires the pipeline together: packets are decoded, expanded to RGBA (or
//! pushed to the legacy overlay), stamped with a validity window, and laid
//! out against the display on every render query.
//!
//! # Example
//!
//! ```no_run
//! use subpix::{
//!     DisplayArea, OverlayHandle, StreamDescriptor, SubtitlePacket, SubtitleTrack,
//!     SubtitleError, TrackOptions,
//! };
//! # struct NullOverlay;
//! # impl subpix::PalettedOverlay for NullOverlay {
//! #     fn update(&mut self, _: subpix::OverlayUpdate<'_>) {}
//! # }
//!
//! let overlay = OverlayHandle::new(|_, _| Box::new(NullOverlay));
//! let descriptor = StreamDescriptor::new('p', Vec::new());
//! let mut track = SubtitleTrack::open(descriptor, TrackOptions::new(), overlay)?;
//!
//! # let payload: &[u8] = &[];
//! track.decode(&SubtitlePacket::new(payload, Some(12.0), None));
//! let bitmaps = track.bitmaps(&DisplayArea::new(1920, 1080), 12.1);
//! for part in &bitmaps.parts {
//!     println!("{}x{} at ({}, {})", part.display_width, part.display_height, part.x, part.y);
//! }
//! # Ok::<(), SubtitleError>(())
//! ```

use crate::bitmap::{InputBitmap, convert_frame};
use crate::configuration::TrackOptions;
use crate::decoder::{FfmpegSubtitleDecoder, RectContent, SubtitleDecoder, SubtitlePacket};
use crate::error::SubtitleError;
use crate::overlay::{LegacyOverlayBridge, OverlayHandle};
use crate::render::{ChangeState, DisplayArea, LayoutTracker, SubBitmaps};
use crate::stream::{StreamDescriptor, StreamType};
use crate::timing::ValidityWindow;

/// What a [`SubtitleTrack::decode`] call did with its packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// No complete subtitle was produced. Nothing is displayed.
    Miss,
    /// The decoder signalled "no subtitle". Nothing is displayed.
    Empty,
    /// RGBA bitmaps are held for render queries.
    Rgba {
        /// Number of bitmaps.
        parts: usize,
    },
    /// The subtitle was pushed to the legacy overlay.
    Legacy,
    /// The subtitle could not be converted and was dropped.
    Rejected,
}

struct ActiveDecoder<D> {
    decoder: D,
    stream_type: StreamType,
}

/// One bitmap subtitle stream and its displayed state.
///
/// All calls must be serialized by the owner.
pub struct SubtitleTrack<D: SubtitleDecoder = FfmpegSubtitleDecoder> {
    descriptor: StreamDescriptor,
    options: TrackOptions,
    active: Option<ActiveDecoder<D>>,
    inputs: Vec<InputBitmap>,
    window: ValidityWindow,
    layout: LayoutTracker,
    legacy: LegacyOverlayBridge,
}

impl SubtitleTrack<FfmpegSubtitleDecoder> {
    /// Create a track and open its libavcodec decoder.
    ///
    /// # Errors
    ///
    /// Init errors from [`FfmpegSubtitleDecoder::open`]. The caller should
    /// disable the stream.
    pub fn open(
        descriptor: StreamDescriptor,
        options: TrackOptions,
        overlay: OverlayHandle,
    ) -> Result<Self, SubtitleError> {
        let mut track = Self::new(descriptor, options, overlay);
        track.init()?;
        Ok(track)
    }

    /// Open the libavcodec decoder. A no-op if already initialized.
    ///
    /// # Errors
    ///
    /// See [`FfmpegSubtitleDecoder::open`].
    pub fn init(&mut self) -> Result<(), SubtitleError> {
        self.init_with(FfmpegSubtitleDecoder::open)
    }
}

impl<D: SubtitleDecoder> SubtitleTrack<D> {
    /// Create an uninitialized track.
    pub fn new(descriptor: StreamDescriptor, options: TrackOptions, overlay: OverlayHandle) -> Self {
        Self {
            descriptor,
            options,
            active: None,
            inputs: Vec::new(),
            window: ValidityWindow::UNSET,
            layout: LayoutTracker::new(),
            legacy: LegacyOverlayBridge::new(overlay),
        }
    }

    /// Initialize with a decoder built by `open`. A no-op returning `Ok` if
    /// already initialized.
    ///
    /// # Errors
    ///
    /// [`SubtitleError::UnsupportedStreamType`] for an unknown tag (checked
    /// before `open` runs), or whatever `open` returns.
    pub fn init_with<F>(&mut self, open: F) -> Result<(), SubtitleError>
    where
        F: FnOnce(&StreamDescriptor) -> Result<D, SubtitleError>,
    {
        if self.active.is_some() {
            return Ok(());
        }

        let opened = self
            .descriptor
            .stream_type()
            .and_then(|stream_type| open(&self.descriptor).map(|decoder| (stream_type, decoder)));
        match opened {
            Ok((stream_type, decoder)) => {
                log::debug!("Initialized {} subtitle track", stream_type);
                self.active = Some(ActiveDecoder {
                    decoder,
                    stream_type,
                });
                Ok(())
            }
            Err(error) => {
                log::error!("Could not open subtitle decoder: {}", error);
                Err(error)
            }
        }
    }

    /// Returns `true` once a decoder is attached.
    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// The stream family, once initialized.
    pub fn stream_type(&self) -> Option<StreamType> {
        self.active.as_ref().map(|active| active.stream_type)
    }

    /// The track's options.
    pub fn options(&self) -> &TrackOptions {
        &self.options
    }

    /// Update the renderer's RGBA capability.
    pub fn set_rgba_support(&mut self, supported: bool) {
        self.options.rgba_support = supported;
    }

    /// The legacy overlay this track pushes to.
    pub fn overlay(&self) -> &OverlayHandle {
        self.legacy.handle()
    }

    /// Number of held RGBA bitmaps.
    pub fn bitmap_count(&self) -> usize {
        self.inputs.len()
    }

    /// The held RGBA bitmaps in source coordinates.
    pub fn input_bitmaps(&self) -> &[InputBitmap] {
        &self.inputs
    }

    /// Validity window of the held bitmaps.
    pub fn window(&self) -> ValidityWindow {
        self.window
    }

    /// Current change counters.
    pub fn change_state(&self) -> ChangeState {
        self.layout.ids()
    }

    /// Decode one packet, replacing whatever was displayed.
    ///
    /// Decode failures, unsupported and malformed rectangles are logged and
    /// leave nothing displayed; see [`DecodeOutcome`].
    pub fn decode(&mut self, packet: &SubtitlePacket<'_>) -> DecodeOutcome {
        self.clear();

        let Some(active) = self.active.as_mut() else {
            log::warn!("Subtitle packet dropped: {}", SubtitleError::NotInitialized);
            return DecodeOutcome::Miss;
        };
        let Some(frame) = active.decoder.decode(packet) else {
            return DecodeOutcome::Miss;
        };

        let window = ValidityWindow::for_frame(&frame, packet.pts, packet.duration);
        let Some(first) = frame.rects.first() else {
            self.legacy.push_clear(window);
            return DecodeOutcome::Empty;
        };

        if let RectContent::Unsupported(kind) = &first.content {
            log::error!(
                "{}",
                SubtitleError::UnsupportedRectangle {
                    index: 0,
                    kind: kind.to_string(),
                }
            );
            return DecodeOutcome::Rejected;
        }

        if !self.options.rgba_support || !active.stream_type.has_reliable_geometry() {
            let frame_size = active.decoder.frame_size();
            return match self.legacy.push(&frame.rects, frame_size, window) {
                Ok(()) => DecodeOutcome::Legacy,
                Err(error) => {
                    log::error!("{}", error);
                    DecodeOutcome::Rejected
                }
            };
        }

        match convert_frame(&frame) {
            Ok(bitmaps) => {
                let parts = bitmaps.len();
                self.inputs = bitmaps;
                self.window = window;
                self.layout.mark_content_changed();
                DecodeOutcome::Rgba { parts }
            }
            Err(error) => {
                log::error!("Dropping subtitle frame: {}", error);
                DecodeOutcome::Rejected
            }
        }
    }

    /// Render query: lay the held bitmaps out on `area` at playback time
    /// `now` (seconds).
    ///
    /// Expired content is cleared first. Without RGBA support the result is
    /// always empty and the counters are left alone.
    pub fn bitmaps(&mut self, area: &DisplayArea, now: f64) -> SubBitmaps<'_> {
        if self.window.is_expired(now, self.options.expiry_hysteresis) {
            log::debug!("Subtitle expired at {:.3}s", now);
            self.clear();
        }
        if !self.options.rgba_support {
            return self.layout.empty();
        }

        let reported = self
            .active
            .as_ref()
            .map_or((0, 0), |active| active.decoder.frame_size());
        let source = self.options.resolve_source_size(reported);
        self.layout.layout(&self.inputs, source, area)
    }

    /// Drop the displayed bitmaps and forget their window.
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.window = ValidityWindow::UNSET;
        self.layout.mark_content_changed();
    }

    /// Seek: clear the display and flush the decoder.
    pub fn reset(&mut self) {
        self.clear();
        if let Some(active) = self.active.as_mut() {
            active.decoder.flush();
        }
    }

    /// Stop displaying but keep the decoder open.
    pub fn switch_off(&mut self) {
        self.reset();
    }

    /// Tear down the track, closing its decoder.
    pub fn uninit(mut self) {
        self.clear();
        if let Some(active) = self.active.take() {
            log::debug!("Closing {} subtitle track", active.stream_type);
            active.decoder.close();
        }
    }
}
