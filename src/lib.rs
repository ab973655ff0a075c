//! # subpix
//!
//! Decode bitmap subtitle streams into timed, positioned overlays.
//!
//! `subpix` sits between a demuxer and a video renderer. It feeds DVB, PGS,
//! XSUB and DVD subtitle packets to libavcodec through
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next), expands the
//! palette-indexed rectangles it gets back into RGBA, tracks how long each
//! subtitle stays valid, and scales the result onto the current display
//! area. Render queries report two change counters so the renderer only
//! re-uploads pixels when they actually changed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use subpix::{
//!     DisplayArea, OverlayHandle, StreamDescriptor, SubtitlePacket, SubtitleTrack,
//!     TrackOptions,
//! };
//! # struct NullOverlay;
//! # impl subpix::PalettedOverlay for NullOverlay {
//! #     fn update(&mut self, _: subpix::OverlayUpdate<'_>) {}
//! # }
//!
//! let overlay = OverlayHandle::new(|_, _| Box::new(NullOverlay));
//! let mut track = SubtitleTrack::open(
//!     StreamDescriptor::new('b', Vec::new()),
//!     TrackOptions::new(),
//!     overlay,
//! )
//! .unwrap();
//!
//! # let payload: &[u8] = &[];
//! track.decode(&SubtitlePacket::new(payload, Some(3.5), Some(2.0)));
//! let bitmaps = track.bitmaps(&DisplayArea::new(1280, 720), 3.6);
//! println!("{} parts, content id {}", bitmaps.parts.len(), bitmaps.content_id);
//! ```
//!
//! ## Pipeline
//!
//! - [`decoder`]: the libavcodec adapter and the owned [`RawFrame`] it emits
//! - [`bitmap`]: palette expansion into [`InputBitmap`]s
//! - [`timing`]: [`ValidityWindow`] computation and expiry
//! - [`render`]: scaling onto a [`DisplayArea`] and change tracking
//! - [`overlay`]: the legacy paletted overlay path
//! - [`track`]: [`SubtitleTrack`], which ties them together
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod bitmap;
pub mod configuration;
pub mod decoder;
pub mod error;
pub mod ffmpeg;
pub mod overlay;
pub mod palette;
pub mod render;
pub mod stream;
pub mod timing;
pub mod track;

pub use bitmap::{IndexPlane, InputBitmap};
pub use configuration::TrackOptions;
pub use decoder::{
    FfmpegSubtitleDecoder, RawFrame, RawRect, RectContent, SubtitleDecoder, SubtitlePacket,
};
pub use error::SubtitleError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use overlay::{
    LegacyOverlayBridge, OverlayHandle, OverlayUpdate, PalettedImage, PalettedOverlay,
};
pub use palette::{Palette, Rgba};
pub use render::{
    BitmapFormat, ChangeState, DisplayArea, Margins, OutputBitmap, Placement, SubBitmaps,
};
pub use stream::{StreamDescriptor, StreamType};
pub use timing::ValidityWindow;
pub use track::{DecodeOutcome, SubtitleTrack};
