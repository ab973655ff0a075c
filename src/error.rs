//! Error types for the `subpix` crate.
//!
//! This module defines [`SubtitleError`], the unified error type of the
//! crate. Only track initialisation surfaces errors to callers; problems
//! hit while decoding a packet are logged and degrade to "no subtitle
//! shown", but they are still expressed as [`SubtitleError`] values
//! internally so the log line carries the same context.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::stream::StreamType;

/// The unified error type for all `subpix` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubtitleError {
    /// The stream descriptor carries a type tag that is not one of the
    /// supported bitmap subtitle families.
    #[error("Unsupported subtitle stream type tag {0:?}")]
    UnsupportedStreamType(char),

    /// libavcodec was built without a decoder for this stream type.
    #[error("No libavcodec decoder available for {0} subtitles")]
    CodecNotFound(StreamType),

    /// The decoder exists but could not be opened.
    #[error("Could not open libavcodec subtitle decoder: {0}")]
    DecoderOpen(String),

    /// The decoder produced a rectangle encoding that cannot be converted.
    #[error("Unsupported subtitle rectangle #{index} ({kind})")]
    UnsupportedRectangle {
        /// Position of the rectangle within its frame.
        index: usize,
        /// Human-readable name of the encoding.
        kind: String,
    },

    /// A rectangle's declared geometry does not fit its buffers.
    #[error("Malformed subtitle rectangle #{index}: {reason}")]
    MalformedRectangle {
        /// Position of the rectangle within its frame.
        index: usize,
        /// What did not add up.
        reason: String,
    },

    /// The track was used before [`init`](crate::SubtitleTrack::init) succeeded.
    #[error("Subtitle track is not initialized")]
    NotInitialized,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing output.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while exporting a bitmap.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl SubtitleError {
    /// Returns `true` for errors that must disable the subtitle track.
    pub fn is_init_error(&self) -> bool {
        matches!(
            self,
            SubtitleError::UnsupportedStreamType(_)
                | SubtitleError::CodecNotFound(_)
                | SubtitleError::DecoderOpen(_)
        )
    }
}

impl From<FfmpegError> for SubtitleError {
    fn from(error: FfmpegError) -> Self {
        SubtitleError::FfmpegError(error.to_string())
    }
}
