//! Track configuration.
//!
//! [`TrackOptions`] is a builder carrying renderer capabilities and the
//! tuning knobs of the timing and scaling stages.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use subpix::TrackOptions;
//!
//! let options = TrackOptions::new()
//!     .with_rgba_support(false)
//!     .with_fallback_resolution(720, 480)
//!     .with_expiry_hysteresis(Duration::from_millis(500));
//! assert!(!options.rgba_support());
//! ```

use std::time::Duration;

use crate::timing::DEFAULT_EXPIRY_HYSTERESIS;

/// Source size assumed when the decoder does not report one.
pub const DEFAULT_FALLBACK_RESOLUTION: (u32, u32) = (720, 576);

/// Options for a [`SubtitleTrack`](crate::SubtitleTrack).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOptions {
    pub(crate) rgba_support: bool,
    pub(crate) fallback_resolution: (u32, u32),
    pub(crate) expiry_hysteresis: Duration,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackOptions {
    /// Create options with default settings.
    ///
    /// Defaults: RGBA supported, 720x576 fallback resolution, 300 ms expiry
    /// hysteresis.
    pub fn new() -> Self {
        Self {
            rgba_support: true,
            fallback_resolution: DEFAULT_FALLBACK_RESOLUTION,
            expiry_hysteresis: DEFAULT_EXPIRY_HYSTERESIS,
        }
    }

    /// Declare whether the renderer composites RGBA parts.
    ///
    /// Without RGBA support every decoded subtitle goes to the legacy
    /// overlay.
    #[must_use]
    pub fn with_rgba_support(mut self, supported: bool) -> Self {
        self.rgba_support = supported;
        self
    }

    /// Source frame size to assume when the decoder reports none.
    ///
    /// Each dimension is clamped to a minimum of 1.
    #[must_use]
    pub fn with_fallback_resolution(mut self, width: u32, height: u32) -> Self {
        self.fallback_resolution = (width.max(1), height.max(1));
        self
    }

    /// How far playback may sit before the end of a subtitle's window
    /// before the subtitle is considered stale.
    #[must_use]
    pub fn with_expiry_hysteresis(mut self, hysteresis: Duration) -> Self {
        self.expiry_hysteresis = hysteresis;
        self
    }

    /// Whether the renderer composites RGBA parts.
    pub fn rgba_support(&self) -> bool {
        self.rgba_support
    }

    /// Assumed source frame size.
    pub fn fallback_resolution(&self) -> (u32, u32) {
        self.fallback_resolution
    }

    /// Expiry hysteresis.
    pub fn expiry_hysteresis(&self) -> Duration {
        self.expiry_hysteresis
    }

    /// Resolve the source size. Each dimension the decoder reports as zero
    /// falls back to the configured resolution.
    pub(crate) fn resolve_source_size(&self, reported: (u32, u32)) -> (u32, u32) {
        let width = if reported.0 == 0 {
            self.fallback_resolution.0
        } else {
            reported.0
        };
        let height = if reported.1 == 0 {
            self.fallback_resolution.1
        } else {
            reported.1
        };
        (width, height)
    }
}
