//! Presentation validity windows.
//!
//! A decoded subtitle stays on screen from its absolute start until its
//! absolute end. The window is derived from the packet's presentation time
//! and duration hint, overridden by whatever display offsets the decoder
//! reports for the frame.

use std::time::Duration;

use crate::decoder::RawFrame;

/// How far before the end of a window playback may be before the window is
/// treated as stale (a backward seek rather than normal playback).
pub const DEFAULT_EXPIRY_HYSTERESIS: Duration = Duration::from_millis(300);

/// Convert seconds to the decoder's millisecond time base, truncating.
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0) as i64
}

/// The `[start, end)` interval during which a subtitle should be visible.
///
/// Both bounds are absolute times in seconds. `start == None` means the
/// packet had no presentation time; `end == None` means the subtitle never
/// expires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValidityWindow {
    /// Absolute start, seconds.
    pub start: Option<f64>,
    /// Absolute end, seconds.
    pub end: Option<f64>,
}

impl ValidityWindow {
    /// The cleared state: no timestamps at all.
    pub const UNSET: ValidityWindow = ValidityWindow {
        start: None,
        end: None,
    };

    /// Create a window from explicit bounds.
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// Compute the window for a decoded frame.
    ///
    /// When the frame's end offset exceeds its start offset, the frame's own
    /// duration replaces `duration`. The start is shifted by the frame's
    /// start offset. An unknown `pts` yields an unknown start and no end.
    pub fn for_frame(frame: &RawFrame, pts: Option<f64>, duration: Option<f64>) -> Self {
        let Some(pts) = pts else {
            return Self::UNSET;
        };

        let duration = if frame.end_display_ms > frame.start_display_ms {
            Some(f64::from(frame.end_display_ms - frame.start_display_ms) / 1000.0)
        } else {
            duration
        };

        let start = pts + f64::from(frame.start_display_ms) / 1000.0;
        let end = duration.filter(|d| *d >= 0.0).map(|d| start + d);
        Self {
            start: Some(start),
            end,
        }
    }

    /// Returns `true` if neither bound is known.
    pub fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether content with this window should be dropped at playback time
    /// `now` (seconds).
    ///
    /// Expires once `now` reaches the end, and also when `now` lies more than
    /// `hysteresis` before the end. Open-ended windows never expire.
    pub fn is_expired(&self, now: f64, hysteresis: Duration) -> bool {
        match self.end {
            Some(end) => now >= end || now < end - hysteresis.as_secs_f64(),
            None => false,
        }
    }
}
