//! Shared fixtures: a scripted decoder and a recording legacy overlay.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use subpix::{
    OverlayHandle, OverlayUpdate, Palette, PalettedOverlay, RawFrame, RawRect, RectContent, Rgba,
    StreamDescriptor, SubtitleDecoder, SubtitlePacket, SubtitleTrack, TrackOptions,
    ValidityWindow,
};

pub const RED: Rgba = Rgba::new(255, 0, 0, 255);
pub const GREEN: Rgba = Rgba::new(0, 255, 0, 255);
pub const BLUE: Rgba = Rgba::new(0, 0, 255, 128);

/// Counters the scripted decoder shares with the test body.
#[derive(Debug, Default)]
pub struct DecoderProbe {
    pub decoded: Cell<usize>,
    pub flushed: Cell<usize>,
    pub closed: Cell<bool>,
    pub last_pts: Cell<Option<f64>>,
}

/// Returns pre-scripted frames, one per `decode` call.
pub struct ScriptedDecoder {
    frames: VecDeque<Option<RawFrame>>,
    frame_size: (u32, u32),
    probe: Rc<DecoderProbe>,
}

impl ScriptedDecoder {
    pub fn new(frames: Vec<Option<RawFrame>>, frame_size: (u32, u32)) -> (Self, Rc<DecoderProbe>) {
        let probe = Rc::new(DecoderProbe::default());
        let decoder = Self {
            frames: frames.into(),
            frame_size,
            probe: Rc::clone(&probe),
        };
        (decoder, probe)
    }
}

impl SubtitleDecoder for ScriptedDecoder {
    fn decode(&mut self, packet: &SubtitlePacket<'_>) -> Option<RawFrame> {
        self.probe.decoded.set(self.probe.decoded.get() + 1);
        self.probe.last_pts.set(packet.pts);
        self.frames.pop_front().flatten()
    }

    fn flush(&mut self) {
        self.probe.flushed.set(self.probe.flushed.get() + 1);
    }

    fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    fn close(self) {
        self.probe.closed.set(true);
    }
}

/// What the legacy overlay received.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Show {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        first_color: Rgba,
        window: ValidityWindow,
    },
    Clear {
        window: ValidityWindow,
    },
}

pub struct RecordingOverlay {
    events: Rc<RefCell<Vec<Recorded>>>,
}

impl PalettedOverlay for RecordingOverlay {
    fn update(&mut self, update: OverlayUpdate<'_>) {
        let recorded = match update {
            OverlayUpdate::Show { image, window } => Recorded::Show {
                x: image.x,
                y: image.y,
                width: image.width,
                height: image.height,
                first_color: image
                    .indices
                    .first()
                    .map_or(Rgba::TRANSPARENT, |&index| image.palette.get(index)),
                window,
            },
            OverlayUpdate::Clear { window } => Recorded::Clear { window },
        };
        self.events.borrow_mut().push(recorded);
    }
}

/// An overlay handle plus the log of updates and creation sizes.
pub struct OverlayRecorder {
    pub handle: OverlayHandle,
    pub events: Rc<RefCell<Vec<Recorded>>>,
    pub created: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl OverlayRecorder {
    pub fn new() -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let created = Rc::new(RefCell::new(Vec::new()));
        let factory_events = Rc::clone(&events);
        let factory_created = Rc::clone(&created);
        let handle = OverlayHandle::new(move |width, height| {
            factory_created.borrow_mut().push((width, height));
            Box::new(RecordingOverlay {
                events: Rc::clone(&factory_events),
            }) as Box<dyn PalettedOverlay>
        });
        Self {
            handle,
            events,
            created,
        }
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.borrow().clone()
    }
}

/// A `width` x `height` palette rectangle filled with index 0 (red), with
/// index 1 (green) on the diagonal. Rows are padded to `width + 3` bytes.
pub fn palette_rect(x: i32, y: i32, width: u32, height: u32) -> RawRect {
    let stride = width as usize + 3;
    let mut indices = vec![0xEE; stride * height as usize];
    for row in 0..height as usize {
        for column in 0..width as usize {
            indices[row * stride + column] = u8::from(row == column);
        }
    }
    RawRect {
        x,
        y,
        width,
        height,
        content: RectContent::PaletteBitmap {
            indices,
            stride,
            palette: Palette::from_colors(&[RED, GREEN, BLUE]),
        },
    }
}

pub fn text_rect() -> RawRect {
    RawRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        content: RectContent::Unsupported("text"),
    }
}

pub fn frame(rects: Vec<RawRect>, start_display_ms: u32, end_display_ms: u32) -> RawFrame {
    RawFrame {
        rects,
        start_display_ms,
        end_display_ms,
    }
}

/// An initialized track over a scripted decoder.
pub fn scripted_track(
    tag: char,
    frames: Vec<Option<RawFrame>>,
    frame_size: (u32, u32),
    options: TrackOptions,
    overlay: OverlayHandle,
) -> (SubtitleTrack<ScriptedDecoder>, Rc<DecoderProbe>) {
    let (decoder, probe) = ScriptedDecoder::new(frames, frame_size);
    let mut track = SubtitleTrack::new(StreamDescriptor::new(tag, Vec::new()), options, overlay);
    track
        .init_with(move |_| Ok(decoder))
        .expect("Scripted decoder should initialize");
    (track, probe)
}

pub fn packet(pts: f64) -> SubtitlePacket<'static> {
    SubtitlePacket::new(b"packet", Some(pts), None)
}
