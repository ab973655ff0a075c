//! Decoder adapter.
//!
//! [`SubtitleDecoder`] is the narrow contract the rest of the pipeline needs
//! from a bitmap subtitle decoder: feed a packet, get zero or one
//! [`RawFrame`], flush on seek, close once. [`FfmpegSubtitleDecoder`] is the
//! libavcodec-backed implementation.
//!
//! Raw frames are copied out of libav memory into owned, safe structures
//! before they leave this module, so nothing downstream touches FFmpeg
//! pointers.

use ffmpeg_next::{
    Packet, Subtitle,
    codec::{context::Context as CodecContext, decoder::Subtitle as LibavSubtitleDecoder},
    subtitle::{Bitmap as SubtitleBitmap, Rect},
};

use crate::error::SubtitleError;
use crate::palette::Palette;
use crate::stream::{StreamDescriptor, StreamType};
use crate::timing::seconds_to_millis;

/// One compressed subtitle packet as delivered by the demuxer.
#[derive(Debug, Clone, Copy)]
pub struct SubtitlePacket<'a> {
    /// Compressed payload.
    pub data: &'a [u8],
    /// Presentation time in seconds, `None` when unknown.
    pub pts: Option<f64>,
    /// Duration hint in seconds, `None` when unknown.
    pub duration: Option<f64>,
}

impl<'a> SubtitlePacket<'a> {
    /// Create a packet. Negative or NaN durations are treated as unknown.
    pub fn new(data: &'a [u8], pts: Option<f64>, duration: Option<f64>) -> Self {
        Self {
            data,
            pts,
            duration: duration.filter(|d| *d >= 0.0),
        }
    }
}

/// Pixel content of one decoded rectangle.
#[derive(Debug, Clone, PartialEq)]
pub enum RectContent {
    /// Palette-indexed bitmap: one index byte per pixel, rows `stride`
    /// bytes apart.
    PaletteBitmap {
        /// Index plane.
        indices: Vec<u8>,
        /// Distance in bytes between the starts of two rows.
        stride: usize,
        /// Colour lookup table.
        palette: Palette,
    },
    /// Anything else (text, ASS, empty). The string names the encoding.
    Unsupported(&'static str),
}

/// One region of a decoded subtitle.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRect {
    /// Left edge in source coordinates.
    pub x: i32,
    /// Top edge in source coordinates.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel content.
    pub content: RectContent,
}

/// Decoder output for one packet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    /// Rectangles in decoder order. Empty means "clear the screen".
    pub rects: Vec<RawRect>,
    /// Display start, milliseconds relative to the packet pts.
    pub start_display_ms: u32,
    /// Display end, milliseconds relative to the packet pts.
    pub end_display_ms: u32,
}

/// The contract between a subtitle track and its decoder.
///
/// Calls must be serialized by the owner; implementations hold mutable
/// state across [`decode`](SubtitleDecoder::decode) calls.
pub trait SubtitleDecoder {
    /// Decode one packet.
    ///
    /// Returns `None` when no complete subtitle is available yet or the
    /// packet could not be decoded. Both are normal outcomes.
    fn decode(&mut self, packet: &SubtitlePacket<'_>) -> Option<RawFrame>;

    /// Discard buffered decoder state (after a seek).
    fn flush(&mut self);

    /// Frame size the stream was authored for, `(0, 0)` if unknown.
    fn frame_size(&self) -> (u32, u32);

    /// Release the decoder.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// libavcodec-backed bitmap subtitle decoder.
pub struct FfmpegSubtitleDecoder {
    decoder: LibavSubtitleDecoder,
    stream_type: StreamType,
}

impl FfmpegSubtitleDecoder {
    /// Open the libavcodec decoder matching `descriptor`.
    ///
    /// # Errors
    ///
    /// - [`SubtitleError::UnsupportedStreamType`] for an unknown tag.
    /// - [`SubtitleError::CodecNotFound`] if libavcodec lacks the decoder.
    /// - [`SubtitleError::DecoderOpen`] if the decoder refuses to open.
    pub fn open(descriptor: &StreamDescriptor) -> Result<Self, SubtitleError> {
        let stream_type = descriptor.stream_type()?;
        ffmpeg_next::init().map_err(|e| SubtitleError::DecoderOpen(e.to_string()))?;

        let codec = ffmpeg_next::codec::decoder::find(stream_type.codec_id())
            .ok_or(SubtitleError::CodecNotFound(stream_type))?;
        let mut context = CodecContext::new_with_codec(codec);
        if !descriptor.extradata.is_empty() {
            attach_extradata(&mut context, &descriptor.extradata)?;
        }

        let decoder = context
            .decoder()
            .subtitle()
            .map_err(|e| SubtitleError::DecoderOpen(e.to_string()))?;

        log::debug!(
            "Opened {} subtitle decoder ({} bytes extradata)",
            stream_type,
            descriptor.extradata.len()
        );

        Ok(Self {
            decoder,
            stream_type,
        })
    }

    /// The stream family this decoder was opened for.
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }
}

impl SubtitleDecoder for FfmpegSubtitleDecoder {
    fn decode(&mut self, packet: &SubtitlePacket<'_>) -> Option<RawFrame> {
        let mut av_packet = Packet::copy(packet.data);
        av_packet.set_pts(packet.pts.map(seconds_to_millis));
        if let Some(duration) = packet.duration {
            av_packet.set_duration(seconds_to_millis(duration));
        }

        let mut subtitle = Subtitle::new();
        match self.decoder.decode(&av_packet, &mut subtitle) {
            Ok(true) => Some(raw_frame_from_subtitle(&subtitle)),
            Ok(false) => None,
            Err(error) => {
                log::debug!("{} subtitle packet not decoded: {}", self.stream_type, error);
                None
            }
        }
    }

    fn flush(&mut self) {
        self.decoder.flush();
    }

    fn frame_size(&self) -> (u32, u32) {
        // Safety: the codec context stays valid for the lifetime of `decoder`.
        unsafe {
            let context = self.decoder.as_ptr();
            ((*context).width.max(0) as u32, (*context).height.max(0) as u32)
        }
    }

    fn close(self) {
        log::debug!("Closing {} subtitle decoder", self.stream_type);
        drop(self.decoder);
    }
}

/// Copy `extradata` into a libav-owned, padded buffer on the codec context.
fn attach_extradata(context: &mut CodecContext, extradata: &[u8]) -> Result<(), SubtitleError> {
    let size = i32::try_from(extradata.len())
        .map_err(|_| SubtitleError::DecoderOpen("extradata too large".to_string()))?;
    let padding = ffmpeg_sys_next::AV_INPUT_BUFFER_PADDING_SIZE as usize;

    // Safety: the buffer is allocated by libav with the required padding and
    // ownership passes to the codec context, which frees it on drop.
    unsafe {
        let buffer = ffmpeg_sys_next::av_mallocz(extradata.len() + padding) as *mut u8;
        if buffer.is_null() {
            return Err(SubtitleError::DecoderOpen(
                "could not allocate extradata".to_string(),
            ));
        }
        std::ptr::copy_nonoverlapping(extradata.as_ptr(), buffer, extradata.len());
        let raw = context.as_mut_ptr();
        (*raw).extradata = buffer;
        (*raw).extradata_size = size;
    }
    Ok(())
}

fn raw_frame_from_subtitle(subtitle: &Subtitle) -> RawFrame {
    let rects = subtitle
        .rects()
        .map(|rect| match rect {
            Rect::Bitmap(bitmap) => raw_rect_from_bitmap(&bitmap),
            Rect::Text(_) => unsupported_rect("text"),
            Rect::Ass(_) => unsupported_rect("ass"),
            Rect::None(_) => unsupported_rect("none"),
        })
        .collect();

    RawFrame {
        rects,
        start_display_ms: subtitle.start(),
        end_display_ms: subtitle.end(),
    }
}

fn unsupported_rect(kind: &'static str) -> RawRect {
    RawRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
        content: RectContent::Unsupported(kind),
    }
}

/// Copy a PAL8 bitmap rect (index plane in `data[0]`, palette in `data[1]`).
///
/// Null planes or a negative line size produce an empty index plane, which
/// the bitmap converter rejects as malformed.
fn raw_rect_from_bitmap(bitmap: &SubtitleBitmap<'_>) -> RawRect {
    let width = bitmap.width();
    let height = bitmap.height();

    // Safety: data[0] holds at least `linesize * (height - 1) + width` bytes
    // and data[1] holds `colors` palette words, as produced by libavcodec.
    let (indices, stride, palette) = unsafe {
        let pointer = bitmap.as_ptr();
        let pixel_data = (*pointer).data[0];
        let palette_data = (*pointer).data[1];
        let linesize = (*pointer).linesize[0];

        if pixel_data.is_null()
            || palette_data.is_null()
            || linesize < 0
            || (linesize as u32) < width
        {
            (Vec::new(), 0, Palette::new())
        } else {
            let stride = linesize as usize;
            let plane_length = match height as usize {
                0 => 0,
                rows => stride * (rows - 1) + width as usize,
            };
            let indices = std::slice::from_raw_parts(pixel_data, plane_length).to_vec();
            let color_count = bitmap.colors().min(crate::palette::PALETTE_CAPACITY);
            let palette_bytes = std::slice::from_raw_parts(palette_data, color_count * 4);
            let palette = Palette::from_argb_plane(palette_bytes, color_count).unwrap_or_default();
            (indices, stride, palette)
        }
    };

    RawRect {
        x: bitmap.x() as i32,
        y: bitmap.y() as i32,
        width,
        height,
        content: RectContent::PaletteBitmap {
            indices,
            stride,
            palette,
        },
    }
}
