//! Subtitle stream identification.
//!
//! Demuxers describe a subtitle stream with a single-character type tag
//! plus an opaque extradata blob. [`StreamType`] maps the tags of the four
//! supported bitmap families onto libavcodec codec ids, and
//! [`StreamDescriptor`] carries both pieces to
//! [`SubtitleTrack`](crate::SubtitleTrack).

use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::codec::Id as CodecId;

use crate::error::SubtitleError;

/// A bitmap subtitle family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// DVB subtitles (broadcast), tag `'b'`.
    Dvb,
    /// HDMV presentation graphics (Blu-ray PGS), tag `'p'`.
    Pgs,
    /// XSUB (DivX disc-authoring images), tag `'x'`.
    Xsub,
    /// DVD VobSub (legacy paletted), tag `'v'`.
    DvdSub,
}

impl StreamType {
    /// Parse a demuxer type tag.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'b' => Some(StreamType::Dvb),
            'p' => Some(StreamType::Pgs),
            'x' => Some(StreamType::Xsub),
            'v' => Some(StreamType::DvdSub),
            _ => None,
        }
    }

    /// The demuxer type tag for this family.
    pub fn tag(self) -> char {
        match self {
            StreamType::Dvb => 'b',
            StreamType::Pgs => 'p',
            StreamType::Xsub => 'x',
            StreamType::DvdSub => 'v',
        }
    }

    /// The libavcodec decoder id.
    pub fn codec_id(self) -> CodecId {
        match self {
            StreamType::Dvb => CodecId::DVB_SUBTITLE,
            StreamType::Pgs => CodecId::HDMV_PGS_SUBTITLE,
            StreamType::Xsub => CodecId::XSUB,
            StreamType::DvdSub => CodecId::DVD_SUBTITLE,
        }
    }

    /// Reverse of [`codec_id`](StreamType::codec_id).
    pub fn from_codec_id(id: CodecId) -> Option<Self> {
        match id {
            CodecId::DVB_SUBTITLE => Some(StreamType::Dvb),
            CodecId::HDMV_PGS_SUBTITLE => Some(StreamType::Pgs),
            CodecId::XSUB => Some(StreamType::Xsub),
            CodecId::DVD_SUBTITLE => Some(StreamType::DvdSub),
            _ => None,
        }
    }

    /// Whether rectangle position and size can be trusted against the
    /// decoder-reported (or assumed 720x576) frame size.
    ///
    /// PGS carries its own video dimensions and 720x576 works for DVB. The
    /// other families go through the legacy overlay instead.
    pub fn has_reliable_geometry(self) -> bool {
        matches!(self, StreamType::Dvb | StreamType::Pgs)
    }
}

impl Display for StreamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StreamType::Dvb => write!(f, "DVB"),
            StreamType::Pgs => write!(f, "PGS"),
            StreamType::Xsub => write!(f, "XSUB"),
            StreamType::DvdSub => write!(f, "DVD"),
        }
    }
}

/// What the demuxer knows about a subtitle stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Single-character stream type tag.
    pub tag: char,
    /// Codec private data, forwarded to the decoder untouched.
    pub extradata: Vec<u8>,
}

impl StreamDescriptor {
    /// Create a descriptor from a raw type tag.
    pub fn new(tag: char, extradata: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            extradata: extradata.into(),
        }
    }

    /// Create a descriptor for a libavformat stream's codec id.
    ///
    /// Returns `None` for codecs that are not bitmap subtitles.
    pub fn from_codec_id(id: CodecId, extradata: impl Into<Vec<u8>>) -> Option<Self> {
        StreamType::from_codec_id(id).map(|stream_type| Self::new(stream_type.tag(), extradata))
    }

    /// Resolve the tag to a [`StreamType`].
    ///
    /// # Errors
    ///
    /// [`SubtitleError::UnsupportedStreamType`] for unknown tags.
    pub fn stream_type(&self) -> Result<StreamType, SubtitleError> {
        StreamType::from_tag(self.tag).ok_or(SubtitleError::UnsupportedStreamType(self.tag))
    }
}
