//! Fixed-capacity RGBA colour lookup tables.

use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Maximum number of entries in a subtitle palette.
pub const PALETTE_CAPACITY: usize = 256;

/// One palette colour, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    /// Create a colour from its components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a libav PAL8 word (`0xAARRGGBB`).
    pub const fn from_argb(word: u32) -> Self {
        Self {
            r: (word >> 16) as u8,
            g: (word >> 8) as u8,
            b: word as u8,
            a: (word >> 24) as u8,
        }
    }

    /// Bytes in R, G, B, A order.
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Up to 256 colours addressed by an 8-bit index.
///
/// Slots past [`len`](Palette::len) read as [`Rgba::TRANSPARENT`], so every
/// `u8` is a valid lookup.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgba; PALETTE_CAPACITY],
    len: usize,
}

impl Palette {
    /// An empty palette (every index is transparent).
    pub fn new() -> Self {
        Self {
            entries: [Rgba::TRANSPARENT; PALETTE_CAPACITY],
            len: 0,
        }
    }

    /// Build a palette from a list of colours. Entries beyond 256 are ignored.
    pub fn from_colors(colors: &[Rgba]) -> Self {
        let mut palette = Self::new();
        for color in colors.iter().take(PALETTE_CAPACITY) {
            palette.entries[palette.len] = *color;
            palette.len += 1;
        }
        palette
    }

    /// Build a palette from a raw libav palette plane: `count` native-endian
    /// `0xAARRGGBB` words.
    ///
    /// Returns `None` when `bytes` is too short for `count` entries.
    pub fn from_argb_plane(bytes: &[u8], count: usize) -> Option<Self> {
        let count = count.min(PALETTE_CAPACITY);
        let words = bytes.get(..count * 4)?;
        let mut palette = Self::new();
        for chunk in words.chunks_exact(4) {
            let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            palette.entries[palette.len] = Rgba::from_argb(word);
            palette.len += 1;
        }
        Some(palette)
    }

    /// Number of declared colours.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no colours are declared.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Look up an index.
    #[inline]
    pub fn get(&self, index: u8) -> Rgba {
        self.entries[index as usize]
    }

    /// The declared colours.
    pub fn colors(&self) -> &[Rgba] {
        &self.entries[..self.len]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Palette {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Palette")
            .field("len", &self.len)
            .field("colors", &self.colors())
            .finish()
    }
}
