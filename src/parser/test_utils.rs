//! Helpers for building LZW streams and GIF files by hand.

/// Packs `(code, width)` pairs least significant bit first.
pub(crate) fn pack_codes(codes: &[(u16, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &(code, width) in codes {
        buffer |= (code as u32) << bits;
        bits += width;
        while bits >= 8 {
            out.push(buffer as u8);
            buffer >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(buffer as u8);
    }
    out
}

/// Splits `data` into sub-blocks of at most `max` bytes and closes the
/// sequence with a terminator.
pub(crate) fn sub_blocks(data: &[u8], max: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(max) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

/// Assembles a GIF byte stream piece by piece.
pub(crate) struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        Self::with_magic(b"GIF89a", width, height, 0, None)
    }

    /// `palette_bits` is the packed size field, the palette holds
    /// `2^(palette_bits + 1)` colors.
    pub(crate) fn with_global_palette(width: u16, height: u16, palette_bits: u8, background: u8) -> Self {
        let mut builder = Self::with_magic(b"GIF89a", width, height, background, Some(palette_bits));
        for i in 0..1usize << (palette_bits + 1) {
            let level = (i * 40) as u8;
            builder.bytes.extend_from_slice(&[level, level, level]);
        }
        builder
    }

    pub(crate) fn with_magic(
        magic: &[u8; 6],
        width: u16,
        height: u16,
        background: u8,
        palette_bits: Option<u8>,
    ) -> Self {
        let mut bytes = magic.to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        let flags = match palette_bits {
            Some(bits) => 0b1000_0000 | 0b0111_0000 | bits,
            None => 0,
        };
        bytes.extend_from_slice(&[flags, background, 0]);
        Self { bytes }
    }

    pub(crate) fn graphic_control(mut self, packed: u8, delay: u16, transparent: u8) -> Self {
        self.bytes.extend_from_slice(&[0x21, 0xf9, 0x04, packed]);
        self.bytes.extend_from_slice(&delay.to_le_bytes());
        self.bytes.extend_from_slice(&[transparent, 0x00]);
        self
    }

    pub(crate) fn extension(mut self, label: u8, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&[0x21, label]);
        self.bytes.extend(sub_blocks(payload, 255));
        self
    }

    /// Image block with the given packed flags (no local palette bytes are
    /// added) and LZW data split into sub-blocks.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn image(
        mut self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        flags: u8,
        min_code_size: u8,
        lzw_data: &[u8],
    ) -> Self {
        self.bytes.push(0x2c);
        for field in [left, top, width, height] {
            self.bytes.extend_from_slice(&field.to_le_bytes());
        }
        self.bytes.push(flags);
        self.bytes.push(min_code_size);
        self.bytes.extend(sub_blocks(lzw_data, 255));
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub(crate) fn trailer(self) -> Vec<u8> {
        self.raw(&[0x3b]).bytes
    }

    pub(crate) fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// The 10x10 four color sample image used all over GIF tutorials.
pub(crate) const SAMPLE_10X10: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x0a, 0x00, 0x0a, 0x00, 0x91, 0x00, 0x00, 0xff, 0xff,
    0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x0a, 0x00, 0x00, 0x02, 0x16,
    0x8c, 0x2d, 0x99, 0x87, 0x2a, 0x1c, 0xdc, 0x33, 0xa0, 0x02, 0x75, 0xec, 0x95, 0xfa, 0xa8,
    0xde, 0x60, 0x8c, 0x04, 0x91, 0x4c, 0x01, 0x00, 0x3b,
];

pub(crate) const SAMPLE_10X10_INDICES: [[u8; 10]; 10] = [
    [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    [1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    [1, 1, 1, 0, 0, 0, 0, 2, 2, 2],
    [1, 1, 1, 0, 0, 0, 0, 2, 2, 2],
    [2, 2, 2, 0, 0, 0, 0, 1, 1, 1],
    [2, 2, 2, 0, 0, 0, 0, 1, 1, 1],
    [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
    [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
    [2, 2, 2, 2, 2, 1, 1, 1, 1, 1],
];
