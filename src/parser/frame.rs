use super::decoder::DecodeOptions;
use super::{ByteSource, DisposalMethod, LzwDecoder, ParserError, Result, SubBlocks};

use log::{debug, warn};
use std::io::Read;

/// Rows of an interlaced image arrive in four passes, each given as
/// (first row, row step).
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Number of colors described by the size bits of a packed field.
pub(crate) fn color_table_len(packed_fields: u8) -> usize {
    1 << ((packed_fields & 0b00000111) + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Box<[[u8; 3]]>,
}

impl Palette {
    pub(crate) fn read<R: Read>(
        source: &mut ByteSource<R>,
        len: usize,
        context: &'static str,
    ) -> Result<Self> {
        let bytes = source.read_bytes(len * 3, context)?;
        let colors = bytes
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }
}

impl From<Vec<[u8; 3]>> for Palette {
    fn from(colors: Vec<[u8; 3]>) -> Self {
        Self {
            colors: colors.into_boxed_slice(),
        }
    }
}

/// Rendering hints for the image that follows a graphic control extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicControl {
    pub disposal_method: DisposalMethod,
    pub user_input_flag: bool,
    pub transparent_color_index: Option<u8>,
    /// In hundredths of a second.
    pub delay_time: u16,
}

impl GraphicControl {
    /// Parses the flattened extension payload. Returns `None` when it is too
    /// short to hold the fixed fields.
    pub(crate) fn from_payload(payload: &[u8]) -> Option<Self> {
        let &[packed_fields, delay_low, delay_high, transparent_color_index, ..] = payload else {
            return None;
        };

        // packed fields: XXXYYYZW
        // XXX = reserved
        // YYY = disposal method
        // Z = user input flag
        // W = transparent color flag
        let disposal_method = DisposalMethod::from_u8((packed_fields >> 2) & 0b00000111);
        let user_input_flag = packed_fields & 0b00000010 != 0;
        let transparent_color_flag = packed_fields & 0b00000001 != 0;

        Some(Self {
            disposal_method,
            user_input_flag,
            transparent_color_index: transparent_color_flag.then_some(transparent_color_index),
            delay_time: u16::from_le_bytes([delay_low, delay_high]),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left_position: u16,
    pub top_position: u16,

    pub width: u16,
    pub height: u16,

    pub local_color_table_flag: bool,
    pub interlace_flag: bool,
    pub sort_flag: bool,
    pub local_color_table_len: usize,
}

impl ImageDescriptor {
    pub(crate) fn read<R: Read>(source: &mut ByteSource<R>) -> Result<Self> {
        let context = "image descriptor";
        let left_position = source.read_u16(context)?;
        let top_position = source.read_u16(context)?;

        let width = source.read_u16(context)?;
        let height = source.read_u16(context)?;

        let packed_fields = source.read_byte(context)?;

        Ok(Self {
            left_position,
            top_position,
            width,
            height,
            local_color_table_flag: packed_fields & 0b10000000 != 0,
            interlace_flag: packed_fields & 0b01000000 != 0,
            sort_flag: packed_fields & 0b00100000 != 0,
            local_color_table_len: color_table_len(packed_fields),
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One decoded image block.
///
/// The color indices are stored in the order the LZW stream produced them;
/// [`pixels`](Frame::pixels) places them on the screen.
#[derive(Debug, Clone)]
pub struct Frame {
    pub descriptor: ImageDescriptor,
    pub local_palette: Option<Palette>,
    pub control: Option<GraphicControl>,
    pub min_code_size: u8,
    indices: Box<[u8]>,
    deinterlace: bool,
}

impl Frame {
    /// Reads everything after the image separator: the descriptor, the local
    /// palette, the minimum code size and the image data, up to and
    /// including the data's terminating sub-block.
    pub(crate) fn read<R: Read>(
        source: &mut ByteSource<R>,
        control: Option<GraphicControl>,
        options: &DecodeOptions,
    ) -> Result<Self> {
        let descriptor = ImageDescriptor::read(source)?;
        debug!("processed image descriptor, got: {:?}", descriptor);

        if let Some(limit) = options.max_frame_pixels {
            if descriptor.pixel_count() > limit {
                return Err(ParserError::FrameTooLarge {
                    width: descriptor.width,
                    height: descriptor.height,
                    limit,
                });
            }
        }

        let local_palette = if descriptor.local_color_table_flag {
            Some(Palette::read(
                source,
                descriptor.local_color_table_len,
                "local color table",
            )?)
        } else {
            None
        };

        let min_code_size = source.read_byte("lzw minimum code size")?;
        if !(1..=8).contains(&min_code_size) {
            return Err(ParserError::InvalidMinCodeSize(min_code_size));
        }

        let expected = descriptor.pixel_count();
        let mut indices = Vec::with_capacity(expected);
        let mut discarded = 0;

        let mut blocks = SubBlocks::new(source);
        let mut decoder = LzwDecoder::new(blocks.by_ref(), min_code_size);
        while let Some(sequence) = decoder.next_sequence()? {
            let room = expected - indices.len();
            if sequence.len() > room {
                indices.extend_from_slice(&sequence[..room]);
                discarded += sequence.len() - room;
            } else {
                indices.extend_from_slice(sequence);
            }
        }

        let skipped = blocks.drain()?;
        if skipped > 0 {
            debug!("skipped {} bytes of image data after the end code", skipped);
        }
        if discarded > 0 {
            warn!("image data held {} indices more than its {} pixels", discarded, expected);
        }
        if indices.len() < expected {
            debug!("image data ended after {} of {} pixels", indices.len(), expected);
        }

        Ok(Self {
            descriptor,
            local_palette,
            control,
            min_code_size,
            indices: indices.into_boxed_slice(),
            deinterlace: options.deinterlace,
        })
    }

    pub fn width(&self) -> u16 {
        self.descriptor.width
    }

    pub fn height(&self) -> u16 {
        self.descriptor.height
    }

    pub fn left(&self) -> u16 {
        self.descriptor.left_position
    }

    pub fn top(&self) -> u16 {
        self.descriptor.top_position
    }

    pub fn delay_time(&self) -> u16 {
        self.control.map_or(0, |control| control.delay_time)
    }

    pub fn transparent_color_index(&self) -> Option<u8> {
        self.control.and_then(|control| control.transparent_color_index)
    }

    pub fn disposal_method(&self) -> DisposalMethod {
        self.control.map(|control| control.disposal_method).unwrap_or_default()
    }

    /// Decoded color indices in stream order. May be shorter than
    /// `width * height` when the data ended early.
    pub fn indicies(&self) -> &[u8] {
        &self.indices
    }

    /// Absolute `(x, y, color index)` for every decoded index, in stream
    /// order.
    pub fn pixels(&self) -> Pixels<'_> {
        Pixels {
            frame: self,
            position: 0,
        }
    }

    fn row_of(&self, stream_row: usize) -> usize {
        if self.deinterlace && self.descriptor.interlace_flag {
            interlaced_row(stream_row, self.descriptor.height as usize)
        } else {
            stream_row
        }
    }
}

/// Maps the n-th row of an interlaced stream to its row in the image.
fn interlaced_row(mut row: usize, height: usize) -> usize {
    for (start, step) in INTERLACE_PASSES {
        let rows = if height > start {
            (height - start + step - 1) / step
        } else {
            0
        };
        if row < rows {
            return start + row * step;
        }
        row -= rows;
    }
    row
}

pub struct Pixels<'a> {
    frame: &'a Frame,
    position: usize,
}

impl<'a> Iterator for Pixels<'a> {
    type Item = (u32, u32, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let color_index = *self.frame.indices.get(self.position)?;
        // indices are only ever stored for frames with a non-zero width
        let width = self.frame.width() as usize;
        let x = self.position % width;
        let y = self.frame.row_of(self.position / width);
        self.position += 1;

        Some((
            self.frame.left() as u32 + x as u32,
            self.frame.top() as u32 + y as u32,
            color_index,
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.frame.indices.len() - self.position;
        (size, Some(size))
    }
}

impl<'a> ExactSizeIterator for Pixels<'a> {}
