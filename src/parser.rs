mod bit_reader;
mod decoder;
mod dictionary;
mod frame;
mod lzw;
mod source;
mod sub_block;
#[cfg(test)]
pub(crate) mod test_utils;

pub use decoder::{
    decode, decode_with_options, DecodeOptions, DecodeSummary, Decoder, LoopCount, Screen, Version,
};
pub use dictionary::{CodeDictionary, Decoded, MAX_CODE_LEN};
pub use frame::{Frame, GraphicControl, ImageDescriptor, Palette, Pixels};
pub use lzw::{lzw_decode, LzwDecoder};
pub use source::ByteSource;
pub use sub_block::SubBlocks;

use thiserror::Error;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    #[default]
    Unspecified = 0,
    DoNotDispose = 1,
    RestoreToBackgroundColor = 2,
    RestoreToPrevious = 3,
}

impl DisposalMethod {
    /// Values 4-7 are reserved by the format and behave like `Unspecified`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => DisposalMethod::DoNotDispose,
            2 => DisposalMethod::RestoreToBackgroundColor,
            3 => DisposalMethod::RestoreToPrevious,
            _ => DisposalMethod::Unspecified,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("signature is invalid, expected GIF but got {0:?}")]
    InvalidSignature(String),

    #[error("version {0:?} in the header is unsupported")]
    UnsupportedVersion(String),

    #[error("unrecognized block type 0x{0:02x}")]
    UnrecognizedBlockType(u8),

    #[error("minimum code size {0} is outside the supported range 1..=8")]
    InvalidMinCodeSize(u8),

    #[error("frame of {width}x{height} exceeds the limit of {limit} pixels")]
    FrameTooLarge { width: u16, height: u16, limit: usize },

    #[error("source ended while reading {context}")]
    TruncatedStream { context: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ParserError {
    /// True for errors caused by bytes that do not follow the container
    /// format, as opposed to a source that ended early or failed.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ParserError::InvalidSignature(_)
                | ParserError::UnsupportedVersion(_)
                | ParserError::UnrecognizedBlockType(_)
                | ParserError::InvalidMinCodeSize(_)
                | ParserError::FrameTooLarge { .. }
        )
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, ParserError::TruncatedStream { .. })
    }
}

pub type Result<T> = std::result::Result<T, ParserError>;

/// Receives the pixels of every decoded frame.
///
/// `begin_frame` is called once per image block before any of its pixels,
/// then `write_pixel` once per decoded index with absolute screen
/// coordinates, then `end_frame`. A frame is only handed to the sink after
/// it decoded completely.
pub trait PixelSink {
    fn begin_frame(&mut self, _frame: &Frame) {}

    fn write_pixel(&mut self, x: u32, y: u32, color_index: u8);

    fn end_frame(&mut self, _frame: &Frame) {}
}

impl<F> PixelSink for F
where
    F: FnMut(u32, u32, u8),
{
    fn write_pixel(&mut self, x: u32, y: u32, color_index: u8) {
        self(x, y, color_index)
    }
}
