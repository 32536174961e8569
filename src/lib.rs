//! Pull based decoder for animated GIF images.
//!
//! The decoder reads from any [`std::io::Read`] and hands every frame to a
//! [`PixelSink`] as `(x, y, color index)` writes. Mapping indices to colors,
//! pacing frames by their delay and putting pixels on a display are left to
//! the caller; [`Canvas`] is a ready made sink that composites frames the way
//! a viewer would.
//!
//! ```
//! let gif = [
//!     0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
//!     0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44,
//!     0x01, 0x00, 0x3b,
//! ];
//!
//! let mut writes = Vec::new();
//! let summary = gifpull::decode(&gif[..], &mut |x: u32, y: u32, index: u8| {
//!     writes.push((x, y, index))
//! })?;
//!
//! assert_eq!(summary.frame_count, 1);
//! assert_eq!(writes, [(0, 0, 0)]);
//! # Ok::<(), gifpull::ParserError>(())
//! ```

pub mod canvas;
pub mod parser;

pub use canvas::Canvas;
pub use parser::{
    decode, decode_with_options, DecodeOptions, DecodeSummary, Decoder, DisposalMethod, Frame,
    Palette, ParserError, PixelSink, Screen,
};
