use super::frame::color_table_len;
use super::{ByteSource, Frame, GraphicControl, Palette, ParserError, PixelSink, Result, SubBlocks};

use log::{debug, info, warn};

use std::io::prelude::*;

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
const TRAILER_LABEL: u8 = 0x3b;
const PADDING: u8 = 0x00;

// Extension labels
const APPLICATION_EXTENSION: u8 = 0xff;
const COMMENT_EXTENSION: u8 = 0xfe;
const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
const PLAIN_TEXT_EXTENSION: u8 = 0x01;

const LOOPING_APPLICATIONS: [&[u8; 11]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Unknown(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        match value {
            APPLICATION_EXTENSION => ExtensionType::Application,
            COMMENT_EXTENSION => ExtensionType::Comment,
            GRAPHIC_CONTROL_EXTENSION => ExtensionType::GraphicControl,
            PLAIN_TEXT_EXTENSION => ExtensionType::PlainText,
            label => ExtensionType::Unknown(label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V87a,
    V89a,
}

impl TryFrom<&[u8]> for Version {
    type Error = ParserError;

    fn try_from(value: &[u8]) -> std::result::Result<Self, Self::Error> {
        match value {
            b"87a" => Ok(Version::V87a),
            b"89a" => Ok(Version::V89a),
            version => Err(ParserError::UnsupportedVersion(
                String::from_utf8_lossy(version).into_owned(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Number(u16),
}

/// The logical screen descriptor and the global color table.
#[derive(Debug, Clone)]
pub struct Screen {
    pub version: Version,
    pub screen_width: u16,
    pub screen_height: u16,
    pub color_resolution: u8,
    pub sort_flag: bool,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
    pub global_palette: Option<Palette>,
}

/// Knobs for [`Decoder`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub(crate) deinterlace: bool,
    pub(crate) require_trailer: bool,
    pub(crate) max_frame_pixels: Option<usize>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            deinterlace: true,
            require_trailer: false,
            max_frame_pixels: Some(1 << 25),
        }
    }
}

impl DecodeOptions {
    /// Put the rows of interlaced images in image order. When off, rows are
    /// written in the order they are stored.
    pub fn deinterlace(mut self, deinterlace: bool) -> Self {
        self.deinterlace = deinterlace;
        self
    }

    /// Treat input that ends without a trailer as truncated instead of
    /// finishing quietly.
    pub fn require_trailer(mut self, require_trailer: bool) -> Self {
        self.require_trailer = require_trailer;
        self
    }

    /// Largest `width * height` accepted for a single image.
    pub fn max_frame_pixels(mut self, max_frame_pixels: Option<usize>) -> Self {
        self.max_frame_pixels = max_frame_pixels;
        self
    }
}

#[derive(Debug)]
enum ParserState {
    ProcessMagic,
    ProcessLogicalScreenDescriptor(Version),
    ProcessGlobalColorTable(Screen, usize),
    ProcessTrailer,

    DetermineNextBlock(Option<GraphicControl>),
    ProcessExtension(u8, Option<GraphicControl>),
    ProcessImage(Option<GraphicControl>),

    Done,
}

/// Pull based GIF decoder.
///
/// Frames are decoded one at a time with [`next_frame`](Decoder::next_frame)
/// (or by iterating the decoder). Each call reads just enough of the source
/// to produce the next frame. After an error the decoder is finished.
#[derive(Debug)]
pub struct Decoder<R: Read> {
    source: ByteSource<R>,
    options: DecodeOptions,
    state: ParserState,
    screen: Option<Screen>,
    loop_count: Option<LoopCount>,
    comments: Vec<Box<[u8]>>,
    ready: Option<Frame>,
}

impl<R: Read> Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, DecodeOptions::default())
    }

    pub fn with_options(inner: R, options: DecodeOptions) -> Self {
        Self {
            source: ByteSource::new(inner),
            options,
            state: ParserState::ProcessMagic,
            screen: None,
            loop_count: None,
            comments: Vec::new(),
            ready: None,
        }
    }

    /// Reads the header and global color table if that has not happened yet.
    pub fn read_info(&mut self) -> Result<&Screen> {
        while self.screen.is_none() {
            self.step()?;
            if let ParserState::Done = self.state {
                break;
            }
        }

        // a finished decoder without a screen failed on the header earlier
        self.screen.as_ref().ok_or(ParserError::TruncatedStream {
            context: "header",
        })
    }

    /// Decodes the next image. Returns `Ok(None)` after the trailer.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let ParserState::Done = self.state {
                return Ok(None);
            }

            self.step()?;
            if let Some(frame) = self.ready.take() {
                return Ok(Some(frame));
            }
        }
    }

    pub fn screen(&self) -> Option<&Screen> {
        self.screen.as_ref()
    }

    pub fn global_palette(&self) -> Option<&Palette> {
        self.screen.as_ref()?.global_palette.as_ref()
    }

    /// Loop count from a NETSCAPE2.0 application extension, once one has
    /// been read.
    pub fn loop_count(&self) -> Option<LoopCount> {
        self.loop_count
    }

    pub fn comments(&self) -> &[Box<[u8]>] {
        &self.comments
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.source.position()
    }

    pub fn into_inner(self) -> R {
        self.source.into_inner()
    }

    fn step(&mut self) -> Result<()> {
        // a failing state leaves the decoder in Done
        let state = std::mem::replace(&mut self.state, ParserState::Done);
        debug!("begin parsing state {:?}", state);

        self.state = self.process_next_state(state)?;
        Ok(())
    }

    fn process_next_state(&mut self, next_state: ParserState) -> Result<ParserState> {
        use ParserState::*;

        match next_state {
            ProcessMagic => {
                let magic: [u8; 6] = self.source.read_array("signature")?;
                if &magic[..3] != b"GIF" {
                    return Err(ParserError::InvalidSignature(
                        String::from_utf8_lossy(&magic[..3]).into_owned(),
                    ));
                }

                let version = Version::try_from(&magic[3..])?;
                debug!("processed signature, got {:?}", version);

                Ok(ProcessLogicalScreenDescriptor(version))
            }
            ProcessLogicalScreenDescriptor(version) => {
                let context = "logical screen descriptor";
                let screen_width = self.source.read_u16(context)?;
                let screen_height = self.source.read_u16(context)?;

                let packed_fields = self.source.read_byte(context)?;

                // packed field start
                let global_color_table_flag = packed_fields & 0b10000000 != 0;
                let color_resolution = ((packed_fields >> 4) & 0b00000111) + 1;
                let sort_flag = packed_fields & 0b00001000 != 0;
                // packed field end

                let background_color_index = self.source.read_byte(context)?;
                let pixel_aspect_ratio = self.source.read_byte(context)?;

                let screen = Screen {
                    version,
                    screen_width,
                    screen_height,
                    color_resolution,
                    sort_flag,
                    background_color_index,
                    pixel_aspect_ratio,
                    global_palette: None,
                };
                debug!("processed logical screen descriptor, got: {:?}", screen);

                if global_color_table_flag {
                    Ok(ProcessGlobalColorTable(screen, color_table_len(packed_fields)))
                } else {
                    self.screen = Some(screen);
                    Ok(DetermineNextBlock(None))
                }
            }
            ProcessGlobalColorTable(mut screen, len) => {
                screen.global_palette = Some(Palette::read(&mut self.source, len, "global color table")?);
                debug!("processed global color table with {} colors", len);

                self.screen = Some(screen);
                Ok(DetermineNextBlock(None))
            }
            ProcessTrailer => {
                debug!("reached trailer at offset {}", self.source.position());
                Ok(Done)
            }
            DetermineNextBlock(graphic_control) => {
                let Some(introducer_or_label) = self.source.try_read_byte()? else {
                    if self.options.require_trailer {
                        return Err(ParserError::TruncatedStream { context: "block type" });
                    }
                    warn!("source ended without a trailer");
                    return Ok(Done);
                };

                match introducer_or_label {
                    // extension introducer means that a label follows determining what exact type
                    // of extension it is.
                    EXTENSION_INTRODUCER => {
                        let label = self.source.read_byte("extension label")?;
                        Ok(ProcessExtension(label, graphic_control))
                    }
                    IMAGE_DESCRIPTOR_LABEL => Ok(ProcessImage(graphic_control)),
                    TRAILER_LABEL => Ok(ProcessTrailer),
                    PADDING => Ok(DetermineNextBlock(graphic_control)),
                    label => Err(ParserError::UnrecognizedBlockType(label)),
                }
            }
            ProcessExtension(label, graphic_control) => {
                self.process_extension(ExtensionType::from(label), graphic_control)
            }
            ProcessImage(graphic_control) => {
                let frame = Frame::read(&mut self.source, graphic_control, &self.options)?;
                info!(
                    "decoded {}x{} frame at ({}, {}), delay {}",
                    frame.width(),
                    frame.height(),
                    frame.left(),
                    frame.top(),
                    frame.delay_time()
                );
                self.ready = Some(frame);

                Ok(DetermineNextBlock(None))
            }
            Done => Ok(Done),
        }
    }

    fn process_extension(
        &mut self,
        label: ExtensionType,
        graphic_control: Option<GraphicControl>,
    ) -> Result<ParserState> {
        debug!("processing extension type: {:?}", label);
        let payload = SubBlocks::new(&mut self.source).collect_payload()?;

        match label {
            ExtensionType::GraphicControl => match GraphicControl::from_payload(&payload) {
                Some(control) => {
                    debug!("processed GraphicControlExtension: {:?}", control);
                    return Ok(ParserState::DetermineNextBlock(Some(control)));
                }
                None => warn!(
                    "graphic control extension with {} bytes is too short, ignoring it",
                    payload.len()
                ),
            },
            ExtensionType::Application => self.process_application(&payload),
            ExtensionType::Comment => {
                debug!("processed comment block, got: {}", String::from_utf8_lossy(&payload));
                self.comments.push(payload.into_boxed_slice());
            }
            ExtensionType::PlainText => {
                // plain text is a rendering block of its own and uses up any
                // graphic control extension before it
                debug!("skipped plain text extension");
                return Ok(ParserState::DetermineNextBlock(None));
            }
            ExtensionType::Unknown(label) => {
                debug!("skipped unknown extension 0x{:02x} of {} bytes", label, payload.len());
            }
        }

        Ok(ParserState::DetermineNextBlock(graphic_control))
    }

    fn process_application(&mut self, payload: &[u8]) {
        // 11 bytes of identifier and authentication code, then the data
        // sub-blocks
        let Some((identifier, data)) = payload.split_first_chunk::<11>() else {
            debug!("skipped application extension of {} bytes", payload.len());
            return;
        };

        match data {
            [1, low, high, ..] if LOOPING_APPLICATIONS.contains(&identifier) => {
                self.loop_count = Some(match u16::from_le_bytes([*low, *high]) {
                    0 => LoopCount::Infinite,
                    number => LoopCount::Number(number),
                });
                debug!("processed looping extension, got: {:?}", self.loop_count);
            }
            _ => debug!(
                "skipped application extension {}",
                String::from_utf8_lossy(identifier)
            ),
        }
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// What a call to [`decode`] went through.
#[derive(Debug, Clone)]
pub struct DecodeSummary {
    pub screen: Screen,
    pub frame_count: usize,
    /// Sum of all frame delays, in hundredths of a second.
    pub total_delay: u32,
    pub loop_count: Option<LoopCount>,
}

/// Decodes a whole GIF, writing every frame into `sink`.
///
/// A frame reaches the sink only once it decoded without error, so a failure
/// never leaves half a frame behind.
pub fn decode<R, S>(reader: R, sink: &mut S) -> Result<DecodeSummary>
where
    R: Read,
    S: PixelSink + ?Sized,
{
    decode_with_options(reader, sink, DecodeOptions::default())
}

pub fn decode_with_options<R, S>(
    reader: R,
    sink: &mut S,
    options: DecodeOptions,
) -> Result<DecodeSummary>
where
    R: Read,
    S: PixelSink + ?Sized,
{
    let mut decoder = Decoder::with_options(reader, options);
    let screen = decoder.read_info()?.clone();

    let mut frame_count = 0;
    let mut total_delay = 0;
    while let Some(frame) = decoder.next_frame()? {
        sink.begin_frame(&frame);
        for (x, y, color_index) in frame.pixels() {
            sink.write_pixel(x, y, color_index);
        }
        sink.end_frame(&frame);

        frame_count += 1;
        total_delay += frame.delay_time() as u32;
    }

    Ok(DecodeSummary {
        screen,
        frame_count,
        total_delay,
        loop_count: decoder.loop_count(),
    })
}
