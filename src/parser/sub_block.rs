use super::{ByteSource, Result};

use log::trace;
use std::io::Read;

const MAX_SUB_BLOCK_SIZE: usize = 255;

/// Flattens a sequence of data sub-blocks into a lazy stream of bytes.
///
/// Each sub-block is a size byte followed by that many bytes of payload, and
/// the sequence is closed by a zero size byte. One sub-block is buffered at a
/// time. The iterator ends at the terminator; if the source runs out first it
/// yields a single `TruncatedStream` error and then stops.
pub struct SubBlocks<'a, R: Read> {
    source: &'a mut ByteSource<R>,
    buffer: [u8; MAX_SUB_BLOCK_SIZE],
    len: usize,
    pos: usize,
    done: bool,
}

impl<'a, R: Read> SubBlocks<'a, R> {
    pub fn new(source: &'a mut ByteSource<R>) -> Self {
        Self {
            source,
            buffer: [0; MAX_SUB_BLOCK_SIZE],
            len: 0,
            pos: 0,
            done: false,
        }
    }

    /// True once the terminating zero-size sub-block was consumed (or an
    /// error ended the stream).
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Skips whatever is left of the stream, terminator included, and
    /// returns how many payload bytes were thrown away.
    pub fn drain(&mut self) -> Result<usize> {
        let mut skipped = self.len - self.pos;
        self.pos = self.len;
        while self.fill()? {
            skipped += self.len;
            self.pos = self.len;
        }
        Ok(skipped)
    }

    /// Reads the remaining payload into one buffer.
    pub fn collect_payload(mut self) -> Result<Vec<u8>> {
        let mut payload = self.buffer[self.pos..self.len].to_vec();
        self.pos = self.len;
        while self.fill()? {
            payload.extend_from_slice(&self.buffer[..self.len]);
            self.pos = self.len;
        }
        Ok(payload)
    }

    /// Loads the next sub-block. Returns false at the terminator.
    fn fill(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        let size = match self.source.read_byte("sub-block size") {
            Ok(size) => size as usize,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        if size == 0 {
            trace!("sub-block terminator at offset {}", self.source.position() - 1);
            self.done = true;
            return Ok(false);
        }

        if let Err(e) = self.source.read_exact(&mut self.buffer[..size], "sub-block data") {
            self.done = true;
            return Err(e);
        }
        self.len = size;
        self.pos = 0;
        Ok(true)
    }
}

impl<'a, R: Read> Iterator for SubBlocks<'a, R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos == self.len {
            match self.fill() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }

        let byte = self.buffer[self.pos];
        self.pos += 1;
        Some(Ok(byte))
    }
}
