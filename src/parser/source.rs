use super::{ParserError, Result};

use std::io::{ErrorKind, Read};

/// The single read cursor shared by every stage of the decoder.
///
/// Bytes are consumed strictly front to back. Running out of input in the
/// middle of a record is reported as [`ParserError::TruncatedStream`] with
/// the name of the record being read.
#[derive(Debug)]
pub struct ByteSource<R: Read> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_byte(&mut self, context: &'static str) -> Result<u8> {
        let mut buffer = [0; 1];
        self.read_exact(&mut buffer, context)?;
        Ok(buffer[0])
    }

    /// Like [`read_byte`](Self::read_byte), but a clean end of input is
    /// `Ok(None)` instead of an error.
    pub fn try_read_byte(&mut self) -> Result<Option<u8>> {
        let mut buffer = [0; 1];
        loop {
            match self.inner.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buffer[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16> {
        // multi-byte numeric fields are ordered least significant byte first
        let mut buffer = [0; 2];
        self.read_exact(&mut buffer, context)?;
        Ok(u16::from_le_bytes(buffer))
    }

    pub fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut buffer = [0; N];
        self.read_exact(&mut buffer, context)?;
        Ok(buffer)
    }

    pub fn read_bytes(&mut self, count: usize, context: &'static str) -> Result<Box<[u8]>> {
        let mut buffer = vec![0; count];
        self.read_exact(&mut buffer, context)?;
        Ok(buffer.into_boxed_slice())
    }

    pub fn read_exact(&mut self, buffer: &mut [u8], context: &'static str) -> Result<()> {
        match self.inner.read_exact(buffer) {
            Ok(()) => {
                self.position += buffer.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(ParserError::TruncatedStream { context })
            }
            Err(e) => Err(e.into()),
        }
    }
}
