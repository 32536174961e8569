use super::bit_reader::BitReader;
use super::dictionary::{CodeDictionary, Decoded};
use super::{ParserError, Result};

use log::debug;

/// Pulls codes from a byte stream and expands them through a
/// [`CodeDictionary`].
///
/// The decoder ends quietly when the end code is read or when the bytes run
/// out, even in the middle of a code. Errors coming from the byte stream
/// itself are passed through.
pub struct LzwDecoder<I> {
    reader: BitReader<I>,
    dictionary: CodeDictionary,
    finished: bool,
}

impl<I> LzwDecoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// `min_code_size` has to be in `1..=8`.
    pub fn new(bytes: I, min_code_size: u8) -> Self {
        Self {
            reader: BitReader::new(bytes),
            dictionary: CodeDictionary::new(min_code_size),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the next decoded sequence, or `None` once the stream is over.
    /// Clear codes and codes that resolve to nothing are consumed without
    /// producing anything.
    pub fn next_sequence(&mut self) -> Result<Option<&[u8]>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            let code_len = self.dictionary.code_len() as u32;
            let Some(code) = self.reader.next(code_len)? else {
                debug!("lzw data ran out before the end code");
                self.finished = true;
                return Ok(None);
            };

            // the sequence is fetched again after the loop so no borrow of
            // the dictionary outlives an iteration
            match self.dictionary.decode(code) {
                Decoded::Cleared | Decoded::Empty => continue,
                Decoded::EndOfData => {
                    self.finished = true;
                    return Ok(None);
                }
                Decoded::Sequence(_) => break,
            }
        }

        Ok(self.dictionary.last_sequence())
    }

    /// Decodes everything that is left, appending it to `out`.
    pub fn decode_into(&mut self, out: &mut Vec<u8>) -> Result<()> {
        while let Some(sequence) = self.next_sequence()? {
            out.extend_from_slice(sequence);
        }
        Ok(())
    }
}

/// Decodes a flat buffer of LZW codes in one go.
pub fn lzw_decode(buf: &[u8], min_code_size: u8) -> Result<Vec<u8>> {
    if !(1..=8).contains(&min_code_size) {
        return Err(ParserError::InvalidMinCodeSize(min_code_size));
    }

    let mut decoder = LzwDecoder::new(buf.iter().map(|&b| Ok(b)), min_code_size);
    let mut indicies = Vec::new();
    decoder.decode_into(&mut indicies)?;
    Ok(indicies)
}
