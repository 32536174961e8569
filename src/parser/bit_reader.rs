use super::Result;

/// Reads variable width codes packed least significant bit first.
///
/// Bytes are pulled from the underlying iterator only when the bits already
/// buffered cannot satisfy the requested width.
pub struct BitReader<I> {
    bytes: I,
    // bits not yet handed out, lowest bit first
    buffer: u32,
    available: u32,
}

impl<I> BitReader<I>
where
    I: Iterator<Item = Result<u8>>,
{
    pub fn new(bytes: I) -> Self {
        Self {
            bytes,
            buffer: 0,
            available: 0,
        }
    }

    /// Returns the next `count` bits (at most 16) as a code, or `None` when
    /// the bytes run out before the code is complete.
    pub fn next(&mut self, count: u32) -> Result<Option<u16>> {
        debug_assert!(count <= 16);

        while self.available < count {
            match self.bytes.next() {
                Some(byte) => {
                    self.buffer |= (byte? as u32) << self.available;
                    self.available += 8;
                }
                None => return Ok(None),
            }
        }

        let value = self.buffer & ((1 << count) - 1);
        self.buffer >>= count;
        self.available -= count;
        Ok(Some(value as u16))
    }
}
