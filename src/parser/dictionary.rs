use log::{trace, warn};

/// Codes never grow wider than this many bits.
pub const MAX_CODE_LEN: u8 = 12;
const MAX_CODES: usize = 1 << MAX_CODE_LEN;

/// What a single code turned into.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// The clear code: the table was reset and nothing is output.
    Cleared,
    /// The end code. The stream is over.
    EndOfData,
    /// A code past the table with no previous sequence to extend. Nothing
    /// is output and decoding goes on.
    Empty,
    Sequence(&'a [u8]),
}

/// The adaptive code table of the variable width LZW variant.
///
/// Codes below the clear code stand for themselves, the clear and end codes
/// follow, and every code above holds a sequence learned while decoding.
/// Only the learned sequences are stored.
#[derive(Debug)]
pub struct CodeDictionary {
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    code_len: u8,
    entries: Vec<Vec<u8>>,
    last: Vec<u8>,
}

impl CodeDictionary {
    /// `min_code_size` has to be in `1..=8` so every literal fits a byte.
    pub fn new(min_code_size: u8) -> Self {
        debug_assert!((1..=8).contains(&min_code_size));

        let clear_code = 1 << min_code_size;
        Self {
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_len: min_code_size + 1,
            entries: Vec::new(),
            last: Vec::new(),
        }
    }

    pub fn reset(&mut self, min_code_size: u8) {
        debug_assert!((1..=8).contains(&min_code_size));

        self.min_code_size = min_code_size;
        self.clear_code = 1 << min_code_size;
        self.end_code = self.clear_code + 1;
        self.clear();
    }

    pub fn clear_code(&self) -> u16 {
        self.clear_code
    }

    pub fn end_code(&self) -> u16 {
        self.end_code
    }

    /// Width in bits of the next code to read.
    pub fn code_len(&self) -> u8 {
        self.code_len
    }

    /// Number of learned sequences.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// The sequence produced by the most recent code, if any since the last
    /// reset.
    pub fn last_sequence(&self) -> Option<&[u8]> {
        if self.last.is_empty() {
            None
        } else {
            Some(&self.last)
        }
    }

    /// The code the next learned sequence will get.
    fn next_code(&self) -> usize {
        self.entries.len() + self.end_code as usize + 1
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.last.clear();
        self.code_len = self.min_code_size + 1;
    }

    pub fn decode(&mut self, code: u16) -> Decoded<'_> {
        if code == self.clear_code {
            trace!("clear code, dropping {} entries", self.entries.len());
            self.clear();
            return Decoded::Cleared;
        }
        if code == self.end_code {
            self.clear();
            return Decoded::EndOfData;
        }

        let value = if code < self.clear_code {
            vec![code as u8]
        } else if (code as usize) < self.next_code() {
            self.entries[(code - self.end_code - 1) as usize].clone()
        } else if let Some(&first) = self.last.first() {
            // the encoder used the entry it was about to create
            let mut value = self.last.clone();
            value.push(first);
            value
        } else {
            warn!("code {code} refers to an empty table, skipping it");
            return Decoded::Empty;
        };

        if !self.last.is_empty() && self.next_code() < MAX_CODES {
            let mut entry = std::mem::take(&mut self.last);
            entry.push(value[0]);
            self.entries.push(entry);
        }

        if self.next_code() >= 1 << self.code_len && self.code_len < MAX_CODE_LEN {
            self.code_len += 1;
            trace!("code length grew to {} at {} entries", self.code_len, self.entries.len());
        }

        self.last = value;
        Decoded::Sequence(&self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(decoded: Decoded<'_>) -> Vec<u8> {
        match decoded {
            Decoded::Sequence(bytes) => bytes.to_vec(),
            other => panic!("expected a sequence, got {other:?}"),
        }
    }

    #[test]
    fn control_codes() {
        let dictionary = CodeDictionary::new(2);
        assert_eq!(dictionary.clear_code(), 4);
        assert_eq!(dictionary.end_code(), 5);
        assert_eq!(dictionary.code_len(), 3);

        let dictionary = CodeDictionary::new(8);
        assert_eq!(dictionary.clear_code(), 256);
        assert_eq!(dictionary.end_code(), 257);
        assert_eq!(dictionary.code_len(), 9);
    }

    #[test]
    fn literals_and_learned_entries() {
        let mut dictionary = CodeDictionary::new(2);

        assert_eq!(dictionary.decode(4), Decoded::Cleared);
        assert_eq!(sequence(dictionary.decode(1)), [1]);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(sequence(dictionary.decode(2)), [2]);
        // code 6 is now [1, 2]
        assert_eq!(dictionary.entry_count(), 1);
        assert_eq!(sequence(dictionary.decode(6)), [1, 2]);
        // code 7 is [2, 1]
        assert_eq!(sequence(dictionary.decode(7)), [2, 1]);
    }

    #[test]
    fn code_for_entry_being_created() {
        let mut dictionary = CodeDictionary::new(2);

        assert_eq!(sequence(dictionary.decode(1)), [1]);
        // 6 does not exist yet: it is the previous sequence plus its own first byte
        assert_eq!(sequence(dictionary.decode(6)), [1, 1]);
        assert_eq!(sequence(dictionary.decode(7)), [1, 1, 1]);
        assert_eq!(dictionary.entry_count(), 2);
    }

    #[test]
    fn unknown_code_after_reset_is_skipped() {
        let mut dictionary = CodeDictionary::new(2);

        assert_eq!(dictionary.decode(4), Decoded::Cleared);
        assert_eq!(dictionary.decode(6), Decoded::Empty);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(dictionary.last_sequence(), None);

        // decoding carries on and nothing was learned from the skipped code
        assert_eq!(sequence(dictionary.decode(1)), [1]);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(sequence(dictionary.decode(1)), [1]);
        assert_eq!(dictionary.entry_count(), 1);
    }

    #[test]
    fn reset_to_another_code_size() {
        let mut dictionary = CodeDictionary::new(2);
        for _ in 0..4 {
            dictionary.decode(1);
        }
        assert_eq!(dictionary.entry_count(), 3);

        dictionary.reset(3);
        assert_eq!(dictionary.clear_code(), 8);
        assert_eq!(dictionary.end_code(), 9);
        assert_eq!(dictionary.code_len(), 4);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(dictionary.last_sequence(), None);

        // 8 is now the clear code and 3 a literal
        assert_eq!(dictionary.decode(8), Decoded::Cleared);
        assert_eq!(sequence(dictionary.decode(3)), [3]);
    }

    #[test]
    fn code_len_grows_when_table_fills_width() {
        // widens once entry_count + end_code + 1 >= 2^code_len
        let mut dictionary = CodeDictionary::new(2);

        dictionary.decode(0);
        assert_eq!(dictionary.code_len(), 3);
        dictionary.decode(0);
        // entry 6
        assert_eq!(dictionary.entry_count(), 1);
        assert_eq!(dictionary.code_len(), 3);
        dictionary.decode(0);
        // entry 7 fills every 3 bit code
        assert_eq!(dictionary.entry_count(), 2);
        assert_eq!(dictionary.code_len(), 4);

        for _ in 0..8 {
            dictionary.decode(0);
        }
        // entry 15 fills every 4 bit code
        assert_eq!(dictionary.entry_count(), 10);
        assert_eq!(dictionary.code_len(), 5);
    }

    #[test]
    fn code_len_caps_at_twelve_bits() {
        let mut dictionary = CodeDictionary::new(2);

        for _ in 0..5000 {
            dictionary.decode(1);
        }
        assert_eq!(dictionary.code_len(), MAX_CODE_LEN);
        assert_eq!(dictionary.entry_count(), MAX_CODES - 6);

        // a full table still resolves its codes
        assert_eq!(sequence(dictionary.decode(4095)), [1, 1]);
        assert_eq!(dictionary.entry_count(), MAX_CODES - 6);
    }

    #[test]
    fn clear_resets_state() {
        let mut dictionary = CodeDictionary::new(2);

        for _ in 0..20 {
            dictionary.decode(3);
        }
        assert!(dictionary.code_len() > 3);

        assert_eq!(dictionary.decode(4), Decoded::Cleared);
        assert_eq!(dictionary.code_len(), 3);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(sequence(dictionary.decode(0)), [0]);
        assert_eq!(dictionary.entry_count(), 0);
    }

    #[test]
    fn end_code_resets_state() {
        let mut dictionary = CodeDictionary::new(3);

        dictionary.decode(1);
        dictionary.decode(2);
        assert_eq!(dictionary.decode(9), Decoded::EndOfData);
        assert_eq!(dictionary.entry_count(), 0);
        assert_eq!(dictionary.code_len(), 4);
    }
}
