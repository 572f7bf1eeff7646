// src/common/frame.rs

use super::crc::verify_word;
use super::error::{CrcMismatch, DecodeError};

/// Bytes per word on the wire: two data bytes followed by their CRC.
pub const WORD_SIZE: usize = 3;
/// Data bytes carried by one word.
pub const WORD_DATA_SIZE: usize = 2;

/// A response exactly as read from the bus.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawFrame<'a>(&'a [u8]);

impl<'a> RawFrame<'a> {
    /// Wraps a response, rejecting lengths that do not split into whole words.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        if bytes.len() % WORD_SIZE != 0 {
            return Err(DecodeError::Length {
                expected: bytes.len() - bytes.len() % WORD_SIZE + WORD_SIZE,
                got: bytes.len(),
            });
        }
        Ok(RawFrame(bytes))
    }

    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of 3-byte words in the frame.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.0.len() / WORD_SIZE
    }

    /// Iterates the words, each checked against its CRC byte.
    pub fn words(&self) -> impl Iterator<Item = Result<[u8; 2], CrcMismatch>> + 'a {
        let bytes: &'a [u8] = self.0;
        bytes.chunks_exact(WORD_SIZE).map(|chunk| {
            // chunks_exact guarantees the length
            verify_word(&[chunk[0], chunk[1], chunk[2]])
        })
    }

    /// Collects the data bytes of every word, stopping at the first bad checksum.
    pub fn data(&self) -> Result<Vec<u8>, CrcMismatch> {
        let mut data = Vec::with_capacity(self.word_count() * WORD_DATA_SIZE);
        for word in self.words() {
            data.extend_from_slice(&word?);
        }
        Ok(data)
    }

    /// Sub-frame for a byte range that starts and ends on word boundaries.
    pub fn slice(&self, range: core::ops::Range<usize>) -> Result<RawFrame<'a>, DecodeError> {
        let got = self.0.len();
        let bytes = self.0.get(range.clone()).ok_or(DecodeError::Length {
            expected: range.end,
            got,
        })?;
        RawFrame::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_partial_words() {
        assert!(RawFrame::new(&[]).is_ok());
        assert!(RawFrame::new(&[0x00, 0x01, 0xB0]).is_ok());
        assert_eq!(
            RawFrame::new(&[0x00, 0x01, 0xB0, 0x00]),
            Err(DecodeError::Length { expected: 6, got: 4 })
        );
    }

    #[test]
    fn test_data_collects_all_words() {
        let bytes = [0xBE, 0xEF, 0x92, 0x00, 0x01, 0xB0];
        let frame = RawFrame::new(&bytes).unwrap();
        assert_eq!(frame.word_count(), 2);
        assert_eq!(frame.data(), Ok(vec![0xBE, 0xEF, 0x00, 0x01]));
    }

    #[test]
    fn test_data_stops_at_first_bad_word() {
        let bytes = [0xBE, 0xEF, 0x92, 0x00, 0x01, 0xB1, 0x00, 0x00, 0x00];
        let frame = RawFrame::new(&bytes).unwrap();
        let err = frame.data().unwrap_err();
        assert_eq!(err.data, [0x00, 0x01]);
        assert_eq!(err.received, 0xB1);
    }

    #[test]
    fn test_slice_bounds() {
        let bytes = [0u8; 9];
        let frame = RawFrame::new(&bytes).unwrap();
        assert_eq!(frame.slice(3..9).unwrap().len(), 6);
        assert_eq!(frame.slice(6..12), Err(DecodeError::Length { expected: 12, got: 9 }));
    }
}
