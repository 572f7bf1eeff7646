//! Sensor command definitions.
//!
//! Both sensor families speak the same framing: a big-endian 16-bit opcode,
//! optionally followed by data words that each carry their own CRC byte. The
//! response (if any) has a fixed length per command.

use core::fmt;

use arrayvec::{ArrayVec, CapacityError};

use super::crc::encode_word;
use super::frame::WORD_SIZE;

/// Largest payload any supported command carries (the 32-bit auto-cleaning interval).
pub const MAX_PAYLOAD_WORDS: usize = 2;
/// Opcode plus the largest payload.
pub const MAX_COMMAND_LEN: usize = 2 + MAX_PAYLOAD_WORDS * WORD_SIZE;

/// Bytes written to the bus for one command.
pub type CommandBuffer = ArrayVec<u8, MAX_COMMAND_LEN>;

/// An immutable opcode / response-length pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Command {
    /// Human readable operation name, used in logs.
    pub name: &'static str,
    /// 16-bit command code, sent most significant byte first.
    pub opcode: u16,
    /// Number of bytes the sensor returns, CRC bytes included. Zero for write-only commands.
    pub response_len: usize,
}

impl Command {
    /// A command that is answered with `response_len` bytes.
    pub const fn query(name: &'static str, opcode: u16, response_len: usize) -> Self {
        Command { name, opcode, response_len }
    }

    /// A command the sensor does not answer.
    pub const fn write(name: &'static str, opcode: u16) -> Self {
        Command { name, opcode, response_len: 0 }
    }

    #[inline]
    pub const fn opcode_bytes(&self) -> [u8; 2] {
        self.opcode.to_be_bytes()
    }

    #[inline]
    pub const fn expects_response(&self) -> bool {
        self.response_len > 0
    }

    /// Number of 3-byte words in the response.
    #[inline]
    pub const fn response_words(&self) -> usize {
        self.response_len / WORD_SIZE
    }

    /// Frames the bare opcode.
    pub fn format(&self) -> CommandBuffer {
        let mut buffer = CommandBuffer::new();
        // Two bytes always fit.
        buffer.extend(self.opcode_bytes());
        buffer
    }

    /// Frames the opcode followed by CRC-protected data words.
    ///
    /// # Returns
    ///
    /// * `Ok(buffer)` ready to be written to the bus.
    /// * `Err(CapacityError)` if more than [`MAX_PAYLOAD_WORDS`] words are given.
    pub fn format_with(&self, words: &[u16]) -> Result<CommandBuffer, CapacityError> {
        let mut buffer = self.format();
        for &word in words {
            buffer.try_extend_from_slice(&encode_word(word))?;
        }
        Ok(buffer)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#06x})", self.name, self.opcode)
    }
}

/// Splits a 32-bit argument into the two words it is sent as.
#[inline]
pub const fn split_u32(value: u32) -> [u16; 2] {
    [(value >> 16) as u16, value as u16]
}
