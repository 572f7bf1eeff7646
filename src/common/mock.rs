// src/common/mock.rs

//! Scripted bus transport and frame builders shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::crc::encode_word;
use super::hal_traits::{BusTransport, Clock};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MockError {
    /// Injected write failure.
    Nack,
    /// Transport used after `close`.
    Closed,
    /// Read with no scripted response for the last opcode.
    NoResponse(Option<u16>),
    /// Scripted response has a different length than the read buffer.
    ShortResponse { expected: usize, got: usize },
}

#[derive(Debug, Default)]
struct BusState {
    /// Responses per opcode. The last one is repeated once the queue is drained to it.
    responses: HashMap<u16, VecDeque<Vec<u8>>>,
    writes: Vec<Vec<u8>>,
    last_opcode: Option<u16>,
    failing_writes: usize,
    closed: bool,
}

/// In-memory transport. Clones share state, so a test can keep one clone to
/// script and inspect while the sensor owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `bytes` as the answer to the next read after `opcode` is written.
    pub fn respond(&self, opcode: u16, bytes: impl Into<Vec<u8>>) -> &Self {
        self.state.lock().responses.entry(opcode).or_default().push_back(bytes.into());
        self
    }

    /// Makes the next `count` writes fail with [`MockError::Nack`].
    pub fn fail_next_writes(&self, count: usize) {
        self.state.lock().failing_writes = count;
    }

    /// Every frame written so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Opcodes of every frame written so far.
    pub fn opcodes(&self) -> Vec<u16> {
        self.state
            .lock()
            .writes
            .iter()
            .filter_map(|w| (w.len() >= 2).then(|| u16::from_be_bytes([w[0], w[1]])))
            .collect()
    }

    pub fn count(&self, opcode: u16) -> usize {
        self.opcodes().into_iter().filter(|&op| op == opcode).count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl BusTransport for MockBus {
    type Error = MockError;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MockError::Closed);
        }
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(MockError::Nack);
        }
        state.last_opcode = (bytes.len() >= 2).then(|| u16::from_be_bytes([bytes[0], bytes[1]]));
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MockError::Closed);
        }
        let opcode = state.last_opcode;
        let queue = opcode
            .and_then(|op| state.responses.get_mut(&op))
            .filter(|q| !q.is_empty())
            .ok_or(MockError::NoResponse(opcode))?;
        let response = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        if response.len() != buffer.len() {
            return Err(MockError::ShortResponse { expected: buffer.len(), got: response.len() });
        }
        buffer.copy_from_slice(&response);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.state.lock().closed = true;
        Ok(())
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Copy, Clone)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Words with their CRC bytes, back to back.
pub fn words(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|&v| encode_word(v)).collect()
}

/// Packs byte pairs into CRC-protected words, padding an odd tail with NUL.
pub fn ascii_words(text: &[u8], total_words: usize) -> Vec<u8> {
    let mut padded = text.to_vec();
    padded.resize(total_words * 2, 0);
    let values: Vec<u16> = padded.chunks(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
    words(&values)
}

/// One float field on the wire: two words, each with its CRC.
pub fn float_field(value: f32) -> [u8; 6] {
    let bits = value.to_bits();
    let hi = encode_word((bits >> 16) as u16);
    let lo = encode_word(bits as u16);
    [hi[0], hi[1], hi[2], lo[0], lo[1], lo[2]]
}

pub fn frame_from_floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|&v| float_field(v)).collect()
}

/// Data-ready response word.
pub fn ready(flag: bool) -> Vec<u8> {
    words(&[flag as u16])
}
