// src/recorder/buffer.rs

use heapless::Deque;
use parking_lot::Mutex;

use crate::common::response::Measurement;

/// Entries the buffer holds before the oldest one is overwritten.
pub const CAPACITY: usize = 20;

/// A published sample: a complete record, or `None` for a cycle whose
/// response failed validation.
pub type Entry = Option<Measurement>;

/// Bounded FIFO shared between the poller (producer) and the caller (consumer).
///
/// The producer never blocks: pushing into a full buffer drops the oldest entry.
#[derive(Debug)]
pub struct MeasurementBuffer {
    entries: Mutex<Deque<Entry, CAPACITY>>,
}

impl Default for MeasurementBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementBuffer {
    pub fn new() -> Self {
        MeasurementBuffer { entries: Mutex::new(Deque::new()) }
    }

    /// Appends `entry`, returning the entry it evicted if the buffer was full.
    pub fn push(&self, entry: Entry) -> Option<Entry> {
        let mut entries = self.entries.lock();
        let evicted = if entries.is_full() { entries.pop_front() } else { None };
        // Room was made above.
        let _ = entries.push_back(entry);
        evicted
    }

    /// Removes and returns the oldest entry.
    pub fn pop(&self) -> Option<Entry> {
        self.entries.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::response::{FieldGroup, FieldValue};
    use chrono::Local;

    fn record(value: f64) -> Entry {
        Some(Measurement {
            timestamp: Local::now(),
            groups: vec![FieldGroup {
                name: "co2",
                unit: "ppm",
                values: vec![FieldValue { name: "co2", value }],
            }],
        })
    }

    fn value(entry: Entry) -> Option<f64> {
        entry?.value("co2", "co2")
    }

    #[test]
    fn test_fifo_order() {
        let buffer = MeasurementBuffer::new();
        assert!(buffer.is_empty());
        buffer.push(record(1.0));
        buffer.push(None);
        buffer.push(record(3.0));
        assert_eq!(buffer.len(), 3);

        assert_eq!(buffer.pop().map(value), Some(Some(1.0)));
        assert_eq!(buffer.pop(), Some(None));
        assert_eq!(buffer.pop().map(value), Some(Some(3.0)));
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let buffer = MeasurementBuffer::new();
        for i in 0..CAPACITY {
            assert!(buffer.push(record(i as f64)).is_none());
        }
        let evicted = buffer.push(record(20.0)).expect("Full buffer should evict");
        assert_eq!(value(evicted), Some(0.0));
        assert_eq!(buffer.len(), CAPACITY);

        let drained: Vec<_> = std::iter::from_fn(|| buffer.pop()).map(value).collect();
        assert_eq!(drained.len(), CAPACITY);
        assert_eq!(drained.first(), Some(&Some(1.0)));
        assert_eq!(drained.last(), Some(&Some(20.0)));
        assert!(!drained.contains(&Some(0.0)));
    }

    #[test]
    fn test_clear() {
        let buffer = MeasurementBuffer::default();
        buffer.push(None);
        buffer.clear();
        assert!(buffer.pop().is_none());
    }
}
