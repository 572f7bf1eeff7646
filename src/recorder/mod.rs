// src/recorder/mod.rs

// Background sampling: the poller thread and the buffer it fills.
pub mod buffer;
pub mod poller;

pub use buffer::{MeasurementBuffer, CAPACITY};
pub use poller::{PollPlan, PollState, Poller, PollerHandle, StopSignal};
