// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod command;
pub mod crc;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod ieee754;
pub mod response;
pub mod timing;

#[cfg(test)]
pub(crate) mod mock;

// --- Re-export key types/traits/functions for easier access ---

pub use command::{Command, CommandBuffer};
pub use crc::{crc8, encode_word, verify_word};
pub use error::{Checked, CrcMismatch, DecodeError, SensorError};
pub use frame::RawFrame;
pub use hal_traits::{BusTransport, Clock, I2cTransport, SystemClock};
pub use response::{decode_frame, DecodedFrame, FieldGroup, FrameLayout, GroupLayout, Measurement};

#[cfg(feature = "linux")]
pub use hal_traits::linux::{self, LinuxTransport};
