// src/lib.rs

//! Drivers for Sensirion SPS30 and SCD30 sensors on I2C.
//!
//! Each [`Sensor`] validates every response word against its CRC-8, decodes
//! IEEE-754 fields into grouped [`Measurement`]s, and samples continuously on
//! a background thread into a bounded buffer.

pub mod common;
pub mod recorder;
pub mod sensor;

// Re-export key types for convenience
pub use common::{BusTransport, Checked, I2cTransport, Measurement, SensorError};
pub use recorder::StopSignal;
pub use sensor::{Scd30, Scd30Settings, Sensor, SensorConfig, SensorFamily, Sps30};
