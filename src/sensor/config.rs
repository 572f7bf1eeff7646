// src/sensor/config.rs

use core::time::Duration;

/// Bus binding and sampling cadence for one sensor instance.
///
/// `settings` holds what only one sensor family understands (e.g. the SCD30
/// ambient pressure). With the `serde` feature the config can be loaded from
/// any serde format; `sampling_period` is given in whole seconds there.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SensorConfig<S> {
    /// Index of the I2C bus, as in `/dev/i2c-N`.
    #[cfg_attr(feature = "serde", serde(default = "default_bus"))]
    pub bus: u8,
    /// 7-bit slave address.
    pub address: u8,
    #[cfg_attr(feature = "serde", serde(with = "seconds"))]
    pub sampling_period: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    pub settings: S,
}

/// Bus every supported board exposes the sensors on.
pub const DEFAULT_BUS: u8 = 1;

#[cfg(feature = "serde")]
fn default_bus() -> u8 {
    DEFAULT_BUS
}

impl<S> SensorConfig<S> {
    pub fn new(bus: u8, address: u8, sampling_period: Duration, settings: S) -> Self {
        SensorConfig { bus, address, sampling_period, settings }
    }

    pub fn with_sampling_period(mut self, sampling_period: Duration) -> Self {
        self.sampling_period = sampling_period;
        self
    }

    pub fn with_settings(mut self, settings: S) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(feature = "serde")]
mod seconds {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
