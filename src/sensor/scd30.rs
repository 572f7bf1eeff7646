// src/sensor/scd30.rs

//! Sensirion SCD30 CO2, temperature and humidity sensor.

use core::time::Duration;

use super::{Sensor, SensorFamily};
use crate::common::{
    command::Command,
    error::{Checked, SensorError},
    hal_traits::BusTransport,
    response::{be_u16, FrameLayout, GroupLayout},
    timing,
};

/// Default 7-bit I2C address.
pub const ADDRESS: u8 = 0x61;

pub const START_MEASUREMENT: Command = Command::write("start_continuous_measurement", 0x0010);
pub const STOP_MEASUREMENT: Command = Command::write("stop_continuous_measurement", 0x0104);
pub const GET_DATA_READY_FLAG: Command = Command::query("get_data_ready_flag", 0x0202, 3);
pub const READ_MEASURED_VALUES: Command = Command::query("read_measurement", 0x0300, 18);
pub const GET_MEASUREMENT_INTERVAL: Command = Command::query("get_measurement_interval", 0x4600, 3);
pub const SET_MEASUREMENT_INTERVAL: Command = Command::write("set_measurement_interval", 0x4600);
pub const GET_ALTITUDE_COMPENSATION: Command = Command::query("get_altitude_compensation", 0x5102, 3);
pub const SET_ALTITUDE_COMPENSATION: Command = Command::write("set_altitude_compensation", 0x5102);
pub const GET_FIRMWARE_VERSION: Command = Command::query("get_firmware_version", 0xD100, 3);
pub const RESET: Command = Command::write("soft_reset", 0xD304);

pub const LAYOUT: FrameLayout = FrameLayout::new(&[
    GroupLayout::new("co2", "ppm", &["co2"]),
    GroupLayout::new("temperature", "°C", &["temperature"]),
    GroupLayout::new("humidity", "%", &["humidity"]),
]);

/// Ambient pressure assumed when none is configured, in mbar.
pub const DEFAULT_PRESSURE_MBAR: u16 = 960;
/// Accepted ambient-pressure range in mbar. 0 disables compensation.
pub const PRESSURE_RANGE_MBAR: core::ops::RangeInclusive<u16> = 700..=1400;

/// SCD30-specific settings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Scd30Settings {
    /// Ambient pressure sent with start-measurement for CO2 compensation.
    pub pressure_mbar: u16,
}

impl Default for Scd30Settings {
    fn default() -> Self {
        Scd30Settings { pressure_mbar: DEFAULT_PRESSURE_MBAR }
    }
}

/// Marker type selecting the SCD30 command set.
#[derive(Debug, Copy, Clone, Default)]
pub struct Scd30;

impl SensorFamily for Scd30 {
    const NAME: &'static str = "SCD30";
    const DEFAULT_ADDRESS: u8 = ADDRESS;
    const DEFAULT_SAMPLING_PERIOD: Duration = timing::SCD30_DEFAULT_SAMPLING_PERIOD;
    const LAYOUT: FrameLayout = LAYOUT;

    const START_MEASUREMENT: Command = START_MEASUREMENT;
    const STOP_MEASUREMENT: Command = STOP_MEASUREMENT;
    const GET_DATA_READY_FLAG: Command = GET_DATA_READY_FLAG;
    const READ_MEASURED_VALUES: Command = READ_MEASURED_VALUES;
    const GET_FIRMWARE_VERSION: Command = GET_FIRMWARE_VERSION;
    const RESET: Command = RESET;

    type Settings = Scd30Settings;

    fn start_payload(settings: &Scd30Settings) -> Result<u16, &'static str> {
        let pressure = settings.pressure_mbar;
        if pressure == 0 || PRESSURE_RANGE_MBAR.contains(&pressure) {
            Ok(pressure)
        } else {
            Err("ambient pressure must be 0 or 700-1400 mbar")
        }
    }
}

impl<T: BusTransport> Sensor<T, Scd30> {
    /// Continuous-measurement interval in seconds.
    pub fn get_measurement_interval(&self) -> Result<Checked<u16>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_MEASUREMENT_INTERVAL)?;
        Ok(data.try_map(|d| be_u16(&d))?)
    }

    /// Sets the continuous-measurement interval (2 to 1800 seconds).
    pub fn set_measurement_interval(&self, seconds: u16) -> Result<(), SensorError<T::Error>> {
        if !(timing::SCD30_MEASUREMENT_INTERVAL_MIN..=timing::SCD30_MEASUREMENT_INTERVAL_MAX).contains(&seconds) {
            return Err(SensorError::InvalidArgument("measurement interval must be 2-1800 s"));
        }
        self.device.lock().send_with(&SET_MEASUREMENT_INTERVAL, &[seconds])
    }

    /// Altitude above sea level used for compensation, in meters.
    pub fn get_altitude_compensation(&self) -> Result<Checked<u16>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_ALTITUDE_COMPENSATION)?;
        Ok(data.try_map(|d| be_u16(&d))?)
    }

    pub fn set_altitude_compensation(&self, meters: u16) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send_with(&SET_ALTITUDE_COMPENSATION, &[meters])
    }
}
