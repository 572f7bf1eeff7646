// src/sensor/sps30.rs

//! Sensirion SPS30 particulate-matter sensor.

use core::time::Duration;
use std::thread;

use log::info;

use super::{Sensor, SensorFamily};
use crate::common::{
    command::{split_u32, Command},
    error::{Checked, SensorError},
    hal_traits::BusTransport,
    response::{ascii_string, be_u32, FrameLayout, GroupLayout, ProductType, StatusRegister},
    timing,
};

/// Default 7-bit I2C address.
pub const ADDRESS: u8 = 0x69;

/// Output-format selector sent with start-measurement: big-endian IEEE-754 floats.
pub const OUTPUT_FORMAT_FLOAT: u16 = 0x0300;

pub const START_MEASUREMENT: Command = Command::write("start_measurement", 0x0010);
pub const STOP_MEASUREMENT: Command = Command::write("stop_measurement", 0x0104);
pub const GET_DATA_READY_FLAG: Command = Command::query("get_data_ready_flag", 0x0202, 3);
pub const READ_MEASURED_VALUES: Command = Command::query("read_measured_values", 0x0300, 60);
pub const SLEEP: Command = Command::write("sleep", 0x1001);
pub const WAKEUP: Command = Command::write("wakeup", 0x1103);
pub const START_FAN_CLEANING: Command = Command::write("start_fan_cleaning", 0x5607);
pub const GET_AUTO_CLEANING_INTERVAL: Command = Command::query("get_auto_cleaning_interval", 0x8004, 6);
pub const SET_AUTO_CLEANING_INTERVAL: Command = Command::write("set_auto_cleaning_interval", 0x8004);
pub const GET_PRODUCT_TYPE: Command = Command::query("get_product_type", 0xD002, 12);
pub const GET_SERIAL_NUMBER: Command = Command::query("get_serial_number", 0xD033, 48);
pub const GET_FIRMWARE_VERSION: Command = Command::query("get_firmware_version", 0xD100, 3);
pub const GET_STATUS_REGISTER: Command = Command::query("get_status_register", 0xD206, 6);
pub const CLEAR_STATUS_REGISTER: Command = Command::write("clear_status_register", 0xD210);
pub const RESET: Command = Command::write("reset", 0xD304);

/// Mass concentrations, number concentrations, then typical particle size.
pub const LAYOUT: FrameLayout = FrameLayout::new(&[
    GroupLayout::new("mass_density", "μg/m3", &["pm1.0", "pm2.5", "pm4.0", "pm10"]),
    GroupLayout::new("particle_count", "#/cm3", &["pm0.5", "pm1.0", "pm2.5", "pm4.0", "pm10"]),
    GroupLayout::new("particle_size", "μm", &["typical_size"]),
]);

/// Marker type selecting the SPS30 command set.
#[derive(Debug, Copy, Clone, Default)]
pub struct Sps30;

impl SensorFamily for Sps30 {
    const NAME: &'static str = "SPS30";
    const DEFAULT_ADDRESS: u8 = ADDRESS;
    const DEFAULT_SAMPLING_PERIOD: Duration = timing::SPS30_DEFAULT_SAMPLING_PERIOD;
    const LAYOUT: FrameLayout = LAYOUT;

    const START_MEASUREMENT: Command = START_MEASUREMENT;
    const STOP_MEASUREMENT: Command = STOP_MEASUREMENT;
    const GET_DATA_READY_FLAG: Command = GET_DATA_READY_FLAG;
    const READ_MEASURED_VALUES: Command = READ_MEASURED_VALUES;
    const GET_FIRMWARE_VERSION: Command = GET_FIRMWARE_VERSION;
    const RESET: Command = RESET;

    type Settings = ();

    fn start_payload(_settings: &()) -> Result<u16, &'static str> {
        Ok(OUTPUT_FORMAT_FLOAT)
    }
}

impl<T: BusTransport> Sensor<T, Sps30> {
    pub fn get_product_type(&self) -> Result<Checked<ProductType>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_PRODUCT_TYPE)?;
        Ok(data.map(|d| ProductType::from_data(&d)))
    }

    pub fn get_serial_number(&self) -> Result<Checked<String>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_SERIAL_NUMBER)?;
        Ok(data.map(|d| ascii_string(&d)))
    }

    pub fn get_status_register(&self) -> Result<Checked<StatusRegister>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_STATUS_REGISTER)?;
        Ok(data.try_map(|d| be_u32(&d).map(StatusRegister))?)
    }

    pub fn clear_status_register(&self) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send(&CLEAR_STATUS_REGISTER)
    }

    /// Enters sleep mode. Only valid while idle.
    pub fn sleep(&self) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send(&SLEEP)
    }

    pub fn wakeup(&self) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send(&WAKEUP)
    }

    /// Runs the fan at maximum speed for 10 seconds. Only valid while measuring.
    pub fn start_fan_cleaning(&self) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send(&START_FAN_CLEANING)
    }

    /// Auto-cleaning interval in seconds.
    pub fn get_auto_cleaning_interval(&self) -> Result<Checked<u32>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&GET_AUTO_CLEANING_INTERVAL)?;
        Ok(data.try_map(|d| be_u32(&d))?)
    }

    /// Sets the auto-cleaning interval in days and reads it back.
    ///
    /// # Arguments
    ///
    /// * `days`: Interval in days; 0 disables automatic cleaning.
    ///
    /// # Returns
    ///
    /// * `Ok(checked)` with the interval in seconds as stored by the sensor.
    pub fn set_auto_cleaning_interval(&self, days: u32) -> Result<Checked<u32>, SensorError<T::Error>> {
        let seconds = days
            .checked_mul(timing::SECONDS_PER_DAY)
            .ok_or(SensorError::InvalidArgument("auto-cleaning interval does not fit in 32 bits"))?;
        self.device.lock().send_with(&SET_AUTO_CLEANING_INTERVAL, &split_u32(seconds))?;
        thread::sleep(timing::COMMAND_SETTLE);
        info!("SPS30: auto-cleaning interval set to {} days", days);
        self.get_auto_cleaning_interval()
    }
}
