// src/sensor/mod.rs

// Generic driver shared by every sensor family.
pub mod config;
pub mod device;

// Sensor families.
pub mod scd30;
pub mod sps30;

pub use config::SensorConfig;
pub use device::Device;
pub use scd30::{Scd30, Scd30Settings};
pub use sps30::Sps30;

use core::fmt::Debug;
use core::marker::PhantomData;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;
use parking_lot::Mutex;

use crate::common::{
    command::Command,
    error::{Checked, SensorError},
    hal_traits::{BusTransport, Clock, SystemClock},
    response::{be_u16, decode_frame, DecodedFrame, FirmwareVersion, FrameLayout, Measurement},
    timing,
};
use crate::recorder::{
    buffer::MeasurementBuffer,
    poller::{PollPlan, Poller, PollerHandle, SharedDevice, StopSignal},
};

/// Everything that distinguishes one Sensirion sensor from another: its
/// commands, its measurement layout and its defaults.
pub trait SensorFamily: Send + Sync + 'static {
    /// Sensor name, used in logs and thread names.
    const NAME: &'static str;
    const DEFAULT_ADDRESS: u8;
    const DEFAULT_SAMPLING_PERIOD: Duration;
    /// Layout of the get-measured-values response.
    const LAYOUT: FrameLayout;

    const START_MEASUREMENT: Command;
    const STOP_MEASUREMENT: Command;
    const GET_DATA_READY_FLAG: Command;
    const READ_MEASURED_VALUES: Command;
    const GET_FIRMWARE_VERSION: Command;
    const RESET: Command;

    /// Family-specific configuration.
    type Settings: Clone + Debug + Default + Send + Sync + 'static;

    /// The data word sent along with start-measurement.
    ///
    /// # Returns
    ///
    /// * `Err(reason)` if `settings` hold a value the sensor would reject.
    fn start_payload(settings: &Self::Settings) -> Result<u16, &'static str>;

    /// Configuration with every default filled in.
    fn default_config() -> SensorConfig<Self::Settings> {
        SensorConfig::new(
            config::DEFAULT_BUS,
            Self::DEFAULT_ADDRESS,
            Self::DEFAULT_SAMPLING_PERIOD,
            Self::Settings::default(),
        )
    }
}

/// Driver for one sensor on one bus address.
///
/// The driver owns the device handle and the measurement buffer. Metadata
/// getters may be called while the background poller runs; bus transactions
/// are serialized on the device lock.
pub struct Sensor<T: BusTransport, F: SensorFamily> {
    device: SharedDevice<T>,
    buffer: Arc<MeasurementBuffer>,
    clock: Arc<dyn Clock>,
    stop: StopSignal,
    poller: Option<PollerHandle>,
    sampling_period: Duration,
    settings: F::Settings,
    _family: PhantomData<F>,
}

impl<T: BusTransport, F: SensorFamily> Sensor<T, F> {
    /// Wraps an already opened transport, with the family defaults.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &F::default_config())
    }

    /// Wraps an already opened transport. `config.bus` and `config.address`
    /// are only used by [`Sensor::open`]; here the transport is bound already.
    pub fn with_config(transport: T, config: &SensorConfig<F::Settings>) -> Self {
        Sensor {
            device: Arc::new(Mutex::new(Device::new(transport))),
            buffer: Arc::new(MeasurementBuffer::new()),
            clock: Arc::new(SystemClock),
            stop: StopSignal::new(),
            poller: None,
            sampling_period: config.sampling_period,
            settings: config.settings.clone(),
            _family: PhantomData,
        }
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn sampling_period(&self) -> Duration {
        self.sampling_period
    }

    pub fn settings(&self) -> &F::Settings {
        &self.settings
    }

    /// A handle that stops the poller when triggered, usable from other threads.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// True while the background poller thread is alive.
    pub fn is_measuring(&self) -> bool {
        self.poller.as_ref().map_or(false, PollerHandle::is_running)
    }

    /// Number of entries waiting in the buffer, placeholders included.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pops the oldest buffered entry.
    ///
    /// # Returns
    ///
    /// * `Some(measurement)` for a fully validated sample.
    /// * `None` if the buffer is empty or the oldest cycle failed validation.
    pub fn get_measurement(&self) -> Option<Measurement> {
        self.buffer.pop().flatten()
    }

    pub fn get_data_ready_flag(&self) -> Result<bool, SensorError<T::Error>> {
        self.device.lock().data_ready(&F::GET_DATA_READY_FLAG)
    }

    /// Reads and decodes one measurement response right away, bypassing the buffer.
    pub fn read_measured_values(&self) -> Result<DecodedFrame, SensorError<T::Error>> {
        let response = self.device.lock().query(&F::READ_MEASURED_VALUES)?;
        Ok(decode_frame(&F::LAYOUT, &response)?)
    }

    pub fn get_firmware_version(&self) -> Result<Checked<FirmwareVersion>, SensorError<T::Error>> {
        let data = self.device.lock().query_data(&F::GET_FIRMWARE_VERSION)?;
        Ok(data.try_map(|d| be_u16(&d))?.map(|word| FirmwareVersion::from_word(word.to_be_bytes())))
    }

    /// Soft reset. The sensor returns to idle mode.
    pub fn reset(&self) -> Result<(), SensorError<T::Error>> {
        self.device.lock().send(&F::RESET)
    }

    /// Stops the poller (if running), then sends stop-measurement and closes
    /// the transport. The driver cannot be used for bus access afterwards.
    pub fn stop_measurement(&mut self) -> Result<(), SensorError<T::Error>> {
        if let Some(mut poller) = self.poller.take() {
            // The poller sends the stop command and closes on its way out.
            poller.stop();
            info!("{}: measurement stopped", F::NAME);
            return Ok(());
        }
        self.stop.trigger();
        let mut device = self.device.lock();
        if !device.is_open() {
            return Ok(());
        }
        let stopped = device.send(&F::STOP_MEASUREMENT);
        device.close()?;
        stopped
    }
}

impl<T, F> Sensor<T, F>
where
    T: BusTransport + Send + 'static,
    F: SensorFamily,
{
    /// Sends start-measurement and spawns the background poller.
    ///
    /// # Returns
    ///
    /// * `Err(SensorError::AlreadyMeasuring)` if the poller already runs.
    /// * `Err(SensorError::Closed)` after `stop_measurement` or a triggered stop signal.
    /// * `Err(SensorError::InvalidArgument(_))` if the settings are out of range.
    pub fn start_measurement(&mut self) -> Result<(), SensorError<T::Error>> {
        if let Some(mut poller) = self.poller.take() {
            if poller.is_running() && !self.stop.is_triggered() {
                self.poller = Some(poller);
                return Err(SensorError::AlreadyMeasuring);
            }
            // Stopped through a cloned signal: the poller has closed the device.
            poller.stop();
        }
        let payload = F::start_payload(&self.settings).map_err(SensorError::InvalidArgument)?;
        self.device.lock().send_with(&F::START_MEASUREMENT, &[payload])?;
        thread::sleep(timing::COMMAND_SETTLE);

        let plan = PollPlan {
            name: F::NAME,
            data_ready: F::GET_DATA_READY_FLAG,
            read_values: F::READ_MEASURED_VALUES,
            stop: F::STOP_MEASUREMENT,
            layout: F::LAYOUT,
            sampling_period: self.sampling_period,
        };
        let poller = Poller::new(
            self.device.clone(),
            self.buffer.clone(),
            self.clock.clone(),
            self.stop.clone(),
            plan,
        );
        self.poller = Some(PollerHandle::spawn(poller).map_err(SensorError::Spawn)?);
        info!("{}: measurement started", F::NAME);
        Ok(())
    }
}

#[cfg(feature = "linux")]
impl<F: SensorFamily> Sensor<crate::common::LinuxTransport, F> {
    /// Opens `/dev/i2c-{config.bus}` at `config.address`.
    pub fn open(
        config: &SensorConfig<F::Settings>,
    ) -> Result<Self, SensorError<crate::common::linux::I2cError>> {
        let transport =
            crate::common::linux::open(config.bus, config.address).map_err(SensorError::Transport)?;
        Ok(Self::with_config(transport, config))
    }
}

impl<T: BusTransport, F: SensorFamily> Drop for Sensor<T, F> {
    fn drop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }
}
