// src/common/hal_traits.rs

use chrono::{DateTime, Local};
use core::fmt::Debug;
use embedded_hal::i2c::I2c;

/// Abstraction for the point-to-point, slave-addressed byte channel a sensor sits on.
///
/// One value of this trait is one device handle: it is already bound to a
/// bus and a slave address. There is no retry logic at this level.
pub trait BusTransport {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Sends a command (and its payload) to the device.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Fills `buffer` completely with bytes read from the device, blocking until they arrive.
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Releases the channel. Called once, during shutdown.
    fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Source of capture timestamps for measurements.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock of the host.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Binds any `embedded-hal` 1.0 I2C bus to one 7-bit slave address.
///
/// Each `write`/`read` is a separate I2C transaction, which is what the
/// Sensirion sensors expect (command first, response fetched afterwards).
#[derive(Debug)]
pub struct I2cTransport<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    pub fn new(bus: I2C, address: u8) -> Self {
        I2cTransport { bus, address }
    }

    #[inline]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back, e.g. to hand it to another driver.
    pub fn release(self) -> I2C {
        self.bus
    }
}

impl<I2C: I2c> BusTransport for I2cTransport<I2C> {
    type Error = I2C::Error;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(self.address, bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.bus.read(self.address, buffer)
    }
}

/// Linux `/dev/i2c-N` character devices (requires the `linux` feature).
#[cfg(feature = "linux")]
pub mod linux {
    use super::I2cTransport;

    pub use linux_embedded_hal::i2cdev::linux::LinuxI2CError as I2cError;
    pub use linux_embedded_hal::I2cdev;

    /// Device handle on a Linux I2C bus.
    pub type LinuxTransport = I2cTransport<I2cdev>;

    /// Opens `/dev/i2c-{bus}` and binds it to `address`.
    pub fn open(bus: u8, address: u8) -> Result<LinuxTransport, I2cError> {
        let device = I2cdev::new(format!("/dev/i2c-{}", bus))?;
        log::debug!("opened /dev/i2c-{} for slave {:#04x}", bus, address);
        Ok(I2cTransport::new(device, address))
    }
}
