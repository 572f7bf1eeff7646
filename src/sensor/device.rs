// src/sensor/device.rs

use log::{debug, trace, warn};

use crate::common::{
    command::Command,
    error::{Checked, SensorError},
    frame::RawFrame,
    hal_traits::BusTransport,
};

/// Exclusive handle on one sensor's bus connection.
///
/// Every transaction is a write of the command frame, then (for queries) a
/// read of exactly the command's response length. Once [`Device::close`] has
/// run, every operation fails with [`SensorError::Closed`].
#[derive(Debug)]
pub struct Device<T: BusTransport> {
    transport: T,
    open: bool,
    /// Consecutive data-ready answers that failed their CRC.
    ready_mismatches: u32,
}

impl<T: BusTransport> Device<T> {
    pub fn new(transport: T) -> Self {
        Device { transport, open: true, ready_mismatches: 0 }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> Result<(), SensorError<T::Error>> {
        if self.open {
            Ok(())
        } else {
            Err(SensorError::Closed)
        }
    }

    fn write_frame(&mut self, command: &Command, frame: &[u8]) -> Result<(), SensorError<T::Error>> {
        self.ensure_open()?;
        trace!("tx {}: {:02x?}", command, frame);
        self.transport.write(frame).map_err(SensorError::Transport)
    }

    /// Sends a command that carries no payload.
    pub fn send(&mut self, command: &Command) -> Result<(), SensorError<T::Error>> {
        self.write_frame(command, &command.format())
    }

    /// Sends a command followed by CRC-protected data words.
    pub fn send_with(&mut self, command: &Command, words: &[u16]) -> Result<(), SensorError<T::Error>> {
        let frame = command
            .format_with(words)
            .map_err(|_| SensorError::InvalidArgument("payload does not fit in one command"))?;
        self.write_frame(command, &frame)
    }

    /// Sends `command` and reads its raw response, CRC bytes included.
    pub fn query(&mut self, command: &Command) -> Result<Vec<u8>, SensorError<T::Error>> {
        self.send(command)?;
        let mut response = vec![0u8; command.response_len];
        self.transport.read(&mut response).map_err(SensorError::Transport)?;
        trace!("rx {}: {:02x?}", command, response);
        Ok(response)
    }

    /// Sends `command` and returns the data bytes of its response.
    ///
    /// # Returns
    ///
    /// * `Ok(Checked::Valid(data))` when every word passed its CRC.
    /// * `Ok(Checked::Unavailable(mismatch))` on the first word that did not.
    /// * `Err(_)` on transport failure or a closed handle.
    pub fn query_data(&mut self, command: &Command) -> Result<Checked<Vec<u8>>, SensorError<T::Error>> {
        let checked = self.query_checked(command)?;
        if let Checked::Unavailable(mismatch) = &checked {
            warn!("'{}' {}", command.name, mismatch);
        }
        Ok(checked)
    }

    fn query_checked(&mut self, command: &Command) -> Result<Checked<Vec<u8>>, SensorError<T::Error>> {
        let response = self.query(command)?;
        Ok(RawFrame::new(&response)?.data().into())
    }

    /// Queries a data-ready flag. A corrupted answer counts as "not ready".
    ///
    /// The flag is polled in a tight loop, so only the first of a run of
    /// corrupted answers is logged at `warn`; the rest go to `debug`.
    pub fn data_ready(&mut self, command: &Command) -> Result<bool, SensorError<T::Error>> {
        match self.query_checked(command)? {
            Checked::Valid(data) => {
                if self.ready_mismatches > 1 {
                    debug!("'{}' valid again after {} CRC mismatches", command.name, self.ready_mismatches);
                }
                self.ready_mismatches = 0;
                Ok(data.get(1) == Some(&1))
            }
            Checked::Unavailable(mismatch) => {
                self.ready_mismatches = self.ready_mismatches.saturating_add(1);
                if self.ready_mismatches == 1 {
                    warn!("'{}' {}", command.name, mismatch);
                } else {
                    debug!("'{}' {} (repeat {})", command.name, mismatch, self.ready_mismatches);
                }
                Ok(false)
            }
        }
    }

    /// Data-ready answers in a row that failed their CRC.
    #[inline]
    pub fn ready_mismatches(&self) -> u32 {
        self.ready_mismatches
    }

    /// Releases the transport. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), SensorError<T::Error>> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.transport.close().map_err(SensorError::Transport)
    }
}
