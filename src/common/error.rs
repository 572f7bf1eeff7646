// src/common/error.rs

use core::fmt::{self, Debug};

/// A 3-byte word whose checksum did not match its two data bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[error("CRC mismatch: data {data:02x?}, calculated {calculated:#04x}, received {received:#04x}")]
pub struct CrcMismatch {
    /// The two data bytes of the offending word.
    pub data: [u8; 2],
    /// Checksum byte sent by the sensor.
    pub received: u8,
    /// Checksum computed over `data`.
    pub calculated: u8,
}

/// The bytes were intact but could not be turned into a value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Response did not have the length its layout requires.
    #[error("unexpected byte count: expected {expected}, got {got}")]
    Length { expected: usize, got: usize },

    /// Float with an all-ones exponent (infinity or NaN).
    #[error("non-finite IEEE-754 value {bits:#010x}")]
    NonFinite { bits: u32 },
}

/// Errors reported by the sensor drivers.
///
/// Generic over the bus error `E` so callers keep the concrete I/O error of
/// whichever transport they plugged in.
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E = ()>
where
    E: Debug,
{
    /// Underlying I/O error from the bus transport.
    #[error("transport error: {0:?}")]
    Transport(E),

    /// A response word failed its checksum.
    #[error(transparent)]
    Crc(#[from] CrcMismatch),

    /// A response could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The device handle was closed by `stop_measurement`.
    #[error("device handle is closed")]
    Closed,

    /// `start_measurement` was called while the poller is already running.
    #[error("measurement is already running")]
    AlreadyMeasuring,

    /// A setter argument is outside the range the sensor accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The background poller thread could not be started.
    #[error("failed to spawn poller thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Outcome of a metadata query whose transport succeeded.
///
/// A checksum failure is not an error for these queries: the value is simply
/// unavailable this time, and `Display` says so.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Checked<T> {
    Valid(T),
    Unavailable(CrcMismatch),
}

impl<T> Checked<T> {
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Checked::Valid(_))
    }

    pub fn valid(&self) -> Option<&T> {
        match self {
            Checked::Valid(value) => Some(value),
            Checked::Unavailable(_) => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Checked::Valid(value) => Some(value),
            Checked::Unavailable(_) => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Checked<U> {
        match self {
            Checked::Valid(value) => Checked::Valid(f(value)),
            Checked::Unavailable(mismatch) => Checked::Unavailable(mismatch),
        }
    }

    /// Like [`Checked::map`], for conversions that can fail on the data itself.
    pub fn try_map<U, E, F: FnOnce(T) -> Result<U, E>>(self, f: F) -> Result<Checked<U>, E> {
        match self {
            Checked::Valid(value) => f(value).map(Checked::Valid),
            Checked::Unavailable(mismatch) => Ok(Checked::Unavailable(mismatch)),
        }
    }
}

impl<T> From<Result<T, CrcMismatch>> for Checked<T> {
    fn from(result: Result<T, CrcMismatch>) -> Self {
        match result {
            Ok(value) => Checked::Valid(value),
            Err(mismatch) => Checked::Unavailable(mismatch),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Checked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checked::Valid(value) => value.fmt(f),
            Checked::Unavailable(_) => f.write_str("CRC mismatched"),
        }
    }
}
