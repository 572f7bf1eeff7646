// src/common/timing.rs

use core::time::Duration;

// Nominal values from the Sensirion interface descriptions. The drivers only
// wait where a command needs time to take effect before the next transaction.

/// Settle time after a command that changes the measurement state or a
/// persistent setting (start measurement, write auto-cleaning interval).
pub const COMMAND_SETTLE: Duration = Duration::from_millis(50);

/// SPS30 produces a new sample every second.
pub const SPS30_DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_secs(1);

/// SCD30 default poll cadence.
pub const SCD30_DEFAULT_SAMPLING_PERIOD: Duration = Duration::from_secs(10);

/// Shortest continuous-measurement interval the SCD30 accepts, in seconds.
pub const SCD30_MEASUREMENT_INTERVAL_MIN: u16 = 2;
/// Longest continuous-measurement interval the SCD30 accepts, in seconds.
pub const SCD30_MEASUREMENT_INTERVAL_MAX: u16 = 1800;

/// Seconds per day, for the SPS30 auto-cleaning interval.
pub const SECONDS_PER_DAY: u32 = 86_400;
