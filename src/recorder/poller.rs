// src/recorder/poller.rs

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};

use super::buffer::MeasurementBuffer;
use crate::common::{
    command::Command,
    error::SensorError,
    hal_traits::{BusTransport, Clock},
    response::{decode_frame, FrameLayout},
};
use crate::sensor::device::Device;

/// Device handle shared between the poller and the metadata getters.
pub type SharedDevice<T> = Arc<Mutex<Device<T>>>;

#[derive(Debug, Default)]
struct StopState {
    triggered: Mutex<bool>,
    wakeup: Condvar,
}

/// Cloneable one-shot stop request for a running poller.
///
/// Any clone can trigger it (e.g. from a Ctrl-C handler); the poller sees it
/// between data-ready queries and wakes up early from its sleep.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    state: Arc<StopState>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.state.triggered.lock() = true;
        self.state.wakeup.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.triggered.lock()
    }

    /// Sleeps for up to `timeout`.
    ///
    /// # Returns
    ///
    /// * `true` if the signal was triggered before or during the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut triggered = self.state.triggered.lock();
        while !*triggered {
            if self.state.wakeup.wait_until(&mut triggered, deadline).timed_out() {
                break;
            }
        }
        *triggered
    }
}

/// The fixed commands and layout one sensor family is polled with.
#[derive(Debug, Copy, Clone)]
pub struct PollPlan {
    /// Sensor name, used for the thread name and log lines.
    pub name: &'static str,
    pub data_ready: Command,
    pub read_values: Command,
    pub stop: Command,
    pub layout: FrameLayout,
    pub sampling_period: Duration,
}

/// Where the poller currently is in its cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PollState {
    Idle,
    WaitReady,
    Fetch,
    Decode,
    Publish,
    Sleep,
    Stopping,
}

/// How a cycle ended when it did not fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Cycle {
    /// An entry was pushed; `true` if it was a complete record.
    Published(bool),
    /// The stop signal arrived while waiting for data.
    Stopped,
}

/// Background sampling loop for one sensor.
pub struct Poller<T: BusTransport> {
    device: SharedDevice<T>,
    buffer: Arc<MeasurementBuffer>,
    clock: Arc<dyn Clock>,
    stop: StopSignal,
    plan: PollPlan,
    state: PollState,
}

impl<T: BusTransport> Poller<T> {
    pub fn new(
        device: SharedDevice<T>,
        buffer: Arc<MeasurementBuffer>,
        clock: Arc<dyn Clock>,
        stop: StopSignal,
        plan: PollPlan,
    ) -> Self {
        Poller { device, buffer, clock, stop, plan, state: PollState::Idle }
    }

    #[inline]
    pub fn state(&self) -> PollState {
        self.state
    }

    /// Runs cycles until the stop signal fires, then shuts the device down.
    pub fn run(mut self) {
        info!("{}: polling every {:?}", self.plan.name, self.plan.sampling_period);
        while !self.stop.is_triggered() {
            match self.cycle() {
                Ok(Cycle::Published(valid)) => debug!("{}: published (valid: {})", self.plan.name, valid),
                Ok(Cycle::Stopped) => break,
                Err(e) => warn!("{}: poll cycle failed: {}", self.plan.name, e),
            }
            self.state = PollState::Sleep;
            if self.stop.wait_timeout(self.plan.sampling_period) {
                break;
            }
        }
        self.shutdown();
    }

    /// One WaitReady → Fetch → Decode → Publish pass.
    pub fn cycle(&mut self) -> Result<Cycle, SensorError<T::Error>> {
        self.state = PollState::WaitReady;
        loop {
            if self.stop.is_triggered() {
                return Ok(Cycle::Stopped);
            }
            if self.device.lock().data_ready(&self.plan.data_ready)? {
                break;
            }
            thread::yield_now();
        }

        self.state = PollState::Fetch;
        let response = self.device.lock().query(&self.plan.read_values)?;
        let timestamp = self.clock.now();

        self.state = PollState::Decode;
        let entry = match decode_frame(&self.plan.layout, &response) {
            Ok(decoded) => {
                for invalid in decoded.invalid_groups() {
                    warn!("{}: {}", self.plan.name, invalid);
                }
                decoded.into_measurement(timestamp)
            }
            Err(e) => {
                warn!("{}: measured values undecodable: {}", self.plan.name, e);
                None
            }
        };

        self.state = PollState::Publish;
        let valid = entry.is_some();
        if self.buffer.push(entry).is_some() {
            debug!("{}: buffer full, dropped oldest entry", self.plan.name);
        }
        Ok(Cycle::Published(valid))
    }

    /// Best-effort stop command and transport release.
    fn shutdown(&mut self) {
        self.state = PollState::Stopping;
        let mut device = self.device.lock();
        if let Err(e) = device.send(&self.plan.stop) {
            warn!("{}: '{}' failed during shutdown: {}", self.plan.name, self.plan.stop.name, e);
        }
        if let Err(e) = device.close() {
            warn!("{}: closing transport failed: {}", self.plan.name, e);
        }
        info!("{}: poller stopped", self.plan.name);
    }
}

/// Owner of a running poller thread.
#[derive(Debug)]
pub struct PollerHandle {
    stop: StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Starts `poller` on its own named thread.
    pub fn spawn<T>(poller: Poller<T>) -> std::io::Result<Self>
    where
        T: BusTransport + Send + 'static,
    {
        let stop = poller.stop.clone();
        let thread = thread::Builder::new()
            .name(format!("{}-poller", poller.plan.name.to_lowercase()))
            .spawn(move || poller.run())?;
        Ok(PollerHandle { stop, thread: Some(thread) })
    }

    /// True until the thread has exited.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Triggers the stop signal and waits for the thread to finish its shutdown.
    pub fn stop(&mut self) {
        self.stop.trigger();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("poller thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::mock::{frame_from_floats, ready, FixedClock, MockBus};
    use crate::common::response::GroupLayout;
    use crate::common::SystemClock;
    use chrono::{Local, TimeZone};

    const LAYOUT: FrameLayout = FrameLayout::new(&[
        GroupLayout::new("co2", "ppm", &["co2"]),
        GroupLayout::new("temperature", "°C", &["temperature"]),
    ]);

    fn plan(sampling_period: Duration) -> PollPlan {
        PollPlan {
            name: "TEST",
            data_ready: Command::query("get_data_ready_flag", 0x0202, 3),
            read_values: Command::query("read_measured_values", 0x0300, 12),
            stop: Command::write("stop_measurement", 0x0104),
            layout: LAYOUT,
            sampling_period,
        }
    }

    fn poller(bus: &MockBus, stop: StopSignal, period: Duration) -> (Poller<MockBus>, Arc<MeasurementBuffer>) {
        let buffer = Arc::new(MeasurementBuffer::new());
        let device = Arc::new(Mutex::new(Device::new(bus.clone())));
        let clock = FixedClock(Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        (Poller::new(device, buffer.clone(), Arc::new(clock), stop, plan(period)), buffer)
    }

    #[test]
    fn test_stop_signal_wait() {
        let stop = StopSignal::new();
        assert!(!stop.wait_timeout(Duration::from_millis(5)));

        let remote = stop.clone();
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.trigger();
        });
        let started = Instant::now();
        assert!(stop.wait_timeout(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5), "Wait should end on trigger");
        assert!(stop.is_triggered());
        trigger.join().unwrap();
    }

    #[test]
    fn test_cycle_waits_for_ready_then_publishes() {
        let bus = MockBus::new();
        bus.respond(0x0202, ready(false))
            .respond(0x0202, ready(false))
            .respond(0x0202, ready(true))
            .respond(0x0300, frame_from_floats(&[415.25, 21.5]));
        let (mut poller, buffer) = poller(&bus, StopSignal::new(), Duration::ZERO);

        assert_eq!(poller.state(), PollState::Idle);
        assert_eq!(poller.cycle().unwrap(), Cycle::Published(true));
        assert_eq!(poller.state(), PollState::Publish);
        assert_eq!(bus.count(0x0202), 3);

        let record = buffer.pop().flatten().expect("Record should be published");
        assert_eq!(record.value("co2", "co2"), Some(415.25));
        assert_eq!(record.value("temperature", "temperature"), Some(21.5));
        assert_eq!(record.timestamp, Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_cycle_publishes_placeholder_for_bad_frame() {
        let bus = MockBus::new();
        let mut frame = frame_from_floats(&[415.25, 21.5]);
        frame[8] ^= 0x01;
        bus.respond(0x0202, ready(true)).respond(0x0300, frame);
        let (mut poller, buffer) = poller(&bus, StopSignal::new(), Duration::ZERO);

        assert_eq!(poller.cycle().unwrap(), Cycle::Published(false));
        assert_eq!(buffer.pop(), Some(None));
    }

    #[test]
    fn test_cycle_transport_error_publishes_nothing() {
        let bus = MockBus::new();
        bus.respond(0x0202, ready(true));
        let (mut poller, buffer) = poller(&bus, StopSignal::new(), Duration::ZERO);

        assert!(matches!(poller.cycle(), Err(SensorError::Transport(_))));
        assert_eq!(poller.state(), PollState::Fetch);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_cycle_observes_stop_while_waiting() {
        let bus = MockBus::new();
        bus.respond(0x0202, ready(false));
        let stop = StopSignal::new();
        stop.trigger();
        let (mut poller, _buffer) = poller(&bus, stop, Duration::ZERO);
        assert_eq!(poller.cycle().unwrap(), Cycle::Stopped);
    }

    #[test]
    fn test_thread_survives_errors_and_shuts_down() {
        let bus = MockBus::new();
        bus.respond(0x0202, ready(true)).respond(0x0300, frame_from_floats(&[400.0, 20.0]));
        // First cycle fails on the bus, later ones succeed.
        bus.fail_next_writes(1);
        let stop = StopSignal::new();
        let (poller, buffer) = poller(&bus, stop.clone(), Duration::from_millis(5));

        let mut handle = PollerHandle::spawn(poller).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while buffer.len() < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(buffer.len() >= 2, "Poller should keep publishing after an error");
        assert!(handle.is_running());

        handle.stop();
        assert!(!handle.is_running());
        assert!(bus.is_closed());
        assert_eq!(bus.opcodes().last(), Some(&0x0104));
    }

    #[test]
    fn test_external_stop_signal_ends_thread() {
        let bus = MockBus::new();
        bus.respond(0x0202, ready(false));
        let stop = StopSignal::new();
        let buffer = Arc::new(MeasurementBuffer::new());
        let device = Arc::new(Mutex::new(Device::new(bus.clone())));
        let poller = Poller::new(device, buffer, Arc::new(SystemClock), stop.clone(), plan(Duration::from_secs(60)));

        let mut handle = PollerHandle::spawn(poller).unwrap();
        stop.trigger();
        handle.stop();
        assert!(bus.is_closed());
    }
}
