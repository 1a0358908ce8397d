use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use thiserror::Error;

use crate::sampler::{Callback, FlowSignal, Status};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("sampling interval must be a positive, finite number of seconds (got {0})")]
    InvalidInterval(f64),
}

/// Runs a [`FlowSignal`] on a background thread and hands every sample to a
/// callback. An instance goes through a single start/stop cycle; build a new
/// one to sample again.
pub struct Simulator {
    interval: Duration,
    callback: Option<Callback>,
    status: Status,
    start_time: Option<f64>,
    stop_requested: Arc<AtomicBool>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl Simulator {
    /// `interval` is in seconds and must be strictly positive.
    pub fn new<F>(callback: F, interval: f64) -> Result<Simulator, SimulatorError>
    where
        F: FnMut(f64, f64) -> anyhow::Result<()> + Send + 'static,
    {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(SimulatorError::InvalidInterval(interval));
        }
        let interval = match Duration::try_from_secs_f64(interval) {
            Ok(duration) if !duration.is_zero() => duration,
            _ => return Err(SimulatorError::InvalidInterval(interval)),
        };

        Ok(Simulator::idle(Box::new(callback), interval))
    }

    #[cfg(test)]
    pub fn with_default_interval<F>(callback: F) -> Simulator
    where
        F: FnMut(f64, f64) -> anyhow::Result<()> + Send + 'static,
    {
        Simulator::idle(Box::new(callback), DEFAULT_INTERVAL)
    }

    fn idle(callback: Callback, interval: Duration) -> Simulator {
        Simulator {
            interval,
            callback: Some(callback),
            status: Status::Idle,
            start_time: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
            join_handle: None,
        }
    }

    pub fn start(&mut self) {
        match self.status {
            Status::Running => {
                log::debug!("simulator already running, ignoring start request");
                return;
            }
            Status::Stopped => {
                log::warn!("simulator was already stopped and cannot be restarted");
                return;
            }
            Status::Idle => {}
        }

        let Some(callback) = self.callback.take() else {
            log::error!("idle simulator has no callback, refusing to start");
            return;
        };

        let start_time = epoch_seconds();
        let started_at = Instant::now();
        let interval = self.interval;
        let stop_requested = self.stop_requested.clone();

        let spawned = thread::Builder::new()
            .name("simulator".into())
            .spawn(move || {
                log::debug!("simulator thread started, interval {:?}", interval);
                simulator_thread(callback, interval, start_time, started_at, stop_requested);
                log::debug!("simulator thread finished");
            });

        match spawned {
            Ok(join_handle) => {
                self.join_handle = Some(join_handle);
                self.start_time = Some(start_time);
                self.status = Status::Running;
            }
            Err(err) => {
                log::error!("failed to spawn simulator thread: {:?}", err);
                self.status = Status::Stopped;
            }
        }
    }

    /// Asks the sampler thread to finish without waiting for it. One more
    /// sample may still be delivered after this returns.
    pub fn stop(&mut self) {
        if self.status != Status::Running {
            return;
        }

        self.stop_requested.store(true, Ordering::Release);
        self.status = Status::Stopped;
    }

    /// Stops the simulator and blocks until its thread has exited.
    pub fn join(mut self) {
        self.stop();

        if let Some(join_handle) = self.join_handle.take() {
            if let Err(err) = join_handle.join() {
                log::warn!("failed to join simulator thread: {:?}", err);
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    /// Epoch time in seconds recorded by [`Simulator::start`].
    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop_requested.store(true, Ordering::Release);
    }
}

fn simulator_thread(
    mut callback: Callback,
    interval: Duration,
    start_time: f64,
    started_at: Instant,
    stop_requested: Arc<AtomicBool>,
) {
    let mut signal = FlowSignal::new();

    while !stop_requested.load(Ordering::Acquire) {
        let t = started_at.elapsed().as_secs_f64();
        let value = signal.value_at(t);

        // derived from the monotonic clock, so timestamps never go backwards
        // even if the wall clock is adjusted while sampling
        let timestamp = start_time + started_at.elapsed().as_secs_f64();

        deliver(&mut callback, timestamp, value);

        thread::sleep(interval);
    }
}

/// Invokes the consumer, discarding whatever error or panic it produces: a
/// failing consumer only loses the current sample.
fn deliver(callback: &mut Callback, timestamp: f64, value: f64) {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(timestamp, value))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::trace!("sample callback failed: {:?}", err),
        Err(_) => log::trace!("sample callback panicked"),
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
