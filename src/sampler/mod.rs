mod generator;
mod simulator;

pub use generator::FlowSignal;
pub use simulator::{Simulator, DEFAULT_INTERVAL};

/// One `(timestamp, value)` pair, timestamp in seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    Idle,
    Running,
    Stopped,
}

/// Consumer of delivered samples. Errors are discarded by the sampler thread.
pub type Callback = Box<dyn FnMut(f64, f64) -> anyhow::Result<()> + Send>;
