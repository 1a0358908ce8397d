use std::f64::consts::PI;

use rand::{rngs::ThreadRng, Rng};
use rand_distr::StandardNormal;

const BASELINE: f64 = 5.0;
const DRIFT_RATE: f64 = 0.02;
const NOISE_STDDEV: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Sinusoid {
    amplitude: f64,
    frequency: f64,
}

impl Sinusoid {
    fn at(&self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency * t).sin()
    }
}

/// Synthetic flow signal: baseline, linear drift, a slow and a fast sine and
/// gaussian noise, as a function of the elapsed time in seconds.
pub struct FlowSignal<R: Rng = ThreadRng> {
    baseline: f64,
    drift_rate: f64,
    components: [Sinusoid; 2],
    noise_stddev: f64,
    rng: R,
}

impl FlowSignal<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl<R: Rng> FlowSignal<R> {
    pub fn with_rng(rng: R) -> Self {
        FlowSignal {
            baseline: BASELINE,
            drift_rate: DRIFT_RATE,
            components: [
                Sinusoid {
                    amplitude: 2.0,
                    frequency: 0.2,
                },
                Sinusoid {
                    amplitude: 0.5,
                    frequency: 2.0,
                },
            ],
            noise_stddev: NOISE_STDDEV,
            rng,
        }
    }

    pub fn value_at(&mut self, t: f64) -> f64 {
        let noise: f64 = self.rng.sample(StandardNormal);
        self.clean_value_at(t) + self.noise_stddev * noise
    }

    /// The signal without its noise term.
    pub fn clean_value_at(&self, t: f64) -> f64 {
        self.trend_at(t) + self.components.iter().map(|c| c.at(t)).sum::<f64>()
    }

    pub fn trend_at(&self, t: f64) -> f64 {
        self.baseline + self.drift_rate * t
    }

    /// Upper bound of `|clean_value_at(t) - trend_at(t)|`.
    #[cfg(test)]
    pub fn max_deviation(&self) -> f64 {
        self.components.iter().map(|c| c.amplitude.abs()).sum()
    }
}
