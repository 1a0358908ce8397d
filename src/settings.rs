use crate::{buffer::DEFAULT_MAX_POINTS, sampler::DEFAULT_INTERVAL};

pub const INTERVAL_RANGE_MS: (f64, f64) = (1.0, 10_000.0);

/// Startup configuration of the dashboard. The sampling interval is editable
/// from the UI and applies to the next Start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval_ms: f64,
    pub max_points: usize,
    pub sample_channel_size: usize,
    pub svg_size: (f64, f64),
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval_ms: DEFAULT_INTERVAL.as_secs_f64() * 1e3,
            max_points: DEFAULT_MAX_POINTS,
            sample_channel_size: 1024,
            svg_size: (1000.0, 600.0),
        }
    }
}

impl Settings {
    pub fn interval_secs(&self) -> f64 {
        self.interval_ms * 1e-3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_sampling() {
        let settings = Settings::default();
        assert!((settings.interval_secs() - 0.05).abs() < 1e-12);
        assert_eq!(settings.max_points, 1000);
    }
}
