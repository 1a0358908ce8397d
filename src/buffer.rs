use std::collections::VecDeque;

use egui_plot::{PlotPoint, PlotPoints};

pub const DEFAULT_MAX_POINTS: usize = 1000;

/// Bounded buffer of live samples. X values are seconds relative to the first
/// sample pushed since the buffer was created or cleared.
pub struct SampleBuffer {
    samples: VecDeque<PlotPoint>,
    max_points: usize,
    t0: Option<f64>,
}

impl SampleBuffer {
    pub fn new(max_points: usize) -> SampleBuffer {
        let max_points = max_points.max(1);

        SampleBuffer {
            samples: VecDeque::with_capacity(max_points),
            max_points,
            t0: None,
        }
    }

    pub fn push(&mut self, timestamp: f64, value: f64) {
        let t0 = *self.t0.get_or_insert(timestamp);

        if self.samples.len() == self.max_points {
            self.samples.pop_front();
        }
        self.samples.push_back(PlotPoint {
            x: timestamp - t0,
            y: value,
        });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.t0 = None;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<PlotPoint> {
        self.samples.back().copied()
    }

    pub fn points(&self) -> impl Iterator<Item = &PlotPoint> + '_ {
        self.samples.iter()
    }

    pub fn plot_points(&self) -> PlotPoints {
        PlotPoints::Owned(self.samples.iter().copied().collect())
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        let first = self.samples.front()?;
        let last = self.last()?;

        Some((first.x.max(0.0), last.x))
    }

    /// Value range padded by 10% of its span, or by 0.5 when the span is zero.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        padded_range(self.samples.iter().map(|p| p.y))
    }

    pub fn memory_footprint(&self) -> (usize, usize) {
        let sample_size = std::mem::size_of::<PlotPoint>();

        let used = self.samples.len() * sample_size;
        let capacity = self.samples.capacity() * sample_size;

        (used, capacity)
    }
}

pub fn padded_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, y| match acc {
        None => Some((y, y)),
        Some((min, max)) => Some((min.min(y), max.max(y))),
    })?;

    let margin = if max > min { (max - min) * 0.1 } else { 0.5 };

    Some((min - margin, max + margin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_is_relative_to_first_sample() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(1_700_000_000.0, 1.0);
        buffer.push(1_700_000_000.5, 2.0);

        let xs = buffer.points().map(|p| p.x).collect::<Vec<_>>();
        assert_eq!(xs, vec![0.0, 0.5]);
        assert_eq!(buffer.x_range(), Some((0.0, 0.5)));
    }

    #[test]
    fn drops_oldest_points_when_full() {
        let mut buffer = SampleBuffer::new(3);
        for i in 0..5 {
            buffer.push(i as f64, i as f64 * 10.0);
        }

        assert_eq!(buffer.len(), 3);
        let ys = buffer.points().map(|p| p.y).collect::<Vec<_>>();
        assert_eq!(ys, vec![20.0, 30.0, 40.0]);
        // still relative to the very first sample, not the oldest one kept
        assert_eq!(buffer.x_range(), Some((2.0, 4.0)));
    }

    #[test]
    fn clear_resets_time_origin() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(100.0, 1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.y_range(), None);

        buffer.push(200.0, 1.0);
        assert_eq!(buffer.last().map(|p| p.x), Some(0.0));
    }

    #[test]
    fn y_range_has_margin() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(0.0, 4.0);
        buffer.push(1.0, 6.0);

        let (min, max) = buffer.y_range().unwrap();
        assert!((min - 3.8).abs() < 1e-12);
        assert!((max - 6.2).abs() < 1e-12);
    }

    #[test]
    fn flat_y_range_uses_fixed_margin() {
        let mut buffer = SampleBuffer::new(10);
        buffer.push(0.0, 5.0);
        buffer.push(1.0, 5.0);

        assert_eq!(buffer.y_range(), Some((4.5, 5.5)));
    }
}
