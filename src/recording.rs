use crate::sampler::Sample;

/// Collects raw samples between two toggles of the Record button.
#[derive(Default)]
pub struct Recording {
    active: bool,
    samples: Vec<Sample>,
}

impl Recording {
    pub fn new() -> Recording {
        Recording::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Starts a new recording, discarding anything recorded before.
    pub fn start(&mut self) {
        self.samples.clear();
        self.active = true;
    }

    /// Ends the recording and hands the samples over for saving.
    pub fn finish(&mut self) -> Vec<Sample> {
        self.active = false;
        std::mem::take(&mut self.samples)
    }

    /// Returns `None` when the toggle started a recording, or the finished
    /// samples when it ended one.
    pub fn toggle(&mut self) -> Option<Vec<Sample>> {
        if self.active {
            Some(self.finish())
        } else {
            self.start();
            None
        }
    }

    pub fn record(&mut self, sample: Sample) {
        if self.active {
            self.samples.push(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: f64) -> Sample {
        Sample {
            timestamp,
            value: timestamp * 2.0,
        }
    }

    #[test]
    fn only_records_while_active() {
        let mut recording = Recording::new();
        recording.record(sample(1.0));
        assert_eq!(recording.len(), 0);

        assert!(recording.toggle().is_none());
        assert!(recording.is_active());
        recording.record(sample(2.0));
        recording.record(sample(3.0));

        let finished = recording.toggle().expect("recording was active");
        assert_eq!(finished, vec![sample(2.0), sample(3.0)]);
        assert!(!recording.is_active());

        recording.record(sample(4.0));
        assert_eq!(recording.len(), 0);
    }

    #[test]
    fn restarting_discards_previous_samples() {
        let mut recording = Recording::new();
        recording.start();
        recording.record(sample(1.0));
        recording.start();
        recording.record(sample(2.0));

        assert_eq!(recording.finish(), vec![sample(2.0)]);
    }
}
