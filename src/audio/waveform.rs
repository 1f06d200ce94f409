// Waveform - immutable mono sample buffer with its sample rate

/// Mono audio samples in [-1, 1] plus the rate they were captured at
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Copy scaled so the peak absolute sample is 1.0
    ///
    /// An all-zero waveform is returned unchanged.
    pub fn peak_normalized(&self) -> Waveform {
        let peak = self.peak();
        if peak <= 0.0 {
            return self.clone();
        }
        Waveform {
            samples: self.samples.iter().map(|&s| s / peak).collect(),
            sample_rate: self.sample_rate,
        }
    }
}
