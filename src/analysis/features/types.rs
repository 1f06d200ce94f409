// Types module - Data structures for per-frame acoustic descriptors
//
// A FeatureMatrix holds one column per descriptor and one row per analysis
// frame. Columns are stored contiguously because every consumer (fusion,
// normalization) works a whole descriptor series at a time.

use serde::{Deserialize, Serialize};

/// Scalar acoustic descriptor computed once per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    /// Share of spectral autocorrelation lags above half the peak
    ///
    /// High values indicate regular harmonic structure typical of music.
    HarmonicRatio,

    /// Mean magnitude in the low band (50-500 Hz by default)
    LowFrequencyEnergy,

    /// Variance of the magnitude spectrum within the frame
    SpectralVariance,

    /// Periodicity of recent frame energies (beat/rhythm proxy)
    RhythmPeriodicity,

    /// Mean squared amplitude
    Energy,

    /// Magnitude-weighted mean frequency in Hz
    SpectralCentroid,

    /// Magnitude-weighted standard deviation around the centroid in Hz
    SpectralBandwidth,

    /// Fraction of adjacent samples that change sign
    ZeroCrossingRate,

    /// Sum of squared magnitude differences against the previous frame
    SpectralFlux,
}

impl Descriptor {
    pub fn as_str(self) -> &'static str {
        match self {
            Descriptor::HarmonicRatio => "harmonic_ratio",
            Descriptor::LowFrequencyEnergy => "low_frequency_energy",
            Descriptor::SpectralVariance => "spectral_variance",
            Descriptor::RhythmPeriodicity => "rhythm_periodicity",
            Descriptor::Energy => "energy",
            Descriptor::SpectralCentroid => "spectral_centroid",
            Descriptor::SpectralBandwidth => "spectral_bandwidth",
            Descriptor::ZeroCrossingRate => "zero_crossing_rate",
            Descriptor::SpectralFlux => "spectral_flux",
        }
    }

    /// Whether computing this descriptor requires the frame's magnitude spectrum
    pub fn needs_spectrum(self) -> bool {
        matches!(
            self,
            Descriptor::HarmonicRatio
                | Descriptor::LowFrequencyEnergy
                | Descriptor::SpectralVariance
                | Descriptor::SpectralCentroid
                | Descriptor::SpectralBandwidth
                | Descriptor::SpectralFlux
        )
    }
}

/// Ordered, duplicate-free list of descriptors to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn new(descriptors: Vec<Descriptor>) -> Self {
        let mut unique = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if !unique.contains(&descriptor) {
                unique.push(descriptor);
            }
        }
        Self {
            descriptors: unique,
        }
    }

    /// Harmonic ratio, low-frequency energy, spectral variance, rhythm
    pub fn harmonic() -> Self {
        Self::new(vec![
            Descriptor::HarmonicRatio,
            Descriptor::LowFrequencyEnergy,
            Descriptor::SpectralVariance,
            Descriptor::RhythmPeriodicity,
        ])
    }

    /// Energy, centroid, bandwidth, zero-crossing rate, flux
    pub fn spectral() -> Self {
        Self::new(vec![
            Descriptor::Energy,
            Descriptor::SpectralCentroid,
            Descriptor::SpectralBandwidth,
            Descriptor::ZeroCrossingRate,
            Descriptor::SpectralFlux,
        ])
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn contains(&self, descriptor: Descriptor) -> bool {
        self.descriptors.contains(&descriptor)
    }

    pub fn needs_spectrum(&self) -> bool {
        self.descriptors.iter().any(|d| d.needs_spectrum())
    }
}

/// Frames x descriptors table of feature values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    descriptors: Vec<Descriptor>,
    columns: Vec<Vec<f64>>,
    num_frames: usize,
}

impl FeatureMatrix {
    /// Matrix with zero frames for the given descriptors
    pub fn empty(descriptors: &[Descriptor]) -> Self {
        Self {
            descriptors: descriptors.to_vec(),
            columns: vec![Vec::new(); descriptors.len()],
            num_frames: 0,
        }
    }

    /// Build from per-descriptor columns of equal length
    ///
    /// # Panics
    /// Panics if the column count or lengths disagree; this is a programming
    /// error inside the extractor, never a property of the input audio.
    pub fn from_columns(descriptors: Vec<Descriptor>, columns: Vec<Vec<f64>>) -> Self {
        assert_eq!(descriptors.len(), columns.len(), "one column per descriptor");
        let num_frames = columns.first().map(Vec::len).unwrap_or(0);
        assert!(
            columns.iter().all(|c| c.len() == num_frames),
            "feature columns must have equal length"
        );
        Self {
            descriptors,
            columns,
            num_frames,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Series of one descriptor across all frames
    pub fn column(&self, descriptor: Descriptor) -> Option<&[f64]> {
        self.descriptors
            .iter()
            .position(|&d| d == descriptor)
            .map(|idx| self.columns[idx].as_slice())
    }
}
