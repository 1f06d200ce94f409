// FeatureExtractor - windowed short-time descriptor extraction
//
// This module slices a waveform into overlapping frames and computes the
// configured set of acoustic descriptors for each one. Frames start at
// 0, hop, 2·hop, ... and a frame that would run past the last sample is
// dropped (no tail padding), so a waveform of N samples yields
// 1 + floor((N - window) / hop) frames, or none if N < window.
//
// Module organization:
// - types: Descriptor, FeatureSet, FeatureMatrix
// - fft: windowed magnitude spectra
// - spectral: frequency-domain descriptors (centroid, bandwidth, harmonic ratio, ...)
// - temporal: time-domain descriptors (energy, ZCR, rhythm periodicity)
// - mod.rs: Coordinator (FeatureExtractor)
//
// Per-frame descriptors are independent except spectral flux (needs the
// previous spectrum) and rhythm periodicity (needs the previous frame
// energies), which are both resolved in frame order here.

mod fft;
mod spectral;
mod temporal;
mod types;

pub use fft::WindowFunction;
pub use types::{Descriptor, FeatureMatrix, FeatureSet};

use std::ops::Range;

use crate::config::FeatureConfig;
use fft::FftProcessor;
use spectral::SpectralFeatures;

/// FeatureExtractor coordinates per-frame descriptor extraction
pub struct FeatureExtractor {
    feature_set: FeatureSet,
    window_size: usize,
    hop_length: usize,
    rhythm_window: usize,
    low_band_hz: [f64; 2],
    fft_processor: Option<FftProcessor>,
    spectral_features: Option<SpectralFeatures>,
}

impl FeatureExtractor {
    /// Create an extractor for one sample rate
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `config` - Frame geometry, taper and descriptor parameters
    /// * `feature_set` - Descriptors to compute, in output column order
    pub fn new(sample_rate: u32, config: &FeatureConfig, feature_set: FeatureSet) -> Self {
        let (window_size, hop_length) = config.frames.resolve(sample_rate);

        // Harmonic ratio plans a large autocorrelation FFT; skip it when unused
        let (fft_processor, spectral_features) = if feature_set.needs_spectrum() {
            (
                Some(FftProcessor::new(window_size, config.window_function)),
                Some(SpectralFeatures::new(sample_rate, window_size)),
            )
        } else {
            (None, None)
        };

        Self {
            feature_set,
            window_size,
            hop_length,
            rhythm_window: config.rhythm_window,
            low_band_hz: config.low_band_hz,
            fft_processor,
            spectral_features,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of complete frames that fit in `num_samples`
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if num_samples < self.window_size {
            0
        } else {
            1 + (num_samples - self.window_size) / self.hop_length
        }
    }

    /// Sample range covered by frame `index`
    pub fn frame_range(&self, index: usize) -> Range<usize> {
        let start = index * self.hop_length;
        start..start + self.window_size
    }

    /// Extract all configured descriptors for every frame
    ///
    /// Returns an empty matrix when the waveform is shorter than one window.
    pub fn extract(&self, samples: &[f32]) -> FeatureMatrix {
        let descriptors = self.feature_set.descriptors().to_vec();
        let num_frames = self.num_frames(samples.len());
        if num_frames == 0 {
            return FeatureMatrix::empty(&descriptors);
        }

        let wants_rhythm = self.feature_set.contains(Descriptor::RhythmPeriodicity);
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(num_frames); descriptors.len()];
        let mut frame_rms: Vec<f64> = Vec::with_capacity(if wants_rhythm { num_frames } else { 0 });
        let mut previous_spectrum: Option<Vec<f32>> = None;

        for index in 0..num_frames {
            let frame = &samples[self.frame_range(index)];

            let spectrum = self
                .fft_processor
                .as_ref()
                .map(|fft| fft.compute_magnitude_spectrum(frame));

            if wants_rhythm {
                frame_rms.push(temporal::compute_rms(frame));
            }

            let mut centroid: Option<f64> = None;
            for (column, &descriptor) in columns.iter_mut().zip(descriptors.iter()) {
                let value = match (descriptor, &spectrum, &self.spectral_features) {
                    (Descriptor::Energy, _, _) => temporal::compute_energy(frame),
                    (Descriptor::ZeroCrossingRate, _, _) => temporal::compute_zcr(frame),
                    // Filled in once all frame energies are known
                    (Descriptor::RhythmPeriodicity, _, _) => 0.0,
                    (Descriptor::HarmonicRatio, Some(spec), Some(sf)) => {
                        sf.compute_harmonic_ratio(spec)
                    }
                    (Descriptor::LowFrequencyEnergy, Some(spec), Some(sf)) => {
                        sf.compute_band_energy(spec, self.low_band_hz[0], self.low_band_hz[1])
                    }
                    (Descriptor::SpectralVariance, Some(spec), Some(sf)) => {
                        sf.compute_variance(spec)
                    }
                    (Descriptor::SpectralCentroid, Some(spec), Some(sf)) => {
                        *centroid.get_or_insert_with(|| sf.compute_centroid(spec))
                    }
                    (Descriptor::SpectralBandwidth, Some(spec), Some(sf)) => {
                        let c = *centroid.get_or_insert_with(|| sf.compute_centroid(spec));
                        sf.compute_bandwidth(spec, c)
                    }
                    (Descriptor::SpectralFlux, Some(spec), Some(sf)) => previous_spectrum
                        .as_deref()
                        .map(|prev| sf.compute_flux(spec, prev))
                        .unwrap_or(0.0),
                    // Spectral descriptors always come with a spectrum processor
                    (_, _, _) => 0.0,
                };
                column.push(value);
            }

            if spectrum.is_some() {
                previous_spectrum = spectrum;
            }
        }

        if wants_rhythm {
            let rhythm = temporal::compute_rhythm_periodicity(&frame_rms, self.rhythm_window);
            if let Some(idx) = descriptors
                .iter()
                .position(|&d| d == Descriptor::RhythmPeriodicity)
            {
                columns[idx] = rhythm;
            }
        }

        crate::trace_pipeline!(
            crate::debug::pipeline_tracer::PipelineStage::Features,
            "frames={} descriptors={} window={} hop={}",
            num_frames,
            descriptors.len(),
            self.window_size,
            self.hop_length
        );

        FeatureMatrix::from_columns(descriptors, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectorConfig, FrameGeometry};

    /// Generate pure sine wave for testing
    fn generate_sine_wave(sample_rate: u32, frequency: f32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    fn small_config(window_size: usize, hop_length: usize) -> FeatureConfig {
        let mut config = DetectorConfig::broadcast().features;
        config.frames = FrameGeometry::Samples {
            window_size,
            hop_length,
        };
        config
    }

    #[test]
    fn test_frame_count_formula() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(4096, 2048), FeatureSet::harmonic());
        assert_eq!(extractor.num_frames(4095), 0);
        assert_eq!(extractor.num_frames(4096), 1);
        assert_eq!(extractor.num_frames(6143), 1);
        assert_eq!(extractor.num_frames(6144), 2);
        assert_eq!(extractor.num_frames(320000), 155);
        assert_eq!(extractor.frame_range(2), 4096..8192);
    }

    #[test]
    fn test_short_waveform_yields_empty_matrix() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(1024, 512), FeatureSet::spectral());
        let matrix = extractor.extract(&[0.5; 1000]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.descriptors(), FeatureSet::spectral().descriptors());
    }

    #[test]
    fn test_columns_follow_feature_set_order() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(1024, 512), FeatureSet::spectral());
        let signal = generate_sine_wave(16000, 440.0, 16000);
        let matrix = extractor.extract(&signal);
        assert_eq!(matrix.num_frames(), 30);
        assert_eq!(matrix.descriptors(), FeatureSet::spectral().descriptors());
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(2048, 1024), FeatureSet::spectral());
        let low = extractor.extract(&generate_sine_wave(16000, 300.0, 8192));
        let high = extractor.extract(&generate_sine_wave(16000, 3000.0, 8192));

        let low_centroid = low.column(Descriptor::SpectralCentroid).unwrap()[0];
        let high_centroid = high.column(Descriptor::SpectralCentroid).unwrap()[0];
        assert!(low_centroid < 600.0, "low centroid {}", low_centroid);
        assert!(high_centroid > 2500.0, "high centroid {}", high_centroid);
    }

    #[test]
    fn test_first_frame_flux_is_zero() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(1024, 512), FeatureSet::spectral());
        let mut signal = vec![0.0f32; 4096];
        signal.extend(generate_sine_wave(16000, 440.0, 4096));
        let matrix = extractor.extract(&signal);

        let flux = matrix.column(Descriptor::SpectralFlux).unwrap();
        assert_eq!(flux[0], 0.0);
        assert!(flux.iter().any(|&f| f > 0.0));
    }

    #[test]
    fn test_low_band_energy_separates_tone_from_silence() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(4096, 2048), FeatureSet::harmonic());
        let mut signal = vec![0.0f32; 16000];
        signal.extend(generate_sine_wave(16000, 200.0, 16000));
        let matrix = extractor.extract(&signal);

        let low = matrix.column(Descriptor::LowFrequencyEnergy).unwrap();
        assert_eq!(low[0], 0.0);
        assert!(low[matrix.num_frames() - 1] > 1.0);
    }

    #[test]
    fn test_rhythm_column_is_zero_without_history() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(1024, 1024), FeatureSet::harmonic());
        let signal = generate_sine_wave(16000, 200.0, 1024 * 10);
        let matrix = extractor.extract(&signal);
        let rhythm = matrix.column(Descriptor::RhythmPeriodicity).unwrap();
        assert_eq!(rhythm.len(), 10);
        assert!(rhythm.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_time_domain_only_set_skips_fft() {
        let extractor = FeatureExtractor::new(
            16000,
            &small_config(512, 256),
            FeatureSet::new(vec![Descriptor::Energy, Descriptor::ZeroCrossingRate]),
        );
        assert!(extractor.fft_processor.is_none());
        let matrix = extractor.extract(&[0.5; 1024]);
        assert_eq!(matrix.column(Descriptor::Energy).unwrap()[0], 0.25);
        assert_eq!(matrix.column(Descriptor::ZeroCrossingRate).unwrap()[0], 0.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor =
            FeatureExtractor::new(16000, &small_config(2048, 1024), FeatureSet::harmonic());
        let signal = generate_sine_wave(16000, 330.0, 16000 * 3);
        assert_eq!(extractor.extract(&signal), extractor.extract(&signal));
    }
}
