// Spectral module - Frequency-domain descriptor extraction
//
// This module computes per-frame descriptors from magnitude spectra.
// Bin k of an N-point transform sits at k * sample_rate / N Hz.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Guard added to spectral sums before dividing
const SPECTRAL_EPSILON: f64 = 1e-9;

/// Guard added to the autocorrelation peak before normalizing
const PEAK_EPSILON: f64 = 1e-10;

/// Fraction of the autocorrelation peak a lag must exceed to count as harmonic
const HARMONIC_PEAK_THRESHOLD: f64 = 0.5;

/// Spectral descriptor computation functions
pub struct SpectralFeatures {
    sample_rate: u32,
    fft_size: usize,
    autocorrelation: SpectrumAutocorrelation,
}

impl SpectralFeatures {
    /// Create a new spectral features processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `fft_size` - FFT frame length the spectra were computed with
    pub fn new(sample_rate: u32, fft_size: usize) -> Self {
        Self {
            sample_rate,
            fft_size,
            autocorrelation: SpectrumAutocorrelation::new(fft_size / 2 + 1),
        }
    }

    fn bin_frequency(&self, bin: usize) -> f64 {
        bin as f64 * self.sample_rate as f64 / self.fft_size as f64
    }

    /// Compute spectral centroid (weighted mean frequency)
    ///
    /// Formula: centroid = Σ(f_i × |X[i]|) / (Σ|X[i]| + ε)
    ///
    /// # Returns
    /// Spectral centroid in Hz (0 for a silent frame)
    pub fn compute_centroid(&self, spectrum: &[f32]) -> f64 {
        let weighted_sum: f64 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| self.bin_frequency(i) * mag as f64)
            .sum();
        let magnitude_sum: f64 = spectrum.iter().map(|&m| m as f64).sum();

        weighted_sum / (magnitude_sum + SPECTRAL_EPSILON)
    }

    /// Compute spectral bandwidth (spread around the centroid)
    ///
    /// Formula: bandwidth = sqrt(Σ((f_i - centroid)² × |X[i]|) / (Σ|X[i]| + ε))
    pub fn compute_bandwidth(&self, spectrum: &[f32], centroid: f64) -> f64 {
        let spread: f64 = spectrum
            .iter()
            .enumerate()
            .map(|(i, &mag)| {
                let delta = self.bin_frequency(i) - centroid;
                delta * delta * mag as f64
            })
            .sum();
        let magnitude_sum: f64 = spectrum.iter().map(|&m| m as f64).sum();

        (spread / (magnitude_sum + SPECTRAL_EPSILON)).sqrt()
    }

    /// Mean magnitude over bins whose frequency lies in `[low_hz, high_hz]`
    ///
    /// Returns 0 when no bin falls inside the band.
    pub fn compute_band_energy(&self, spectrum: &[f32], low_hz: f64, high_hz: f64) -> f64 {
        let (sum, count) = spectrum
            .iter()
            .enumerate()
            .filter(|(i, _)| {
                let freq = self.bin_frequency(*i);
                freq >= low_hz && freq <= high_hz
            })
            .fold((0.0f64, 0usize), |(sum, count), (_, &mag)| {
                (sum + mag as f64, count + 1)
            });

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Population variance of the magnitude values
    pub fn compute_variance(&self, spectrum: &[f32]) -> f64 {
        if spectrum.is_empty() {
            return 0.0;
        }
        let n = spectrum.len() as f64;
        let mean = spectrum.iter().map(|&m| m as f64).sum::<f64>() / n;
        spectrum
            .iter()
            .map(|&m| {
                let d = m as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n
    }

    /// Compute spectral flux against the previous frame
    ///
    /// SF(t) = Σ (|X_t[k]| - |X_(t-1)[k]|)²
    pub fn compute_flux(&self, spectrum: &[f32], previous: &[f32]) -> f64 {
        spectrum
            .iter()
            .zip(previous.iter())
            .map(|(&curr, &prev)| {
                let d = curr as f64 - prev as f64;
                d * d
            })
            .sum()
    }

    /// Compute harmonic ratio from the spectrum's autocorrelation
    ///
    /// The spectrum is autocorrelated over a centered lag range the size of
    /// the spectrum, peak-normalized, and the share of lags above 0.5 is
    /// returned. Evenly spaced harmonics keep the autocorrelation high at
    /// many lags; a single formant or broadband noise does not.
    pub fn compute_harmonic_ratio(&self, spectrum: &[f32]) -> f64 {
        let m = spectrum.len();
        if m == 0 {
            return 0.0;
        }
        let acf = self.autocorrelation.compute(spectrum);

        // Centered window of m lags: -ceil((m-1)/2) ..= floor((m-1)/2)
        let positive_extent = (m - 1) / 2;
        let negative_extent = (m - 1) - positive_extent;

        let lags = (0..=positive_extent).chain(1..=negative_extent);
        let peak = lags
            .clone()
            .map(|lag| acf[lag])
            .fold(f64::NEG_INFINITY, f64::max);
        let norm = peak + PEAK_EPSILON;

        let count = lags
            .filter(|&lag| acf[lag] / norm > HARMONIC_PEAK_THRESHOLD)
            .count();
        count as f64 / m as f64
    }
}

/// FFT-based autocorrelation of fixed-length spectra
///
/// Direct autocorrelation of a 2049-bin spectrum costs millions of products
/// per frame; zero-padding to a power of two ≥ 2m - 1 and taking the inverse
/// transform of the power spectrum gives the same linear autocorrelation.
struct SpectrumAutocorrelation {
    len: usize,
    padded_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl SpectrumAutocorrelation {
    fn new(len: usize) -> Self {
        let padded_len = (2 * len.max(1) - 1).next_power_of_two();
        let mut planner = FftPlanner::new();
        Self {
            len,
            padded_len,
            forward: planner.plan_fft_forward(padded_len),
            inverse: planner.plan_fft_inverse(padded_len),
        }
    }

    /// Non-negative lags 0..len of the linear autocorrelation
    fn compute(&self, values: &[f32]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = values
            .iter()
            .take(self.len)
            .map(|&v| Complex::new(v as f64, 0.0))
            .collect();
        buffer.resize(self.padded_len, Complex::new(0.0, 0.0));

        self.forward.process(&mut buffer);
        for bin in buffer.iter_mut() {
            *bin = Complex::new(bin.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut buffer);

        let scale = self.padded_len as f64;
        buffer[..self.len].iter().map(|c| c.re / scale).collect()
    }
}
