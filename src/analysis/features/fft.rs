// FFT module - Fast Fourier Transform computation
//
// This module handles FFT computation with a tapering window to reduce
// spectral leakage. The magnitude spectrum is used by spectral descriptor
// extraction and by the harmonic-ratio autocorrelation.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tapering window applied to each frame before the FFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    /// 0.54 - 0.46 cos(2πn / (N - 1))
    Hamming,
    /// 0.5 (1 - cos(2πn / (N - 1)))
    Hann,
    /// No tapering
    Rectangular,
}

impl WindowFunction {
    /// Pre-compute the symmetric window of the given length
    pub fn coefficients(self, len: usize) -> Vec<f32> {
        if len < 2 {
            return vec![1.0; len];
        }
        let denom = (len - 1) as f32;
        (0..len)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / denom;
                match self {
                    WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
                    WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
                    WindowFunction::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

/// FFT processor that computes magnitude spectra from audio frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Taper for each frame (pre-computed)
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - Frame length in samples
    /// * `window_function` - Taper applied before the transform
    pub fn new(fft_size: usize, window_function: WindowFunction) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            fft_size,
            window: window_function.coefficients(fft_size),
        }
    }

    /// Number of bins in the one-sided spectrum
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute magnitude spectrum using FFT
    ///
    /// Applies the taper, performs the FFT, and returns the magnitude spectrum
    /// for non-negative frequencies only (real input is conjugate-symmetric).
    ///
    /// # Arguments
    /// * `frame` - Audio frame (length <= fft_size, shorter frames are zero-padded)
    ///
    /// # Returns
    /// Magnitude spectrum (size = fft_size / 2 + 1)
    pub fn compute_magnitude_spectrum(&self, frame: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        buffer[..self.num_bins()].iter().map(|c| c.norm()).collect()
    }
}
