// ScoreFusionEngine - combine descriptor series into one musicness score
//
// Algorithm:
// 1. Normalize every descriptor column on its own (z-score or robust z-score)
// 2. Weighted sum of the normalized columns (fixed weights, negative allowed)
// 3. Centered moving average with edge-replicated padding
//
// A column with no spread contributes nothing instead of dividing by ~0.

use crate::analysis::features::FeatureMatrix;
use crate::analysis::stats;
use crate::config::{FusionConfig, Normalization, WeightedDescriptor};

/// Guard added to the standard deviation in z-scores
const STD_EPSILON: f64 = 1e-10;

/// Guard added to the MAD in robust z-scores
const MAD_EPSILON: f64 = 1e-9;

/// Scale that makes the MAD a consistent estimator of the Gaussian std
const MAD_SCALE: f64 = 1.4826;

/// Standard z-score: `(x - mean) / (std + eps)`
///
/// Returns all zeros when the column's std is below 1e-10.
pub fn z_score(values: &[f64]) -> Vec<f64> {
    let sd = stats::std_dev(values);
    if sd < STD_EPSILON {
        return vec![0.0; values.len()];
    }
    let mu = stats::mean(values);
    values.iter().map(|v| (v - mu) / (sd + STD_EPSILON)).collect()
}

/// Robust z-score: `(x - median) / (1.4826 * MAD + eps)`
///
/// A single loud transient barely moves the median or the MAD, so the
/// remaining frames keep their scale.
pub fn robust_z_score(values: &[f64]) -> Vec<f64> {
    let center = stats::median(values);
    let scale = MAD_SCALE * stats::median_absolute_deviation(values) + MAD_EPSILON;
    values.iter().map(|v| (v - center) / scale).collect()
}

/// Centered moving average with edge-replicated padding
///
/// Output length equals input length. Even kernels are rounded up to the
/// next odd length.
pub fn moving_average(values: &[f64], kernel: usize) -> Vec<f64> {
    if values.is_empty() || kernel <= 1 {
        return values.to_vec();
    }
    let half = kernel / 2;
    let width = 2 * half + 1;
    let last = values.len() - 1;

    (0..values.len())
        .map(|i| {
            // saturating_sub replicates the left edge, min the right one
            let sum: f64 = (0..width)
                .map(|k| values[(i + k).saturating_sub(half).min(last)])
                .sum();
            sum / width as f64
        })
        .collect()
}

/// Fuses a FeatureMatrix into a smoothed score series
pub struct ScoreFusionEngine {
    normalization: Normalization,
    smoothing_window: usize,
    weights: Vec<WeightedDescriptor>,
}

impl ScoreFusionEngine {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            normalization: config.normalization,
            smoothing_window: config.smoothing_window,
            weights: config.weights.clone(),
        }
    }

    fn normalize(&self, values: &[f64]) -> Vec<f64> {
        match self.normalization {
            Normalization::ZScore => z_score(values),
            Normalization::RobustZScore => robust_z_score(values),
        }
    }

    /// Weighted sum of normalized descriptor columns, before smoothing
    ///
    /// Weighted descriptors missing from the matrix contribute nothing.
    pub fn fuse(&self, features: &FeatureMatrix) -> Vec<f64> {
        let mut score = vec![0.0; features.num_frames()];
        for weighted in &self.weights {
            let Some(column) = features.column(weighted.descriptor) else {
                log::warn!(
                    "[Fusion] Descriptor {} missing from feature matrix",
                    weighted.descriptor.as_str()
                );
                continue;
            };
            for (acc, z) in score.iter_mut().zip(self.normalize(column)) {
                *acc += weighted.weight * z;
            }
        }
        score
    }

    /// Fused and smoothed score series, one value per frame
    pub fn score(&self, features: &FeatureMatrix) -> Vec<f64> {
        let smoothed = moving_average(&self.fuse(features), self.smoothing_window);

        if !smoothed.is_empty() {
            crate::trace_pipeline!(
                crate::debug::pipeline_tracer::PipelineStage::Fusion,
                "frames={} mean={:.3} max={:.3}",
                smoothed.len(),
                stats::mean(&smoothed),
                smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            );
        }
        smoothed
    }
}
