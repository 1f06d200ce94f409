//! Configuration for the music detection pipeline
//!
//! Every tunable of a detection run (frame geometry, descriptor weights,
//! smoothing, decision thresholds and segment post-processing bounds) lives
//! in one immutable [`DetectorConfig`] value handed to the detector at
//! construction. Two presets mirror the supported strategies: a
//! harmonic/rhythm model for voice-over-music broadcasts and a faster
//! spectral model with hysteresis. Configs round-trip through JSON so they
//! can be tuned without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::features::{Descriptor, FeatureSet, WindowFunction};
use crate::error::DetectionError;

/// How permissive the static threshold is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    /// Only clearly audible music
    Low,
    /// Moderate background music
    Medium,
    /// Faint background music under speech
    High,
}

impl Sensitivity {
    /// Multiplier `k` in `threshold = median + k * std`
    pub fn threshold_multiplier(self) -> f64 {
        match self {
            Sensitivity::Low => 0.3,
            Sensitivity::Medium => 0.15,
            Sensitivity::High => 0.05,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl FromStr for Sensitivity {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => Err(DetectionError::InvalidConfig {
                reason: format!("unknown sensitivity '{}' (expected low, medium or high)", other),
            }),
        }
    }
}

/// Frame length and stride, either in samples or in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameGeometry {
    Samples { window_size: usize, hop_length: usize },
    Seconds { win_sec: f64, hop_sec: f64 },
}

impl FrameGeometry {
    /// Resolve to `(window_size, hop_length)` in samples for a sample rate
    pub fn resolve(&self, sample_rate: u32) -> (usize, usize) {
        let (window, hop) = match *self {
            FrameGeometry::Samples {
                window_size,
                hop_length,
            } => (window_size, hop_length),
            FrameGeometry::Seconds { win_sec, hop_sec } => (
                (win_sec * sample_rate as f64) as usize,
                (hop_sec * sample_rate as f64) as usize,
            ),
        };
        (window.max(2), hop.max(1))
    }
}

/// Short-time feature extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub frames: FrameGeometry,
    /// Taper applied to each frame before the FFT
    pub window_function: WindowFunction,
    /// Number of past frame energies inspected by the rhythm descriptor
    pub rhythm_window: usize,
    /// Inclusive band (Hz) averaged by the low-frequency energy descriptor
    pub low_band_hz: [f64; 2],
}

/// Per-column normalization applied before fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// `(x - mean) / (std + eps)`, zero column when std is negligible
    ZScore,
    /// `(x - median) / (1.4826 * MAD + eps)`
    RobustZScore,
}

/// One term of the fused musicness score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedDescriptor {
    pub descriptor: Descriptor,
    pub weight: f64,
}

impl WeightedDescriptor {
    pub const fn new(descriptor: Descriptor, weight: f64) -> Self {
        Self { descriptor, weight }
    }
}

/// Score fusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub normalization: Normalization,
    /// Moving-average kernel length in frames (odd)
    pub smoothing_window: usize,
    pub weights: Vec<WeightedDescriptor>,
}

/// Frame labelling policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DecisionConfig {
    /// Active iff `score > median + k * std`
    StaticThreshold { k: f64 },
    /// Turn on at `mean + high_k * std`, stay on until below `mean + low_k * std`
    Hysteresis { high_k: f64, low_k: f64 },
}

/// Which instant of a frame a segment boundary is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTiming {
    /// Boundary at the frame's first sample
    WindowStart,
    /// Boundary at the frame center minus half a window
    Centered,
}

/// Segment building and post-processing parameters (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub frame_timing: FrameTiming,
    pub merge_gap: f64,
    pub min_music_duration: f64,
    pub max_duration: f64,
    pub min_duration_after_split: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            frame_timing: FrameTiming::WindowStart,
            merge_gap: 3.0,
            min_music_duration: 5.0,
            // Upper bound accepted by the downstream recognition API
            max_duration: 15.0,
            min_duration_after_split: 5.0,
        }
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub features: FeatureConfig,
    pub fusion: FusionConfig,
    pub decision: DecisionConfig,
    pub segments: SegmentConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::broadcast()
    }
}

impl DetectorConfig {
    /// Harmonic/rhythm model for speech over background music
    pub fn broadcast() -> Self {
        Self {
            features: FeatureConfig {
                frames: FrameGeometry::Samples {
                    window_size: 4096,
                    hop_length: 2048,
                },
                window_function: WindowFunction::Hamming,
                rhythm_window: 20,
                low_band_hz: [50.0, 500.0],
            },
            fusion: FusionConfig {
                normalization: Normalization::ZScore,
                // ~1 s at 2048-sample hops
                smoothing_window: 21,
                weights: vec![
                    WeightedDescriptor::new(Descriptor::HarmonicRatio, 0.35),
                    WeightedDescriptor::new(Descriptor::LowFrequencyEnergy, 0.25),
                    WeightedDescriptor::new(Descriptor::SpectralVariance, 0.20),
                    WeightedDescriptor::new(Descriptor::RhythmPeriodicity, 0.20),
                ],
            },
            decision: DecisionConfig::StaticThreshold {
                k: Sensitivity::Medium.threshold_multiplier(),
            },
            segments: SegmentConfig::default(),
        }
    }

    /// Spectral centroid/bandwidth/flux model with hysteresis
    pub fn fast() -> Self {
        Self {
            features: FeatureConfig {
                frames: FrameGeometry::Seconds {
                    win_sec: 0.5,
                    hop_sec: 0.25,
                },
                window_function: WindowFunction::Hamming,
                rhythm_window: 20,
                low_band_hz: [50.0, 500.0],
            },
            fusion: FusionConfig {
                normalization: Normalization::RobustZScore,
                smoothing_window: 5,
                weights: vec![
                    WeightedDescriptor::new(Descriptor::Energy, 0.8),
                    WeightedDescriptor::new(Descriptor::SpectralBandwidth, 0.8),
                    WeightedDescriptor::new(Descriptor::SpectralCentroid, 0.4),
                    // Unvoiced speech and noise cross zero often
                    WeightedDescriptor::new(Descriptor::ZeroCrossingRate, -0.6),
                    WeightedDescriptor::new(Descriptor::SpectralFlux, 0.5),
                ],
            },
            decision: DecisionConfig::Hysteresis {
                high_k: 0.6,
                low_k: 0.2,
            },
            segments: SegmentConfig {
                frame_timing: FrameTiming::Centered,
                merge_gap: 1.5,
                ..SegmentConfig::default()
            },
        }
    }

    /// Replace the static-threshold multiplier with a sensitivity level
    ///
    /// Hysteresis configs carry their own multipliers and are returned unchanged.
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        match &mut self.decision {
            DecisionConfig::StaticThreshold { k } => *k = sensitivity.threshold_multiplier(),
            DecisionConfig::Hysteresis { .. } => {
                log::warn!(
                    "[Config] Sensitivity '{}' ignored: hysteresis policy in use",
                    sensitivity.as_str()
                );
            }
        }
        self
    }

    /// Descriptors the extractor must compute for this config
    pub fn feature_set(&self) -> FeatureSet {
        FeatureSet::new(self.fusion.weights.iter().map(|w| w.descriptor).collect())
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), DetectionError> {
        let invalid = |reason: String| Err(DetectionError::InvalidConfig { reason });

        match self.features.frames {
            FrameGeometry::Samples {
                window_size,
                hop_length,
            } => {
                if window_size < 2 {
                    return invalid(format!("window_size must be >= 2 (got {})", window_size));
                }
                if hop_length == 0 {
                    return invalid("hop_length must be > 0".to_string());
                }
            }
            FrameGeometry::Seconds { win_sec, hop_sec } => {
                if !(win_sec > 0.0) || !(hop_sec > 0.0) {
                    return invalid(format!(
                        "win_sec and hop_sec must be > 0 (got {}, {})",
                        win_sec, hop_sec
                    ));
                }
            }
        }

        let [band_low, band_high] = self.features.low_band_hz;
        if band_low < 0.0 || band_high < band_low {
            return invalid(format!(
                "low_band_hz must be an ascending non-negative range (got {:?})",
                self.features.low_band_hz
            ));
        }

        if self.fusion.smoothing_window == 0 || self.fusion.smoothing_window % 2 == 0 {
            return invalid(format!(
                "smoothing_window must be odd and >= 1 (got {})",
                self.fusion.smoothing_window
            ));
        }
        if self.fusion.weights.is_empty() {
            return invalid("at least one weighted descriptor is required".to_string());
        }
        if self
            .fusion
            .weights
            .iter()
            .any(|w| w.descriptor == Descriptor::RhythmPeriodicity)
            && self.features.rhythm_window < 3
        {
            return invalid(format!(
                "rhythm_window must be >= 3 (got {})",
                self.features.rhythm_window
            ));
        }

        if let DecisionConfig::Hysteresis { high_k, low_k } = self.decision {
            if low_k > high_k {
                return invalid(format!(
                    "hysteresis low_k ({}) must not exceed high_k ({})",
                    low_k, high_k
                ));
            }
        }

        let seg = &self.segments;
        if !(seg.merge_gap >= 0.0) || !(seg.min_music_duration >= 0.0) {
            return invalid("merge_gap and min_music_duration must be >= 0".to_string());
        }
        if !(seg.max_duration > 0.0) {
            return invalid(format!("max_duration must be > 0 (got {})", seg.max_duration));
        }
        if !(seg.min_duration_after_split >= 0.0)
            || seg.max_duration < seg.min_duration_after_split
        {
            return invalid(format!(
                "min_duration_after_split ({}) must lie in [0, max_duration ({})]",
                seg.min_duration_after_split, seg.max_duration
            ));
        }

        Ok(())
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the default config if the file is
    /// missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_file(&path) {
            Ok(config) => {
                log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                config
            }
            Err(err) => {
                log::warn!(
                    "[Config] Failed to load {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load and validate configuration from JSON file, surfacing any failure
    pub fn try_load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectionError> {
        let contents =
            fs::read_to_string(&path).map_err(|err| DetectionError::InvalidConfig {
                reason: format!("reading {}: {}", path.as_ref().display(), err),
            })?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|err| DetectionError::InvalidConfig {
                reason: format!("parsing {}: {}", path.as_ref().display(), err),
            })?;
        config.validate()?;
        Ok(config)
    }
}
