// ActivityDecider - binarize a smoothed score series into per-frame labels
//
// Two interchangeable policies sit behind the DecisionPolicy trait:
// - StaticThreshold: active iff score > median + k * std (stateless)
// - Hysteresis: turns on at mean + high_k * std, stays on until the score
//   drops below mean + low_k * std
//
// Thresholds adapt to each run's score statistics, so a quiet recording and
// a loud one are judged relative to themselves.

use crate::analysis::stats;
use crate::config::DecisionConfig;

/// Added to the score std before scaling hysteresis thresholds
const HYSTERESIS_STD_EPSILON: f64 = 1e-9;

/// Maps a score series to one activity label per frame
pub trait DecisionPolicy: Send + Sync {
    /// Label every frame; output length equals `scores.len()`
    fn decide(&self, scores: &[f64]) -> Vec<bool>;

    /// Short policy name for logs and reports
    fn name(&self) -> &'static str;
}

/// Single adaptive threshold at `median + k * std`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticThreshold {
    pub k: f64,
}

impl StaticThreshold {
    pub fn threshold(&self, scores: &[f64]) -> f64 {
        stats::median(scores) + self.k * stats::std_dev(scores)
    }
}

impl DecisionPolicy for StaticThreshold {
    fn decide(&self, scores: &[f64]) -> Vec<bool> {
        let threshold = self.threshold(scores);
        log::debug!("[Decision] static threshold={:.4} (k={})", threshold, self.k);
        scores.iter().map(|&s| s > threshold).collect()
    }

    fn name(&self) -> &'static str {
        "static_threshold"
    }
}

/// Dual-threshold state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    pub high_k: f64,
    pub low_k: f64,
}

impl Hysteresis {
    /// `(high, low)` thresholds for a score series
    pub fn thresholds(&self, scores: &[f64]) -> (f64, f64) {
        let mu = stats::mean(scores);
        let sd = stats::std_dev(scores) + HYSTERESIS_STD_EPSILON;
        (mu + self.high_k * sd, mu + self.low_k * sd)
    }
}

impl DecisionPolicy for Hysteresis {
    fn decide(&self, scores: &[f64]) -> Vec<bool> {
        let (high, low) = self.thresholds(scores);
        log::debug!("[Decision] hysteresis high={:.4} low={:.4}", high, low);

        let mut active = false;
        scores
            .iter()
            .map(|&s| {
                if !active && s >= high {
                    active = true;
                } else if active && s < low {
                    active = false;
                }
                active
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "hysteresis"
    }
}

/// Build the policy selected by a config
pub fn policy_from_config(config: &DecisionConfig) -> Box<dyn DecisionPolicy> {
    match *config {
        DecisionConfig::StaticThreshold { k } => Box::new(StaticThreshold { k }),
        DecisionConfig::Hysteresis { high_k, low_k } => Box::new(Hysteresis { high_k, low_k }),
    }
}
