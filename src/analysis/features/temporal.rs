// Temporal module - Time-domain descriptor extraction
//
// This module computes descriptors directly from time-domain frames
// (energy, zero-crossing rate) and the rhythm periodicity series derived
// from a run of frame energies.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Guard added to the zero-lag autocorrelation before normalizing
const PEAK_EPSILON: f64 = 1e-10;

/// Mean squared amplitude of a frame
pub fn compute_energy(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|&s| s as f64 * s as f64).sum::<f64>() / frame.len() as f64
}

/// Root-mean-square amplitude of a frame
pub fn compute_rms(frame: &[f32]) -> f64 {
    compute_energy(frame).sqrt()
}

/// Compute zero-crossing rate (ZCR)
///
/// Fraction of adjacent sample pairs whose signs differ, with zero counted
/// as positive. A silent frame therefore has a ZCR of 0.
///
/// # Returns
/// Zero-crossing rate (0.0 to 1.0)
pub fn compute_zcr(frame: &[f32]) -> f64 {
    if frame.len() < 2 {
        return 0.0;
    }

    let crossings = frame
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();

    crossings as f64 / (frame.len() - 1) as f64
}

/// Rhythm periodicity per frame from a series of frame energies (RMS)
///
/// Frame `i` looks at the `window` energies strictly before it, takes their
/// autocorrelation normalized by the zero-lag value, and keeps the largest
/// value over lags `1..=(window - 1) / 2`. Frames with fewer than `window`
/// predecessors score 0, as does every frame when the series is shorter
/// than `window`.
pub fn compute_rhythm_periodicity(energies: &[f64], window: usize) -> Vec<f64> {
    let mut scores = vec![0.0; energies.len()];
    if window < 2 || energies.len() < window {
        return scores;
    }

    let max_lag = (window - 1) / 2;
    for (i, score) in scores.iter_mut().enumerate().skip(window) {
        let history = &energies[i - window..i];
        let zero_lag: f64 = history.iter().map(|e| e * e).sum();
        let norm = zero_lag + PEAK_EPSILON;

        *score = (1..=max_lag)
            .map(|lag| {
                history[..window - lag]
                    .iter()
                    .zip(&history[lag..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / norm
            })
            .fold(0.0, f64::max);
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_and_rms() {
        let frame = [1.0f32, -1.0, 1.0, -1.0];
        assert_eq!(compute_energy(&frame), 1.0);
        assert_eq!(compute_rms(&[0.5f32; 8]), 0.5);
        assert_eq!(compute_energy(&[]), 0.0);
    }

    #[test]
    fn test_zcr_alternating_signal() {
        let frame = [1.0f32, -1.0, 1.0, -1.0, 1.0];
        assert_eq!(compute_zcr(&frame), 1.0);
    }

    #[test]
    fn test_zcr_treats_zero_as_positive() {
        assert_eq!(compute_zcr(&[0.0f32; 64]), 0.0);
        // 0 -> -1 is a crossing, -1 -> 0 is a crossing
        assert_eq!(compute_zcr(&[0.0f32, -1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_zcr_sine_vs_noise() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let sample_rate = 16000.0;
        let sine: Vec<f32> = (0..4096)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / sample_rate).sin())
            .collect();

        let mut rng = StdRng::seed_from_u64(7);
        let noise: Vec<f32> = (0..4096).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let sine_zcr = compute_zcr(&sine);
        let noise_zcr = compute_zcr(&noise);
        assert!(sine_zcr < 0.05, "sine ZCR {}", sine_zcr);
        assert!(noise_zcr > 0.3, "noise ZCR {}", noise_zcr);
    }

    #[test]
    fn test_rhythm_needs_full_history() {
        let energies = vec![1.0; 10];
        assert_eq!(compute_rhythm_periodicity(&energies, 20), vec![0.0; 10]);

        let energies = vec![1.0; 25];
        let scores = compute_rhythm_periodicity(&energies, 20);
        assert!(scores[..20].iter().all(|&s| s == 0.0));
        assert!(scores[20..].iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_rhythm_excludes_zero_lag() {
        // A lone impulse only correlates with itself at lag 0
        let mut energies = vec![0.0; 30];
        energies[15] = 1.0;
        let scores = compute_rhythm_periodicity(&energies, 20);
        assert!(scores.iter().all(|&s| s < 1e-9));
    }

    #[test]
    fn test_rhythm_detects_periodic_pulses() {
        // Pulse every 4 frames vs. steady energy with a single spike
        let periodic: Vec<f64> = (0..40).map(|i| if i % 4 == 0 { 1.0 } else { 0.0 }).collect();
        let mut irregular = vec![0.0; 40];
        irregular[33] = 1.0;
        irregular[38] = 1.0;

        let periodic_score = compute_rhythm_periodicity(&periodic, 20)[39];
        let irregular_score = compute_rhythm_periodicity(&irregular, 20)[39];
        assert!(periodic_score > 0.5, "periodic score {}", periodic_score);
        assert!(
            periodic_score > irregular_score,
            "periodic {} vs irregular {}",
            periodic_score,
            irregular_score
        );
    }

    #[test]
    fn test_rhythm_silence_scores_zero() {
        let scores = compute_rhythm_periodicity(&vec![0.0; 50], 20);
        assert!(scores.iter().all(|&s| s == 0.0));
    }
}
