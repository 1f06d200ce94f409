// Analysis module - music-presence detection pipeline
//
// This module orchestrates one detection run over a complete waveform and
// turns it into duration-bounded music segments.
//
// Architecture:
// - MusicDetector: owns the immutable DetectorConfig and runs the stages
// - Pipeline: FeatureExtractor → ScoreFusionEngine → DecisionPolicy →
//   SegmentBuilder → SegmentPostProcessor
// - Output: DetectionReport with the final segments and per-stage counts
//
// Every intermediate array is local to `detect`; nothing carries over
// between runs, so identical input and config give identical output.

pub mod decision;
pub mod features;
pub mod fusion;
pub mod postprocess;
pub mod segments;
pub mod stats;

use std::path::Path;

use serde::Serialize;

use crate::audio::{read_audio, Waveform};
use crate::config::DetectorConfig;
use crate::debug::pipeline_tracer;
use crate::error::{log_detection_error, DetectionError};
use crate::timecode::segment_to_pair;

use decision::{policy_from_config, DecisionPolicy};
use features::FeatureExtractor;
use fusion::ScoreFusionEngine;
use postprocess::SegmentPostProcessor;
use segments::{Segment, SegmentBuilder};

/// Runs with fewer analysis frames than this report no music
pub const MIN_ANALYSIS_FRAMES: usize = 3;

/// Result of one detection run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Decision policy that labelled the frames
    pub policy: String,
    pub num_frames: usize,
    pub active_frames: usize,
    pub raw_segments: usize,
    pub merged_segments: usize,
    pub filtered_segments: usize,
    /// Split remainders discarded for being shorter than the floor
    pub dropped_remainders: usize,
    /// Final segments in seconds, sorted and disjoint
    pub segments: Vec<Segment>,
}

impl DetectionReport {
    fn empty(waveform: &Waveform, policy: &str, num_frames: usize) -> Self {
        Self {
            sample_rate: waveform.sample_rate(),
            duration_secs: waveform.duration_secs(),
            policy: policy.to_string(),
            num_frames,
            active_frames: 0,
            raw_segments: 0,
            merged_segments: 0,
            filtered_segments: 0,
            dropped_remainders: 0,
            segments: Vec::new(),
        }
    }

    /// Final segments as `[MM:SS, MM:SS]` pairs
    pub fn timecodes(&self) -> Vec<[String; 2]> {
        let pairs: Vec<[String; 2]> = self.segments.iter().map(segment_to_pair).collect();
        pipeline_tracer::trace_format(&pairs);
        pairs
    }

    pub fn has_music(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Music-presence detector for one configuration
pub struct MusicDetector {
    config: DetectorConfig,
    policy: Box<dyn DecisionPolicy>,
}

impl MusicDetector {
    /// Create a detector, rejecting inconsistent configs
    pub fn new(config: DetectorConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        let policy = policy_from_config(&config.decision);
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Decode an audio file (WAV, MP3, Ogg Vorbis, FLAC) and detect music in it
    pub fn detect_file<P: AsRef<Path>>(&self, path: P) -> Result<DetectionReport, DetectionError> {
        let waveform = read_audio(path.as_ref()).map_err(|err| {
            log_detection_error(&err, "MusicDetector::detect_file");
            err
        })?;
        Ok(self.detect(&waveform))
    }

    /// Detect music segments in a complete waveform
    ///
    /// Too-short or silent input is not an error: the report simply has no
    /// segments.
    pub fn detect(&self, waveform: &Waveform) -> DetectionReport {
        let normalized = waveform.peak_normalized();
        pipeline_tracer::trace_load(normalized.len(), normalized.sample_rate(), waveform.peak());

        let extractor = FeatureExtractor::new(
            normalized.sample_rate(),
            &self.config.features,
            self.config.feature_set(),
        );
        let features = extractor.extract(normalized.samples());
        let num_frames = features.num_frames();

        if num_frames < MIN_ANALYSIS_FRAMES {
            tracing::info!(
                "[MusicDetector] Only {} analysis frames ({:.2}s of audio), no music reported",
                num_frames,
                waveform.duration_secs()
            );
            return DetectionReport::empty(waveform, self.policy.name(), num_frames);
        }

        let scores = ScoreFusionEngine::new(&self.config.fusion).score(&features);

        let labels = self.policy.decide(&scores);
        let active_frames = labels.iter().filter(|&&active| active).count();
        pipeline_tracer::trace_decision(self.policy.name(), active_frames, labels.len());

        let builder = SegmentBuilder::new(
            self.config.segments.frame_timing,
            extractor.window_size(),
            extractor.hop_length(),
            normalized.sample_rate(),
        );
        let raw = builder.build(&labels);
        pipeline_tracer::trace_segments(&raw);

        let outcome = SegmentPostProcessor::new(&self.config.segments).run(&raw);

        tracing::info!(
            "[MusicDetector] {} frames, {} active; segments raw={} merged={} filtered={} final={}",
            num_frames,
            active_frames,
            raw.len(),
            outcome.merged.len(),
            outcome.filtered.len(),
            outcome.split.segments.len()
        );

        DetectionReport {
            sample_rate: waveform.sample_rate(),
            duration_secs: waveform.duration_secs(),
            policy: self.policy.name().to_string(),
            num_frames,
            active_frames,
            raw_segments: raw.len(),
            merged_segments: outcome.merged.len(),
            filtered_segments: outcome.filtered.len(),
            dropped_remainders: outcome.split.dropped_remainders,
            segments: outcome.split.segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameGeometry;

    fn tone(sample_rate: u32, frequency: f32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = DetectorConfig::broadcast();
        config.fusion.smoothing_window = 2;
        assert!(matches!(
            MusicDetector::new(config),
            Err(DetectionError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_too_few_frames_reports_nothing() {
        let detector = MusicDetector::new(DetectorConfig::broadcast()).unwrap();
        // 8192 samples at 4096/2048 -> 3 frames; 8191 -> 2 frames
        let samples = tone(16000, 200.0, 1.0)[..8191].to_vec();
        let report = detector.detect(&Waveform::new(samples, 16000));
        assert_eq!(report.num_frames, 2);
        assert!(!report.has_music());
        assert_eq!(report.policy, "static_threshold");
    }

    #[test]
    fn test_detect_file_missing_input() {
        let detector = MusicDetector::new(DetectorConfig::broadcast()).unwrap();
        let err = detector
            .detect_file("/nonexistent/broadcast.wav")
            .unwrap_err();
        assert!(matches!(err, DetectionError::FileNotFound { .. }));
    }

    #[test]
    fn test_detect_file_reads_compressed_audio() {
        let detector = MusicDetector::new(DetectorConfig::broadcast()).unwrap();
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("tone_8k.flac");
        let report = detector.detect_file(&path).unwrap();

        // 24576 samples at 4096/2048 -> 11 frames
        assert_eq!(report.sample_rate, 8000);
        assert_eq!(report.num_frames, 11);
        assert!((report.duration_secs - 3.072).abs() < 1e-9);
    }

    #[test]
    fn test_empty_waveform() {
        let detector = MusicDetector::new(DetectorConfig::fast()).unwrap();
        let report = detector.detect(&Waveform::new(Vec::new(), 16000));
        assert_eq!(report.num_frames, 0);
        assert!(report.segments.is_empty());
        assert!(report.timecodes().is_empty());
    }

    #[test]
    fn test_silence_is_not_music() {
        let detector = MusicDetector::new(DetectorConfig::broadcast()).unwrap();
        let report = detector.detect(&Waveform::new(vec![0.0; 16000 * 30], 16000));
        assert!(report.num_frames > MIN_ANALYSIS_FRAMES);
        assert_eq!(report.active_frames, 0);
        assert!(report.segments.is_empty());
    }

    #[test]
    fn test_report_counts_are_consistent() {
        let mut config = DetectorConfig::broadcast();
        config.features.frames = FrameGeometry::Samples {
            window_size: 1024,
            hop_length: 512,
        };
        config.segments.min_music_duration = 1.0;
        let detector = MusicDetector::new(config).unwrap();

        let mut samples = vec![0.0f32; 8000 * 4];
        samples.extend(tone(8000, 200.0, 4.0));
        let report = detector.detect(&Waveform::new(samples, 8000));

        assert!(report.merged_segments <= report.raw_segments);
        assert!(report.filtered_segments <= report.merged_segments);
        for segment in &report.segments {
            assert!(segment.end >= segment.start);
            assert!(segment.duration() <= 15.0 + 1e-9);
        }
        assert_eq!(report.timecodes().len(), report.segments.len());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let detector = MusicDetector::new(DetectorConfig::fast()).unwrap();
        let mut samples = vec![0.0f32; 16000 * 5];
        samples.extend(tone(16000, 440.0, 10.0));
        let waveform = Waveform::new(samples, 16000);
        assert_eq!(detector.detect(&waveform), detector.detect(&waveform));
    }
}
