// Pipeline Tracer - Diagnostic logging for the detection pipeline
//
// Provides structured trace points at every stage of a detection run so a
// missing or misplaced segment can be followed from the feature matrix down
// to the final timecodes. Tracing never changes what a stage computes.
//
// Usage:
//   - Enable with MUSIC_DETECTOR_TRACE=1 environment variable
//   - Traces appear in logs with [TRACE] prefix
//   - Each trace includes stage name, sequence number, timestamp and metrics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::analysis::segments::Segment;

/// Environment variable that switches tracing on at `init()`
pub const TRACE_ENV_VAR: &str = "MUSIC_DETECTOR_TRACE";

/// Global flag to enable/disable pipeline tracing
static TRACING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Counter for trace events (helps correlate related traces)
static TRACE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Initialize pipeline tracing based on environment variable
pub fn init() {
    let enabled = std::env::var(TRACE_ENV_VAR)
        .map(|v| parse_flag(&v))
        .unwrap_or(false);
    TRACING_ENABLED.store(enabled, Ordering::SeqCst);
    if enabled {
        log::info!(
            "[TRACE] Pipeline tracing ENABLED - set {}=0 to disable",
            TRACE_ENV_VAR
        );
    }
}

/// Check if tracing is enabled
#[inline]
pub fn is_enabled() -> bool {
    TRACING_ENABLED.load(Ordering::Relaxed)
}

/// Enable tracing at runtime
pub fn enable() {
    TRACING_ENABLED.store(true, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing enabled at runtime");
}

/// Disable tracing at runtime
pub fn disable() {
    TRACING_ENABLED.store(false, Ordering::SeqCst);
    log::info!("[TRACE] Pipeline tracing disabled at runtime");
}

/// Pipeline stages for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Waveform decoded and normalized
    Load,
    /// Feature matrix extracted
    Features,
    /// Descriptor columns fused into a smoothed score
    Fusion,
    /// Score binarized into activity labels
    Decision,
    /// Active runs converted to raw segments
    Segments,
    /// Neighbouring segments merged
    Merge,
    /// Short segments dropped
    Filter,
    /// Long segments split
    Split,
    /// Segments rendered as timecodes
    Format,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Load => "LOAD",
            PipelineStage::Features => "FEATURES",
            PipelineStage::Fusion => "FUSION",
            PipelineStage::Decision => "DECISION",
            PipelineStage::Segments => "SEGMENTS",
            PipelineStage::Merge => "MERGE",
            PipelineStage::Filter => "FILTER",
            PipelineStage::Split => "SPLIT",
            PipelineStage::Format => "FORMAT",
        }
    }
}

/// Global start time for relative timestamps
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

fn get_timestamp_us() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// Log a trace event at a pipeline stage
///
/// Only logs if tracing was enabled through `init()` or `enable()`.
///
/// # Arguments
/// * `stage` - The pipeline stage
/// * `message` - Descriptive message with metrics
#[inline]
pub fn trace(stage: PipelineStage, message: &str) {
    if !is_enabled() {
        return;
    }

    let id = TRACE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = get_timestamp_us();

    log::info!(
        "[TRACE] {:>12} #{:06} @{:>10}us | {}",
        stage.as_str(),
        id,
        ts,
        message
    );
}

/// Log a trace event with formatted arguments
#[macro_export]
macro_rules! trace_pipeline {
    ($stage:expr, $($arg:tt)*) => {
        if $crate::debug::pipeline_tracer::is_enabled() {
            $crate::debug::pipeline_tracer::trace($stage, &format!($($arg)*));
        }
    };
}

/// Trace waveform loading
pub fn trace_load(samples: usize, sample_rate: u32, peak: f32) {
    trace(
        PipelineStage::Load,
        &format!(
            "samples={} sample_rate={} peak={:.4}",
            samples, sample_rate, peak
        ),
    );
}

/// Trace activity decision
pub fn trace_decision(policy: &str, active: usize, total: usize) {
    trace(
        PipelineStage::Decision,
        &format!("policy={} active={}/{}", policy, active, total),
    );
}

/// Trace raw segment construction
pub fn trace_segments(segments: &[Segment]) {
    if !is_enabled() {
        return;
    }
    let spans: Vec<String> = segments
        .iter()
        .map(|s| format!("[{:.2}, {:.2}]", s.start, s.end))
        .collect();
    trace(
        PipelineStage::Segments,
        &format!("count={} {}", segments.len(), spans.join(" ")),
    );
}

/// Trace final formatting
pub fn trace_format(pairs: &[[String; 2]]) {
    if !is_enabled() {
        return;
    }
    let rendered: Vec<String> = pairs.iter().map(|[a, b]| format!("{}-{}", a, b)).collect();
    trace(PipelineStage::Format, &rendered.join(", "));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_disable() {
        enable();
        assert!(is_enabled());
        trace_decision("hysteresis", 3, 10);
        disable();
        assert!(!is_enabled());
    }

    #[test]
    fn test_env_flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Features.as_str(), "FEATURES");
        assert_eq!(PipelineStage::Split.as_str(), "SPLIT");
        assert_eq!(PipelineStage::Format.as_str(), "FORMAT");
    }
}
