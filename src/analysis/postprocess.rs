// SegmentPostProcessor - merge, filter and split raw segments
//
// Stages run in a fixed order and each returns a new sorted, disjoint list:
// 1. merge: join neighbours whose gap is <= merge_gap
// 2. filter: drop segments shorter than min_music_duration
// 3. split: cut segments longer than max_duration into max_duration pieces,
//    keeping a trailing piece only if it lasts >= min_duration_after_split
//
// Splitting exists for a downstream recognition API that rejects clips
// longer than max_duration.

use crate::analysis::segments::Segment;
use crate::config::SegmentConfig;

/// Join segments separated by at most `gap` seconds
///
/// The result has every gap strictly greater than `gap`, so merging it again
/// is a no-op.
pub fn merge(segments: &[Segment], gap: f64) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for &segment in segments {
        match merged.last_mut() {
            Some(running) if segment.start - running.end <= gap => {
                running.end = running.end.max(segment.end);
            }
            _ => merged.push(segment),
        }
    }
    merged
}

/// Keep segments lasting at least `min_duration` seconds
pub fn filter(segments: &[Segment], min_duration: f64) -> Vec<Segment> {
    segments
        .iter()
        .copied()
        .filter(|s| s.duration() >= min_duration)
        .collect()
}

/// Outcome of the split stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitResult {
    pub segments: Vec<Segment>,
    /// Trailing pieces discarded for being shorter than the floor
    pub dropped_remainders: usize,
}

/// Cut segments longer than `max_duration` into consecutive pieces
///
/// Segments already within `max_duration` pass through unchanged, even when
/// shorter than `min_after_split`. A piece exactly `min_after_split` long is
/// kept.
pub fn split(segments: &[Segment], max_duration: f64, min_after_split: f64) -> SplitResult {
    let mut result = Vec::with_capacity(segments.len());
    let mut dropped_remainders = 0;

    for &segment in segments {
        if segment.duration() <= max_duration || max_duration <= 0.0 {
            result.push(segment);
            continue;
        }

        let mut cursor = segment.start;
        while cursor < segment.end {
            let piece = Segment::new(cursor, (cursor + max_duration).min(segment.end));
            if piece.duration() >= min_after_split {
                result.push(piece);
            } else {
                dropped_remainders += 1;
            }
            cursor = piece.end;
        }
    }

    SplitResult {
        segments: result,
        dropped_remainders,
    }
}

/// Per-stage segment counts from one post-processing run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostProcessOutcome {
    pub merged: Vec<Segment>,
    pub filtered: Vec<Segment>,
    pub split: SplitResult,
}

/// Applies merge, filter and split with one set of bounds
#[derive(Debug, Clone, Copy)]
pub struct SegmentPostProcessor {
    merge_gap: f64,
    min_music_duration: f64,
    max_duration: f64,
    min_duration_after_split: f64,
}

impl SegmentPostProcessor {
    pub fn new(config: &SegmentConfig) -> Self {
        Self {
            merge_gap: config.merge_gap,
            min_music_duration: config.min_music_duration,
            max_duration: config.max_duration,
            min_duration_after_split: config.min_duration_after_split,
        }
    }

    /// Run all three stages, keeping each intermediate list
    pub fn run(&self, raw: &[Segment]) -> PostProcessOutcome {
        use crate::debug::pipeline_tracer::PipelineStage;

        let merged = merge(raw, self.merge_gap);
        crate::trace_pipeline!(
            PipelineStage::Merge,
            "{} -> {} segments (gap <= {}s)",
            raw.len(),
            merged.len(),
            self.merge_gap
        );

        let filtered = filter(&merged, self.min_music_duration);
        crate::trace_pipeline!(
            PipelineStage::Filter,
            "{} -> {} segments (min {}s)",
            merged.len(),
            filtered.len(),
            self.min_music_duration
        );

        let split = split(&filtered, self.max_duration, self.min_duration_after_split);
        crate::trace_pipeline!(
            PipelineStage::Split,
            "{} -> {} segments (max {}s, {} remainders dropped)",
            filtered.len(),
            split.segments.len(),
            self.max_duration,
            split.dropped_remainders
        );

        PostProcessOutcome {
            merged,
            filtered,
            split,
        }
    }

    /// Final segment list only
    pub fn process(&self, raw: &[Segment]) -> Vec<Segment> {
        self.run(raw).split.segments
    }
}
