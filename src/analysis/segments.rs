// SegmentBuilder - turn runs of active frames into time intervals
//
// A rising edge opens a segment at the current frame's boundary time and a
// falling edge closes it at the boundary time of the first inactive frame.
// A run still open after the last frame is closed at the end of the
// analyzed audio.

use serde::{Deserialize, Serialize};

use crate::config::FrameTiming;

/// Time interval in seconds, `end >= start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Converts per-frame activity labels into raw segments
#[derive(Debug, Clone, Copy)]
pub struct SegmentBuilder {
    timing: FrameTiming,
    window_size: usize,
    hop_length: usize,
    sample_rate: u32,
}

impl SegmentBuilder {
    pub fn new(timing: FrameTiming, window_size: usize, hop_length: usize, sample_rate: u32) -> Self {
        Self {
            timing,
            window_size,
            hop_length,
            sample_rate,
        }
    }

    fn seconds(&self, samples: f64) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        samples / self.sample_rate as f64
    }

    /// Time a segment boundary at frame `index` is pinned to
    pub fn boundary_time(&self, index: usize) -> f64 {
        let frame_start = (index * self.hop_length) as f64;
        match self.timing {
            FrameTiming::WindowStart => self.seconds(frame_start),
            FrameTiming::Centered => {
                let center = self.seconds(frame_start + self.window_size as f64 / 2.0);
                (center - self.seconds(self.window_size as f64) / 2.0).max(0.0)
            }
        }
    }

    /// Closing time for a run that is still active at the last frame
    fn tail_time(&self, num_frames: usize) -> f64 {
        match self.timing {
            FrameTiming::WindowStart => self.seconds((num_frames * self.hop_length) as f64),
            FrameTiming::Centered => {
                let last = num_frames.saturating_sub(1);
                let center =
                    self.seconds((last * self.hop_length) as f64 + self.window_size as f64 / 2.0);
                center + self.seconds(self.window_size as f64) / 2.0
            }
        }
    }

    /// One segment per maximal run of active frames, in frame order
    pub fn build(&self, labels: &[bool]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut open: Option<f64> = None;

        for (index, &active) in labels.iter().enumerate() {
            match (open, active) {
                (None, true) => open = Some(self.boundary_time(index)),
                (Some(start), false) => {
                    let end = self.boundary_time(index).max(start);
                    segments.push(Segment::new(start, end));
                    open = None;
                }
                _ => {}
            }
        }

        if let Some(start) = open {
            segments.push(Segment::new(start, self.tail_time(labels.len()).max(start)));
        }

        segments
    }
}
