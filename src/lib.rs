// Music Detector Core - background music detection for broadcast audio
// Windowed feature extraction, score fusion, decision and segment cleanup

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod debug;
pub mod error;
pub mod output;
pub mod timecode;

// Re-exports for convenience
pub use analysis::segments::Segment;
pub use analysis::{DetectionReport, MusicDetector};
pub use audio::{read_audio, read_wav, Waveform};
pub use config::{DetectorConfig, Sensitivity};
pub use error::{DetectionError, ErrorCode};
pub use output::{extract_segments, segments_line};
pub use timecode::{mmss_to_seconds, parse_segment, seconds_to_mmss};
