//! `SEGMENTS:` line written at the process boundary
//!
//! A calling process scans mixed console output for the marker and decodes
//! the JSON list that follows it. Everything else the binary prints is
//! narration.

use crate::analysis::segments::Segment;
use crate::error::DetectionError;
use crate::timecode::segment_to_pair;

/// Marker preceding the encoded segment list
pub const SEGMENTS_MARKER: &str = "SEGMENTS:";

/// Render `SEGMENTS:[["MM:SS","MM:SS"],...]` for a segment list
pub fn segments_line(segments: &[Segment]) -> String {
    let pairs: Vec<[String; 2]> = segments.iter().map(segment_to_pair).collect();
    pairs_line(&pairs)
}

/// Render the marker line for already-formatted timecode pairs
pub fn pairs_line(pairs: &[[String; 2]]) -> String {
    // Serializing plain strings cannot fail
    let encoded = serde_json::to_string(pairs).unwrap_or_else(|_| "[]".to_string());
    format!("{}{}", SEGMENTS_MARKER, encoded)
}

/// Decode the list behind the last `SEGMENTS:` marker in `output`
///
/// Single-quoted lists are accepted. Returns `Ok(None)` when no marker is
/// present.
pub fn extract_segments(output: &str) -> Result<Option<Vec<[String; 2]>>, DetectionError> {
    let Some(position) = output.rfind(SEGMENTS_MARKER) else {
        return Ok(None);
    };

    let payload = output[position + SEGMENTS_MARKER.len()..]
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .replace('\'', "\"");

    serde_json::from_str(&payload)
        .map(Some)
        .map_err(|err| DetectionError::DecodeFailed {
            reason: format!("malformed {} payload: {}", SEGMENTS_MARKER, err),
        })
}
