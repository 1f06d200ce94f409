//! `MM:SS` timecodes at the output boundary
//!
//! Segment endpoints leave the pipeline as whole-second `MM:SS` strings.
//! Each endpoint is rounded on its own, so a 0.4 s segment may format as an
//! empty `["00:10", "00:10"]` pair.

use crate::analysis::segments::Segment;
use crate::error::DetectionError;

/// Format seconds as `MM:SS`, rounding to the nearest whole second
///
/// Rounding happens before the minute split, so 59.6 s becomes `01:00`
/// rather than `00:60`. Negative and non-finite input clamps to `00:00`.
/// Minutes widen past two digits for recordings longer than 99 minutes.
pub fn seconds_to_mmss(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn parse_field(field: &str, text: &str) -> Result<f64, DetectionError> {
    let invalid = || DetectionError::InvalidTimecode {
        value: text.to_string(),
    };
    let field = field.trim();
    if field.is_empty() || field.starts_with('-') || field.starts_with('+') {
        return Err(invalid());
    }
    let value: f64 = field.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// Parse `MM:SS`, `HH:MM:SS` or bare seconds into seconds
///
/// Only the last field may carry a fraction (`01:02.5`). Minute and second
/// fields of the colon forms must be below 60 except the leading one.
pub fn mmss_to_seconds(text: &str) -> Result<f64, DetectionError> {
    let invalid = || DetectionError::InvalidTimecode {
        value: text.to_string(),
    };
    let fields: Vec<&str> = text.trim().split(':').collect();

    let whole = |field: &str| -> Result<f64, DetectionError> {
        let value = parse_field(field, text)?;
        if value.fract() != 0.0 {
            return Err(invalid());
        }
        Ok(value)
    };

    match fields.as_slice() {
        [secs] => parse_field(secs, text),
        [mins, secs] => {
            let secs = parse_field(secs, text)?;
            if secs >= 60.0 {
                return Err(invalid());
            }
            Ok(whole(mins)? * 60.0 + secs)
        }
        [hours, mins, secs] => {
            let mins = whole(mins)?;
            let secs = parse_field(secs, text)?;
            if mins >= 60.0 || secs >= 60.0 {
                return Err(invalid());
            }
            Ok(whole(hours)? * 3600.0 + mins * 60.0 + secs)
        }
        _ => Err(invalid()),
    }
}

/// Format a segment as a `[start, end]` timecode pair
pub fn segment_to_pair(segment: &Segment) -> [String; 2] {
    [seconds_to_mmss(segment.start), seconds_to_mmss(segment.end)]
}

/// Parse a `[start, end]` timecode pair back into a segment
pub fn parse_segment<S: AsRef<str>>(pair: &[S; 2]) -> Result<Segment, DetectionError> {
    let start = mmss_to_seconds(pair[0].as_ref())?;
    let end = mmss_to_seconds(pair[1].as_ref())?;
    if end <= start {
        return Err(DetectionError::InvalidSegment { start, end });
    }
    Ok(Segment::new(start, end))
}
