// Detection error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Detection error code constants
///
/// Error code range: 1001-1006
pub struct DetectionErrorCodes {}

impl DetectionErrorCodes {
    /// Audio file does not exist
    pub const FILE_NOT_FOUND: i32 = 1001;

    /// Audio file could not be decoded
    pub const DECODE_FAILED: i32 = 1002;

    /// Audio file uses an encoding the decoder does not handle
    pub const UNSUPPORTED_FORMAT: i32 = 1003;

    /// Detector configuration is inconsistent
    pub const INVALID_CONFIG: i32 = 1004;

    /// Timecode string could not be parsed
    pub const INVALID_TIMECODE: i32 = 1005;

    /// Segment bounds are out of order or negative
    pub const INVALID_SEGMENT: i32 = 1006;
}

/// Log a detection error with structured context
///
/// This function logs detection errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_detection_error(err: &DetectionError, context: &str) {
    error!(
        "Detection error in {}: code={}, component=MusicDetector, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Detection-related errors
///
/// Input errors fail a run immediately with no partial result. Numerical
/// degeneracy inside the pipeline is guarded and never surfaces here.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Audio file is missing
    FileNotFound { path: String },

    /// Audio file exists but could not be decoded
    DecodeFailed { reason: String },

    /// Audio encoding is not supported by the decoder
    UnsupportedFormat { reason: String },

    /// Configuration failed validation
    InvalidConfig { reason: String },

    /// Timecode string is not MM:SS, HH:MM:SS or plain seconds
    InvalidTimecode { value: String },

    /// Segment has a negative start or does not end after it starts
    InvalidSegment { start: f64, end: f64 },
}

impl ErrorCode for DetectionError {
    fn code(&self) -> i32 {
        match self {
            DetectionError::FileNotFound { .. } => DetectionErrorCodes::FILE_NOT_FOUND,
            DetectionError::DecodeFailed { .. } => DetectionErrorCodes::DECODE_FAILED,
            DetectionError::UnsupportedFormat { .. } => DetectionErrorCodes::UNSUPPORTED_FORMAT,
            DetectionError::InvalidConfig { .. } => DetectionErrorCodes::INVALID_CONFIG,
            DetectionError::InvalidTimecode { .. } => DetectionErrorCodes::INVALID_TIMECODE,
            DetectionError::InvalidSegment { .. } => DetectionErrorCodes::INVALID_SEGMENT,
        }
    }

    fn message(&self) -> String {
        match self {
            DetectionError::FileNotFound { path } => format!("Audio file not found: {}", path),
            DetectionError::DecodeFailed { reason } => {
                format!("Failed to decode audio: {}", reason)
            }
            DetectionError::UnsupportedFormat { reason } => {
                format!("Unsupported audio format: {}", reason)
            }
            DetectionError::InvalidConfig { reason } => {
                format!("Invalid detector configuration: {}", reason)
            }
            DetectionError::InvalidTimecode { value } => {
                format!("Invalid timecode (expected MM:SS): \"{}\"", value)
            }
            DetectionError::InvalidSegment { start, end } => {
                format!("Invalid segment: [{}, {}]", start, end)
            }
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            DetectionError::FileNotFound { .. } => "FileNotFound",
            DetectionError::DecodeFailed { .. } => "DecodeFailed",
            DetectionError::UnsupportedFormat { .. } => "UnsupportedFormat",
            DetectionError::InvalidConfig { .. } => "InvalidConfig",
            DetectionError::InvalidTimecode { .. } => "InvalidTimecode",
            DetectionError::InvalidSegment { .. } => "InvalidSegment",
        };
        write!(
            f,
            "DetectionError::{} (code {}): {}",
            variant,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DetectionError {}

/// Convert from hound::Error to DetectionError
impl From<hound::Error> for DetectionError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::Unsupported => DetectionError::UnsupportedFormat {
                reason: "unsupported WAV encoding".to_string(),
            },
            hound::Error::IoError(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                DetectionError::FileNotFound {
                    path: io_err.to_string(),
                }
            }
            other => DetectionError::DecodeFailed {
                reason: other.to_string(),
            },
        }
    }
}

/// Convert from symphonia's decoder error to DetectionError
impl From<symphonia::core::errors::Error> for DetectionError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match err {
            SymphoniaError::Unsupported(what) => DetectionError::UnsupportedFormat {
                reason: what.to_string(),
            },
            SymphoniaError::IoError(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                DetectionError::FileNotFound {
                    path: io_err.to_string(),
                }
            }
            other => DetectionError::DecodeFailed {
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_error_codes() {
        assert_eq!(
            DetectionError::FileNotFound {
                path: "a.wav".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            DetectionError::DecodeFailed {
                reason: "test".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(
            DetectionError::UnsupportedFormat {
                reason: "test".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            DetectionError::InvalidConfig {
                reason: "test".to_string()
            }
            .code(),
            1004
        );
        assert_eq!(
            DetectionError::InvalidTimecode {
                value: "x".to_string()
            }
            .code(),
            1005
        );
        assert_eq!(
            DetectionError::InvalidSegment {
                start: 2.0,
                end: 1.0
            }
            .code(),
            1006
        );
    }

    #[test]
    fn test_display_includes_variant_and_code() {
        let err = DetectionError::InvalidTimecode {
            value: "1:2:3:4".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("DetectionError::InvalidTimecode (code 1005)"));
        assert!(text.contains("1:2:3:4"));
    }

    #[test]
    fn test_hound_unsupported_conversion() {
        let err: DetectionError = hound::Error::Unsupported.into();
        assert_eq!(err.code(), DetectionErrorCodes::UNSUPPORTED_FORMAT);
    }

    #[test]
    fn test_hound_io_not_found_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wav");
        let err: DetectionError = hound::Error::IoError(io_err).into();
        match err {
            DetectionError::FileNotFound { path } => assert!(path.contains("missing.wav")),
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_error_code_trait_object() {
        let err: &dyn ErrorCode = &DetectionError::InvalidConfig {
            reason: "hop_length must be > 0".to_string(),
        };
        assert_eq!(err.code(), 1004);
        assert!(err.message().contains("hop_length"));
    }

    #[test]
    fn test_symphonia_errors_map_to_detection_errors() {
        use symphonia::core::errors::Error as SymphoniaError;

        let unsupported: DetectionError =
            SymphoniaError::Unsupported("core (codec):unsupported codec").into();
        assert_eq!(unsupported.code(), DetectionErrorCodes::UNSUPPORTED_FORMAT);

        let malformed: DetectionError =
            SymphoniaError::DecodeError("mp3: invalid main_data offset").into();
        assert_eq!(malformed.code(), DetectionErrorCodes::DECODE_FAILED);
    }
}
