// Error types for the music detector
//
// This module defines the error taxonomy for detection runs: input errors
// (missing or undecodable audio), configuration errors and timecode parsing
// errors. Degenerate or silent audio is never an error; it yields an empty
// segment list.

mod detection;

pub use detection::{log_detection_error, DetectionError, DetectionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting at the process
/// boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
