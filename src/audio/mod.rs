// Audio module - waveform container and file decoding
//
// Decoding is the only place the crate touches the filesystem for audio.
// Everything downstream works on an in-memory mono Waveform.

pub mod decoder;
pub mod waveform;

pub use decoder::{read_audio, read_wav};
pub use waveform::Waveform;
