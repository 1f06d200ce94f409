// Audio decoders - file loaders producing a mono Waveform
//
// `.wav` files go through hound; every other container (mp3, ogg/vorbis,
// flac) goes through symphonia's probe. Multi-channel audio is down-mixed by
// averaging channels and samples land in [-1, 1].

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::Waveform;
use crate::error::DetectionError;

/// Decode any supported audio file into a mono waveform
///
/// Dispatches on the file extension: `.wav` uses [`read_wav`], anything else
/// is probed by symphonia (MP3, Ogg Vorbis, FLAC).
///
/// # Errors
/// * `FileNotFound` - path does not exist
/// * `UnsupportedFormat` - container or codec the decoders cannot read
/// * `DecodeFailed` - malformed or truncated audio data
pub fn read_audio<P: AsRef<Path>>(path: P) -> Result<Waveform, DetectionError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "wav" {
        return read_wav(path);
    }
    read_compressed(path, &ext)
}

/// Decode a WAV file into a mono waveform
///
/// # Errors
/// * `FileNotFound` - path does not exist
/// * `UnsupportedFormat` - bit depth or encoding hound cannot read
/// * `DecodeFailed` - malformed file or truncated sample data
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Waveform, DetectionError> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                8 | 16 => reader
                    .samples::<i16>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / max))
                    .collect::<Result<Vec<f32>, _>>()?,
                other => {
                    return Err(DetectionError::UnsupportedFormat {
                        reason: format!(
                            "{} bits per sample in {}",
                            other,
                            path.display()
                        ),
                    })
                }
            }
        }
    };

    Ok(finish(path, &interleaved, spec.sample_rate, channels))
}

/// Decode a compressed container with symphonia's default codecs
fn read_compressed(path: &Path, ext: &str) -> Result<Waveform, DetectionError> {
    ensure_exists(path)?;

    let src = File::open(path).map_err(|err| DetectionError::DecodeFailed {
        reason: format!("opening {}: {}", path.display(), err),
    })?;
    let mss = MediaSourceStream::new(Box::new(src), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if !ext.is_empty() {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| DetectionError::UnsupportedFormat {
            reason: format!("no audio track in {}", path.display()),
        })?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DetectionError::DecodeFailed {
            reason: format!("unknown sample rate in {}", path.display()),
        })?;
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => break,
            Err(err) => return Err(err.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                channels = decoded.spec().channels.count().max(1);
                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::new(decoded.capacity() as u64, *decoded.spec())
                });
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            // Corrupt frames are skipped, as players do
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                log::debug!("[Decoder] Skipping undecodable packet in {}", path.display());
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(finish(path, &interleaved, sample_rate, channels))
}

fn ensure_exists(path: &Path) -> Result<(), DetectionError> {
    if path.exists() {
        Ok(())
    } else {
        Err(DetectionError::FileNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Down-mix and wrap decoded samples
fn finish(path: &Path, interleaved: &[f32], sample_rate: u32, channels: usize) -> Waveform {
    let samples = downmix(interleaved, channels);
    log::info!(
        "[Decoder] Loaded {}: {:.1}s, {} Hz, {} channel(s)",
        path.display(),
        samples.len() as f64 / sample_rate.max(1) as f64,
        sample_rate,
        channels
    );
    Waveform::new(samples, sample_rate)
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_wav(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "music_detector_decoder_{}_{}.wav",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn test_downmix_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = read_wav("/nonexistent/input.wav").unwrap_err();
        assert!(matches!(err, DetectionError::FileNotFound { .. }));
    }

    #[test]
    fn test_reads_16_bit_stereo_as_mono() {
        let path = temp_wav("stereo16");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(i16::MAX).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = read_wav(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(waveform.sample_rate(), 8000);
        assert_eq!(waveform.len(), 100);
        assert!((waveform.samples()[0] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_garbage_file_fails_to_decode() {
        let path = temp_wav("garbage");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        let result = read_wav(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(DetectionError::DecodeFailed { .. }) | Err(DetectionError::UnsupportedFormat { .. })
        ));
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_read_audio_decodes_flac() {
        // 4 blocks of silence then 2 blocks of a 200 Hz tone at half scale
        let waveform = read_audio(fixture("tone_8k.flac")).unwrap();

        assert_eq!(waveform.sample_rate(), 8000);
        assert_eq!(waveform.len(), 6 * 4096);
        assert!(waveform.samples()[..4 * 4096].iter().all(|&s| s == 0.0));

        let tone = &waveform.samples()[4 * 4096..];
        let peak = tone.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.01, "peak {}", peak);
    }

    #[test]
    fn test_read_audio_routes_wav_through_hound() {
        let path = temp_wav("dispatch");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..320 {
            writer.write_sample(i16::MAX / 4).unwrap();
        }
        writer.finalize().unwrap();

        let waveform = read_audio(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(waveform.sample_rate(), 16000);
        assert_eq!(waveform.len(), 320);
    }

    #[test]
    fn test_read_audio_missing_mp3_is_file_not_found() {
        let err = read_audio("/nonexistent/episode.mp3").unwrap_err();
        assert!(matches!(err, DetectionError::FileNotFound { .. }));
    }

    #[test]
    fn test_read_audio_rejects_unknown_container() {
        let path = std::env::temp_dir().join(format!(
            "music_detector_decoder_{}_garbage.mp3",
            std::process::id()
        ));
        std::fs::write(&path, vec![0x5a; 2048]).unwrap();
        let result = read_audio(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(DetectionError::DecodeFailed { .. }) | Err(DetectionError::UnsupportedFormat { .. })
        ));
    }
}
