use std::path::PathBuf;
use std::process::Command;

use music_detector::extract_segments;
use serde_json::Value;

const SAMPLE_RATE: u32 = 16000;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_music_detector"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("music_detector_cli_{}_{}", std::process::id(), name))
}

/// Write a 16-bit mono WAV: `silent_secs` of silence then `tone_secs` of 200 Hz
fn write_wav(name: &str, silent_secs: f32, tone_secs: f32) -> PathBuf {
    let path = temp_path(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");

    let silent = (SAMPLE_RATE as f32 * silent_secs) as usize;
    let toned = (SAMPLE_RATE as f32 * tone_secs) as usize;
    for _ in 0..silent {
        writer.write_sample(0i16).expect("write sample");
    }
    for i in 0..toned {
        let t = i as f32 / SAMPLE_RATE as f32;
        let value = 0.5 * (2.0 * std::f32::consts::PI * 200.0 * t).sin();
        writer
            .write_sample((value * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    path
}

fn segments_lines(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter(|line| line.starts_with("SEGMENTS:"))
        .collect()
}

#[test]
fn detects_tone_after_silence() {
    let wav = write_wav("tone.wav", 10.0, 10.0);
    let output = cli()
        .arg(&wav)
        .args(["--merge-gap", "1.0", "--min-duration", "5.0"])
        .output()
        .expect("failed to run music_detector");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert_eq!(stdout.lines().count(), 1, "stdout: {stdout}");
    assert_eq!(segments_lines(&stdout).len(), 1);

    let pairs = extract_segments(&stdout)
        .expect("decodable SEGMENTS line")
        .expect("SEGMENTS marker present");
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0][1], "00:20");

    let _ = std::fs::remove_file(wav);
}

#[test]
fn silence_prints_empty_list() {
    let wav = write_wav("silence.wav", 12.0, 0.0);
    for strategy in ["broadcast", "fast"] {
        let output = cli()
            .arg(&wav)
            .args(["--strategy", strategy, "--quiet"])
            .output()
            .expect("failed to run music_detector");
        assert!(output.status.success());

        let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
        assert_eq!(stdout.trim(), "SEGMENTS:[]");
    }
    let _ = std::fs::remove_file(wav);
}

#[test]
fn writes_json_report() {
    let wav = write_wav("report.wav", 10.0, 10.0);
    let report_path = temp_path("report.json");
    let output = cli()
        .arg(&wav)
        .args(["--sensitivity", "medium", "--merge-gap", "1.0", "--report"])
        .arg(&report_path)
        .output()
        .expect("failed to run music_detector");
    assert!(output.status.success());

    let contents = std::fs::read_to_string(&report_path).expect("report written");
    let json: Value = serde_json::from_str(&contents).expect("report JSON payload");
    assert_eq!(json["sample_rate"], 16000);
    assert_eq!(json["num_frames"], 155);
    assert_eq!(json["policy"], "static_threshold");
    assert_eq!(
        json["segments"].as_array().map(Vec::len),
        json["timecodes"].as_array().map(Vec::len)
    );

    let _ = std::fs::remove_file(wav);
    let _ = std::fs::remove_file(report_path);
}

#[test]
fn decodes_compressed_input() {
    let flac = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("tone_8k.flac");
    let output = cli()
        .arg(&flac)
        .arg("--quiet")
        .output()
        .expect("failed to run music_detector");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert_eq!(segments_lines(&stdout).len(), 1, "stdout: {stdout}");
    assert!(extract_segments(&stdout)
        .expect("decodable SEGMENTS line")
        .is_some());
}

#[test]
fn missing_file_exits_with_error() {
    let output = cli()
        .arg(temp_path("does_not_exist.wav"))
        .output()
        .expect("failed to run music_detector");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("FileNotFound"), "stderr: {stderr}");
}

#[test]
fn invalid_config_file_exits_with_error() {
    let wav = write_wav("config.wav", 4.0, 0.0);
    let config_path = temp_path("bad_config.json");
    std::fs::write(&config_path, "{ not json").expect("write config");

    let output = cli()
        .arg(&wav)
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("failed to run music_detector");
    assert_eq!(output.status.code(), Some(1));
    assert!(segments_lines(&String::from_utf8_lossy(&output.stdout)).is_empty());

    let _ = std::fs::remove_file(wav);
    let _ = std::fs::remove_file(config_path);
}
