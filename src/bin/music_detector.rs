use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use music_detector::analysis::DetectionReport;
use music_detector::config::{DetectorConfig, Sensitivity};
use music_detector::debug::pipeline_tracer;
use music_detector::output::pairs_line;
use music_detector::MusicDetector;
use serde::Serialize;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "music_detector",
    about = "Detect background music segments in a recording"
)]
struct Cli {
    /// Audio file to analyze (WAV, MP3, Ogg Vorbis or FLAC)
    audio: PathBuf,
    /// Threshold sensitivity for the static-threshold policy
    #[arg(long, value_enum)]
    sensitivity: Option<SensitivityArg>,
    /// Built-in detection strategy
    #[arg(long, value_enum, default_value_t = Strategy::Broadcast)]
    strategy: Strategy,
    /// JSON config file replacing the strategy preset
    #[arg(long)]
    config: Option<PathBuf>,
    /// Minimum music segment duration in seconds
    #[arg(long)]
    min_duration: Option<f64>,
    /// Largest gap in seconds bridged when merging segments
    #[arg(long)]
    merge_gap: Option<f64>,
    /// Maximum segment duration in seconds before splitting
    #[arg(long)]
    max_duration: Option<f64>,
    /// Shortest piece kept after splitting, in seconds
    #[arg(long)]
    min_split_duration: Option<f64>,
    /// Write the full detection report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Strategy {
    /// Harmonic/rhythm model for speech over music
    Broadcast,
    /// Spectral model with hysteresis
    Fast,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SensitivityArg {
    Low,
    Medium,
    High,
}

impl From<SensitivityArg> for Sensitivity {
    fn from(arg: SensitivityArg) -> Self {
        match arg {
            SensitivityArg::Low => Sensitivity::Low,
            SensitivityArg::Medium => Sensitivity::Medium,
            SensitivityArg::High => Sensitivity::High,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        LevelFilter::ERROR
    } else {
        match cli.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Narration goes to stderr; stdout carries only the SEGMENTS line
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();

    pipeline_tracer::init();
}

fn build_config(cli: &Cli) -> Result<DetectorConfig> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::try_load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => match cli.strategy {
            Strategy::Broadcast => DetectorConfig::broadcast(),
            Strategy::Fast => DetectorConfig::fast(),
        },
    };

    if let Some(sensitivity) = cli.sensitivity {
        config = config.with_sensitivity(sensitivity.into());
    }

    let segments = &mut config.segments;
    if let Some(value) = cli.min_duration {
        segments.min_music_duration = value;
    }
    if let Some(value) = cli.merge_gap {
        segments.merge_gap = value;
    }
    if let Some(value) = cli.max_duration {
        segments.max_duration = value;
    }
    if let Some(value) = cli.min_split_duration {
        segments.min_duration_after_split = value;
    }

    Ok(config)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = build_config(cli)?;
    let detector = MusicDetector::new(config).context("invalid detector configuration")?;

    tracing::info!("[music_detector] Analyzing {}", cli.audio.display());
    let report = detector
        .detect_file(&cli.audio)
        .with_context(|| format!("analyzing {}", cli.audio.display()))?;

    let timecodes = report.timecodes();
    if timecodes.is_empty() {
        tracing::info!("[music_detector] No music detected");
    } else {
        for (index, [start, end]) in timecodes.iter().enumerate() {
            tracing::info!("[music_detector] Segment {}: {} - {}", index + 1, start, end);
        }
    }

    if let Some(path) = &cli.report {
        emit_report(&cli.audio, &report, &timecodes, path)?;
    }

    println!("{}", pairs_line(&timecodes));
    Ok(ExitCode::from(0))
}

fn emit_report(
    audio: &Path,
    report: &DetectionReport,
    timecodes: &[[String; 2]],
    path: &Path,
) -> Result<()> {
    let payload = ReportPayload {
        audio: audio.display().to_string(),
        report,
        timecodes,
    };
    let json = serde_json::to_string_pretty(&payload)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct ReportPayload<'a> {
    audio: String,
    #[serde(flatten)]
    report: &'a DetectionReport,
    timecodes: &'a [[String; 2]],
}
