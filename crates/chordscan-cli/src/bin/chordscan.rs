//! chordscan - Chord recognition for a single audio file
//!
//! Usage: chordscan [OPTIONS] <input_audio_path>
//!
//! Prints the analysis result as JSON on stdout. On failure prints
//! `{"status":"error","kind":..,"message":..}` and exits with status 1.

use anyhow::{Context, Result};
use chordscan_cli::output::{print_error, print_json};
use chordscan_core::{AnalysisConfig, AnalysisError, Analyzer, ShortSegmentPolicy};
use chordscan_sheet::{DiagramBook, MissingDiagramPolicy, SheetFile};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "chordscan")]
#[command(about = "Recognize chords, tempo and key in an audio file", long_about = None)]
struct Args {
    /// Input audio file path
    input_audio_path: PathBuf,

    /// Configuration file (TOML); flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Penalty for each chord change (>= 0)
    #[arg(long)]
    penalty: Option<f64>,

    /// Minimum chord segment duration in seconds
    #[arg(long)]
    min_duration: Option<f64>,

    /// Analyse at most this many seconds of audio
    #[arg(long)]
    max_duration: Option<f64>,

    /// Restrict recognition to these chords, e.g. "C,G,Am,F"
    #[arg(long, value_delimiter = ',')]
    vocabulary: Option<Vec<String>>,

    /// Fold short segments into the previous one instead of dropping them
    #[arg(long)]
    extend_short: bool,

    /// Leave out chords that have no diagram instead of showing C
    #[arg(long)]
    omit_missing_diagrams: bool,

    /// Chord diagram table (JSON array) replacing the built-in one
    #[arg(long)]
    diagrams: Option<PathBuf>,

    /// Also write a sheet file with metadata to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    let level = if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run_chordscan(&args) {
        log::error!("Analysis failed: {:#}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run_chordscan(args: &Args) -> Result<()> {
    let config = build_config(args)?;

    let mut analyzer = Analyzer::new(config.clone())?;
    if let Some(path) = &args.diagrams {
        let book = DiagramBook::load(path)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        analyzer = analyzer.with_diagrams(book);
    }

    log::info!("Processing: {}", args.input_audio_path.display());
    let start = std::time::Instant::now();

    let signal = chordscan_core::load_signal(&args.input_audio_path, config.sample_rate)?;
    let analysed_s = signal.duration_s().min(config.max_duration_s);
    let result = analyzer.analyze(&signal)?;

    log::info!(
        "Found {} chord segments in {:.2}s",
        result.segments.len(),
        start.elapsed().as_secs_f64()
    );

    if let Some(output_path) = &args.output {
        write_sheet(output_path, &args.input_audio_path, &config, analysed_s, &result)?;
    }

    print_json(&result);
    Ok(())
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .map_err(|e| AnalysisError::InvalidConfig(format!("{:#}", e)))?,
        None => AnalysisConfig::default(),
    };

    if let Some(penalty) = args.penalty {
        config.switch_penalty = penalty;
    }
    if let Some(min_duration) = args.min_duration {
        config.min_segment_duration_s = min_duration;
    }
    if let Some(max_duration) = args.max_duration {
        config.max_duration_s = max_duration;
    }
    if let Some(vocabulary) = &args.vocabulary {
        config.vocabulary = Some(vocabulary.clone());
    }
    if args.extend_short {
        config.short_segment_policy = ShortSegmentPolicy::ExtendPrevious;
    }
    if args.omit_missing_diagrams {
        config.missing_diagrams = MissingDiagramPolicy::Omit;
    }

    config.validate()?;
    Ok(config)
}

fn write_sheet(
    output_path: &Path,
    input_path: &Path,
    config: &AnalysisConfig,
    duration_s: f64,
    result: &chordscan_core::AnalysisResult,
) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    SheetFile::new(
        input_path.display().to_string(),
        config.sample_rate,
        duration_s,
        result.clone(),
    )
    .with_params(config)?
    .save(output_path)
    .with_context(|| format!("Failed to write sheet file: {}", output_path.display()))?;

    log::info!("Wrote sheet file: {}", output_path.display());
    Ok(())
}
