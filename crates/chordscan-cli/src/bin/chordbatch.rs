//! chordbatch - Chord recognition for a directory of audio files
//!
//! Usage: chordbatch [OPTIONS] <input_dir> <output_dir>
//!
//! Analyses every audio file in `input_dir` in parallel and writes one
//! sheet file per input into `output_dir`, named after the full input file
//! name (`song.wav.chords.json`). Prints a JSON summary; exits with status 1
//! if any file failed.

use anyhow::{Context, Result};
use chordscan_cli::batch::{find_audio_files, sheet_path};
use chordscan_cli::output::{print_error, print_json, BatchEntry, BatchSummary};
use chordscan_core::{AnalysisConfig, AnalysisError, Analyzer};
use chordscan_sheet::SheetFile;
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "chordbatch")]
#[command(about = "Recognize chords in every audio file of a directory", long_about = None)]
struct Args {
    /// Directory containing audio files
    input_dir: PathBuf,

    /// Output directory for sheet files
    output_dir: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of worker threads (default: all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

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

    match run_chordbatch(&args) {
        Ok(summary) => {
            let failed = summary.failed;
            print_json(&summary);
            if failed > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            log::error!("Batch failed: {:#}", e);
            print_error(&e);
            std::process::exit(1);
        }
    }
}

fn run_chordbatch(args: &Args) -> Result<BatchSummary> {
    if !args.input_dir.is_dir() {
        anyhow::bail!("Input directory not found: {}", args.input_dir.display());
    }
    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .map_err(|e| AnalysisError::InvalidConfig(format!("{:#}", e)))?,
        None => AnalysisConfig::default(),
    };
    let analyzer = Analyzer::new(config)?;

    let inputs = find_audio_files(&args.input_dir)?;
    log::info!(
        "Found {} audio files, analysing on {} threads...",
        inputs.len(),
        rayon::current_num_threads()
    );

    let start = Instant::now();
    let results: Vec<BatchEntry> = inputs
        .par_iter()
        .map(|path| {
            let file_start = Instant::now();
            match process_file(&analyzer, path, &args.output_dir) {
                Ok(output_path) => BatchEntry::success(
                    path.display().to_string(),
                    output_path.display().to_string(),
                    file_start.elapsed().as_secs_f64(),
                ),
                Err(e) => {
                    log::warn!("Failed to analyse {}: {:#}", path.display(), e);
                    BatchEntry::failure(
                        path.display().to_string(),
                        &e,
                        file_start.elapsed().as_secs_f64(),
                    )
                }
            }
        })
        .collect();

    let summary = BatchSummary::new(results);
    log::info!(
        "Analysed {} files ({} failed) in {:.2}s",
        summary.processed,
        summary.failed,
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

fn process_file(analyzer: &Analyzer, input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let config = analyzer.config();
    let signal = chordscan_core::load_signal(input, config.sample_rate)?;
    let analysed_s = signal.duration_s().min(config.max_duration_s);
    let result = analyzer.analyze(&signal)?;

    let output_path = sheet_path(output_dir, input)?;

    SheetFile::new(
        input.display().to_string(),
        config.sample_rate,
        analysed_s,
        result,
    )
    .with_params(config)?
    .save(&output_path)
    .with_context(|| format!("Failed to write sheet file: {}", output_path.display()))?;

    Ok(output_path)
}
