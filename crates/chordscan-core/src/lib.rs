//! Chordscan Core - Chord Recognition Library
//!
//! Turns a mono audio clip into a time-aligned chord sequence, a tempo and a
//! key estimate: harmonic/percussive separation, beat tracking,
//! beat-synchronous chroma, template scoring, Viterbi decoding with a switch
//! penalty, segment merging and a majority-vote key.

pub mod audio;
pub mod beat;
pub mod chroma;
pub mod config;
pub mod decoder;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod scoring;
pub mod segments;
pub mod separation;
pub mod signal;
pub mod templates;
pub mod transform;

pub use beat::{BeatEstimate, BeatEstimator, BeatGrid, BeatTracker, OnsetBeatEstimator};
pub use chroma::{ChromaExtractor, ChromaMatrix};
pub use config::AnalysisConfig;
pub use decoder::{decode, ChordPath};
pub use error::{AnalysisError, ErrorKind, Result};
pub use pipeline::Analyzer;
pub use scoring::{score, ScoreMatrix};
pub use segments::{merge, ShortSegmentPolicy};
pub use separation::HarmonicSeparator;
pub use signal::Signal;
pub use templates::{Chord, ChordQuality, TemplateBank};

pub use chordscan_sheet::{AnalysisResult, ChordDiagram, ChordSegment, DiagramBook};

use std::path::Path;

/// Decode an audio file into a mono [`Signal`] at `sample_rate`
pub fn load_signal(path: &Path, sample_rate: u32) -> Result<Signal> {
    let audio = audio::decode_audio(path, sample_rate)
        .map_err(|e| AnalysisError::Decode(format!("{:#}", e)))?;
    Signal::new(audio.samples, audio.sample_rate)
}

/// Analyze an audio file with the given configuration
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let analyzer = Analyzer::new(config.clone())?;
    let signal = load_signal(path, config.sample_rate)?;
    analyzer.analyze(&signal)
}
