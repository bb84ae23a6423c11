//! End-to-end chord analysis
//!
//! [`Analyzer`] is built once from an [`AnalysisConfig`] and runs the
//! single-pass pipeline: separation, beat tracking, beat-synchronous chroma,
//! template scoring, Viterbi decoding, segment merging and key estimation.

use crate::beat::{BeatEstimator, BeatTracker};
use crate::chroma::ChromaExtractor;
use crate::config::AnalysisConfig;
use crate::decoder;
use crate::error::{AnalysisError, Result};
use crate::key;
use crate::scoring;
use crate::segments;
use crate::separation::HarmonicSeparator;
use crate::signal::Signal;
use crate::templates::TemplateBank;
use chordscan_sheet::{AnalysisResult, DiagramBook, TIME_SIGNATURE};
use std::time::Instant;

#[cfg(test)]
mod tests;

/// Immutable, reusable chord analyzer
///
/// Holds no per-request state, so one instance can serve concurrent calls.
pub struct Analyzer {
    config: AnalysisConfig,
    templates: TemplateBank,
    diagrams: DiagramBook,
    separator: HarmonicSeparator,
    tracker: BeatTracker,
    chroma: ChromaExtractor,
}

impl Analyzer {
    /// Validate `config` and build the analyzer
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let templates = match &config.vocabulary {
            Some(vocabulary) => TemplateBank::from_vocabulary(vocabulary.as_slice())?,
            None => TemplateBank::standard(),
        };

        Ok(Self {
            templates,
            diagrams: DiagramBook::standard(),
            separator: HarmonicSeparator::new(&config),
            tracker: BeatTracker::new(&config),
            chroma: ChromaExtractor::new(&config),
            config,
        })
    }

    /// Replace the chord diagram lookup
    pub fn with_diagrams(mut self, diagrams: DiagramBook) -> Self {
        self.diagrams = diagrams;
        self
    }

    /// Replace the tempo/beat estimation primitive
    pub fn with_beat_estimator(mut self, estimator: Box<dyn BeatEstimator>) -> Self {
        self.tracker = BeatTracker::with_estimator(&self.config, estimator);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateBank {
        &self.templates
    }

    /// Analyze a mono signal
    pub fn analyze(&self, signal: &Signal) -> Result<AnalysisResult> {
        let started = Instant::now();

        if signal.sample_rate() != self.config.sample_rate {
            log::debug!(
                "Analyzing at {} Hz (configured {} Hz)",
                signal.sample_rate(),
                self.config.sample_rate
            );
        }
        let signal = signal.clone().truncated(self.config.max_duration_s);
        if signal.len() < self.config.chroma_frame_size {
            return Err(AnalysisError::InvalidInput(format!(
                "signal too short: {} samples, need at least {}",
                signal.len(),
                self.config.chroma_frame_size
            )));
        }
        let sample_rate = signal.sample_rate();

        let harmonic = self.separator.separate(&signal);
        let grid = self.tracker.track(&harmonic, sample_rate);
        log::debug!(
            "Beat grid: {} beats at {:.2} BPM",
            grid.len(),
            grid.tempo_bpm()
        );

        let chroma = self.chroma.extract(&harmonic, sample_rate, &grid)?;
        let scores = scoring::score(&chroma, &self.templates);
        let path = decoder::decode(&scores, self.config.switch_penalty)?;

        let segments = if path.is_empty() {
            log::warn!(
                "No chord path decoded ({} beats), reporting a single segment",
                grid.len()
            );
            let label = self.templates.label(0).ok_or_else(|| {
                AnalysisError::ShapeMismatch("empty chord vocabulary".to_string())
            })?;
            segments::single_segment(label, signal.duration_s())
        } else {
            segments::merge(
                &path,
                self.templates.labels(),
                grid.times(),
                self.config.min_segment_duration_s,
                self.config.short_segment_policy,
            )?
        };

        let key = key::estimate_from_segments(&segments);
        let diagrams = self.diagrams.resolve_all(
            segments.iter().map(|s| s.label.as_str()),
            self.config.missing_diagrams,
        );

        let result = AnalysisResult {
            tempo_bpm: grid.tempo_bpm().round() as u32,
            time_signature: TIME_SIGNATURE.to_string(),
            key,
            segments,
            diagrams,
        };

        log::info!(
            "Analyzed {:.1}s: {} BPM, {}, {} segments covering {:.1}s in {:.2?}",
            signal.duration_s(),
            result.tempo_bpm,
            result.key,
            result.segments.len(),
            result.covered_duration(),
            started.elapsed()
        );
        Ok(result)
    }
}
