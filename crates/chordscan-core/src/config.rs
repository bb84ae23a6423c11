//! Configuration parameters for chord analysis
//!
//! Defaults reproduce the reference analysis: 22.05 kHz mono input capped at
//! 60 seconds, switch penalty 0.15 and half-second minimum segments.

use crate::error::AnalysisError;
use crate::segments::ShortSegmentPolicy;
use chordscan_sheet::MissingDiagramPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // Input
    pub sample_rate: u32,
    pub max_duration_s: f64,

    // Decoding and merging
    pub switch_penalty: f64,
    pub min_segment_duration_s: f64,
    pub short_segment_policy: ShortSegmentPolicy,

    // Harmonic/percussive separation
    pub hpss_frame_size: usize,
    pub hpss_harmonic_kernel: usize,
    pub hpss_percussive_kernel: usize,
    pub hpss_mask_power: f32,

    // Beat tracking
    pub onset_frame_size: usize,
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub prior_bpm: f64,
    pub fallback_tempo_bpm: f64,

    // Chroma
    pub chroma_frame_size: usize,
    pub hop_size: usize,
    pub chroma_min_freq: f32,
    pub chroma_max_freq: f32,
    pub tuning_hz: f32,

    // Vocabulary and display
    pub vocabulary: Option<Vec<String>>,
    pub missing_diagrams: MissingDiagramPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            max_duration_s: 60.0,

            switch_penalty: 0.15,
            min_segment_duration_s: 0.5,
            short_segment_policy: ShortSegmentPolicy::Drop,

            hpss_frame_size: 2048,
            hpss_harmonic_kernel: 31,
            hpss_percussive_kernel: 31,
            hpss_mask_power: 2.0,

            onset_frame_size: 2048,
            min_bpm: 40.0,
            max_bpm: 240.0,
            prior_bpm: 120.0,
            fallback_tempo_bpm: 120.0,

            chroma_frame_size: 4096,
            hop_size: 512,
            chroma_min_freq: 55.0,
            chroma_max_freq: 4200.0,
            tuning_hz: 440.0,

            vocabulary: None,
            missing_diagrams: MissingDiagramPolicy::SubstituteDefault,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AnalysisConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let fail = |msg: &str| Err(AnalysisError::InvalidConfig(msg.to_string()));

        if self.sample_rate == 0 {
            return fail("sample_rate must be > 0");
        }
        if !(self.max_duration_s > 0.0) {
            return fail("max_duration_s must be > 0");
        }
        if !self.switch_penalty.is_finite() || self.switch_penalty < 0.0 {
            return fail("switch_penalty must be a finite value >= 0");
        }
        if self.min_segment_duration_s.is_nan() || self.min_segment_duration_s < 0.0 {
            return fail("min_segment_duration_s must be >= 0");
        }
        if self.hpss_frame_size == 0 || self.onset_frame_size == 0 || self.chroma_frame_size == 0 {
            return fail("frame sizes must be > 0");
        }
        if self.hop_size == 0 {
            return fail("hop_size must be > 0");
        }
        for kernel in [self.hpss_harmonic_kernel, self.hpss_percussive_kernel] {
            if kernel == 0 || kernel % 2 == 0 {
                return fail("hpss kernels must be odd and > 0");
            }
        }
        if !(self.min_bpm > 0.0) || self.min_bpm >= self.max_bpm {
            return fail("min_bpm must be > 0 and < max_bpm");
        }
        if !(self.fallback_tempo_bpm > 0.0) || !self.fallback_tempo_bpm.is_finite() {
            return fail("fallback_tempo_bpm must be a finite value > 0");
        }
        if !(self.prior_bpm > 0.0) {
            return fail("prior_bpm must be > 0");
        }
        if !(self.chroma_min_freq > 0.0) || self.chroma_min_freq >= self.chroma_max_freq {
            return fail("chroma_min_freq must be > 0 and < chroma_max_freq");
        }
        if !(self.tuning_hz > 0.0) {
            return fail("tuning_hz must be > 0");
        }
        if let Some(vocabulary) = &self.vocabulary {
            if vocabulary.is_empty() {
                return fail("vocabulary override must not be empty");
            }
        }
        Ok(())
    }
}
