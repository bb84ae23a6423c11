//! Decoded mono input signal

use crate::error::{AnalysisError, Result};

/// Mono audio samples at a fixed sample rate
#[derive(Debug, Clone)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    /// Wrap decoded samples, rejecting input no analysis could make sense of
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidInput(
                "sample rate must be > 0".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(AnalysisError::InvalidInput("signal is empty".to_string()));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "non-finite sample at index {}",
                pos
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Cut the signal to at most `max_duration_s` seconds
    ///
    /// A cap below one sample leaves the signal empty.
    pub fn truncated(mut self, max_duration_s: f64) -> Self {
        let max_samples = (max_duration_s * self.sample_rate as f64).floor() as usize;
        if self.samples.len() > max_samples {
            log::debug!(
                "Truncating signal from {:.1}s to {:.1}s",
                self.duration_s(),
                max_duration_s
            );
            self.samples.truncate(max_samples);
        }
        self
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// True if every sample is exactly zero
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }
}
