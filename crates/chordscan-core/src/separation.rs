//! Harmonic/percussive source separation
//!
//! Median-filtering HPSS: a time-direction median of the magnitude
//! spectrogram estimates the harmonic part, a frequency-direction median the
//! percussive part. A soft mask built from both is applied to the complex
//! STFT and the harmonic component is resynthesized.

use crate::config::AnalysisConfig;
use crate::signal::Signal;
use crate::transform::{self, Stft};
use anyhow::Result;
use std::cmp::Ordering;

/// Harmonic/percussive separator
pub struct HarmonicSeparator {
    frame_size: usize,
    hop_size: usize,
    harmonic_kernel: usize,
    percussive_kernel: usize,
    mask_power: f32,
}

impl HarmonicSeparator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            frame_size: config.hpss_frame_size,
            hop_size: config.hop_size,
            harmonic_kernel: config.hpss_harmonic_kernel,
            percussive_kernel: config.hpss_percussive_kernel,
            mask_power: config.hpss_mask_power,
        }
    }

    /// Return the harmonic component of `signal`
    ///
    /// Never fails: when separation cannot run the raw samples are returned
    /// unchanged and a warning is logged.
    pub fn separate(&self, signal: &Signal) -> Vec<f32> {
        match self.try_separate(signal) {
            Ok(harmonic) => harmonic,
            Err(e) => {
                log::warn!("Harmonic separation unavailable, using raw signal: {}", e);
                signal.samples().to_vec()
            }
        }
    }

    fn try_separate(&self, signal: &Signal) -> Result<Vec<f32>> {
        let samples = signal.samples();
        if samples.len() < self.frame_size {
            anyhow::bail!(
                "signal too short for separation ({} < {} samples)",
                samples.len(),
                self.frame_size
            );
        }
        if signal.is_silent() {
            anyhow::bail!("signal is silent");
        }

        let mut spec = transform::stft(samples, self.frame_size, self.hop_size)?;
        let magnitudes = spec.magnitudes();

        let harmonic = median_filter_time(&magnitudes, self.harmonic_kernel);
        let percussive = median_filter_freq(&magnitudes, self.percussive_kernel);

        apply_soft_mask(&mut spec, &harmonic, &percussive, self.mask_power);

        let output = transform::istft(&spec);
        if output.iter().any(|s| !s.is_finite()) {
            anyhow::bail!("separation produced non-finite samples");
        }

        log::debug!(
            "Separated harmonic component: {} frames x {} bins",
            spec.num_frames(),
            spec.num_bins()
        );
        Ok(output)
    }
}

/// Median across neighbouring frames for every bin
fn median_filter_time(magnitudes: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let num_frames = magnitudes.len();
    let num_bins = magnitudes.first().map_or(0, |f| f.len());
    let radius = kernel / 2;

    let mut filtered = vec![vec![0.0; num_bins]; num_frames];
    let mut scratch = Vec::with_capacity(kernel);

    for t in 0..num_frames {
        let t_start = t.saturating_sub(radius);
        let t_end = (t + radius + 1).min(num_frames);
        for f in 0..num_bins {
            scratch.clear();
            scratch.extend((t_start..t_end).map(|ti| magnitudes[ti][f]));
            filtered[t][f] = median(&mut scratch);
        }
    }
    filtered
}

/// Median across neighbouring bins within every frame
fn median_filter_freq(magnitudes: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let radius = kernel / 2;
    let mut scratch = Vec::with_capacity(kernel);

    magnitudes
        .iter()
        .map(|frame| {
            let num_bins = frame.len();
            (0..num_bins)
                .map(|f| {
                    let f_start = f.saturating_sub(radius);
                    let f_end = (f + radius + 1).min(num_bins);
                    scratch.clear();
                    scratch.extend_from_slice(&frame[f_start..f_end]);
                    median(&mut scratch)
                })
                .collect()
        })
        .collect()
}

/// Scale each STFT cell by `H^p / (H^p + P^p)`
fn apply_soft_mask(spec: &mut Stft, harmonic: &[Vec<f32>], percussive: &[Vec<f32>], power: f32) {
    const EPS: f32 = 1e-10;

    for (t, frame) in spec.frames.iter_mut().enumerate() {
        for (f, cell) in frame.iter_mut().enumerate() {
            let h = harmonic[t][f].max(0.0).powf(power);
            let p = percussive[t][f].max(0.0).powf(power);
            let mask = if h + p > EPS { h / (h + p) } else { 0.0 };
            *cell *= mask;
        }
    }
}

/// Median of a scratch buffer (reorders the buffer)
pub(crate) fn median(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    values.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let upper = values[mid];
    if n % 2 == 1 {
        upper
    } else {
        let lower = values[..mid]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        0.5 * (lower + upper)
    }
}
