//! Tempo estimation and beat tracking
//!
//! [`BeatTracker`] wraps any [`BeatEstimator`] and guarantees a usable
//! [`BeatGrid`]: a finite positive tempo (falling back to the configured
//! default) and at least one beat.

use crate::config::AnalysisConfig;
use crate::transform;
use anyhow::Result;

/// Beat onsets plus a global tempo
#[derive(Debug, Clone, PartialEq)]
pub struct BeatGrid {
    times: Vec<f64>,
    tempo_bpm: f64,
}

impl BeatGrid {
    /// Beat onset times in seconds, strictly increasing, never empty
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Always finite and > 0
    pub fn tempo_bpm(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of inter-beat intervals
    pub fn num_intervals(&self) -> usize {
        self.times.len().saturating_sub(1)
    }
}

/// Raw output of a tempo/beat estimator, before sanitizing
#[derive(Debug, Clone, Default)]
pub struct BeatEstimate {
    pub tempo_bpm: f64,
    pub beat_times: Vec<f64>,
}

/// Tempo and beat estimation primitive
pub trait BeatEstimator: Send + Sync {
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<BeatEstimate>;
}

/// Beat tracker with fallback handling
pub struct BeatTracker {
    estimator: Box<dyn BeatEstimator>,
    fallback_tempo_bpm: f64,
    min_bpm: f64,
    max_bpm: f64,
}

impl BeatTracker {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self::with_estimator(config, Box::new(OnsetBeatEstimator::new(config)))
    }

    pub fn with_estimator(config: &AnalysisConfig, estimator: Box<dyn BeatEstimator>) -> Self {
        Self {
            estimator,
            fallback_tempo_bpm: config.fallback_tempo_bpm,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
        }
    }

    /// Track beats in `samples`
    pub fn track(&self, samples: &[f32], sample_rate: u32) -> BeatGrid {
        let duration_s = samples.len() as f64 / sample_rate as f64;

        let estimate = match self.estimator.estimate(samples, sample_rate) {
            Ok(estimate) => estimate,
            Err(e) => {
                log::warn!(
                    "Beat estimation failed, using {} BPM: {}",
                    self.fallback_tempo_bpm,
                    e
                );
                BeatEstimate {
                    tempo_bpm: self.fallback_tempo_bpm,
                    beat_times: Vec::new(),
                }
            }
        };

        let tempo_bpm = if estimate.tempo_bpm.is_finite() && estimate.tempo_bpm > 0.0 {
            estimate.tempo_bpm
        } else {
            log::warn!(
                "Degenerate tempo estimate {}, using {} BPM",
                estimate.tempo_bpm,
                self.fallback_tempo_bpm
            );
            self.fallback_tempo_bpm
        };

        let mut times: Vec<f64> = estimate
            .beat_times
            .into_iter()
            .filter(|t| t.is_finite() && *t >= 0.0 && *t <= duration_s)
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup_by(|b, a| *b - *a < 1e-9);

        if times.len() < 2 {
            // The grid length scales with tempo, keep it within the configured range
            let grid_bpm = tempo_bpm.clamp(self.min_bpm, self.max_bpm);
            log::debug!(
                "Only {} beats estimated, laying a regular grid at {:.1} BPM",
                times.len(),
                grid_bpm
            );
            times = regular_grid(grid_bpm, duration_s);
        }

        BeatGrid { times, tempo_bpm }
    }
}

/// Beats every `60 / tempo` seconds from 0 to `duration_s`
fn regular_grid(tempo_bpm: f64, duration_s: f64) -> Vec<f64> {
    let period = 60.0 / tempo_bpm;
    let count = (duration_s / period).floor() as usize + 1;
    (0..count).map(|k| k as f64 * period).collect()
}

/// Onset-envelope autocorrelation tempo estimator
///
/// Spectral flux of the log-magnitude STFT gives an onset envelope; its
/// autocorrelation, weighted by a log-normal prior around `prior_bpm`,
/// picks the tempo. Beats follow the best comb phase, each snapped to the
/// strongest nearby onset.
pub struct OnsetBeatEstimator {
    frame_size: usize,
    hop_size: usize,
    min_bpm: f64,
    max_bpm: f64,
    prior_bpm: f64,
}

impl OnsetBeatEstimator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            frame_size: config.onset_frame_size,
            hop_size: config.hop_size,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
            prior_bpm: config.prior_bpm,
        }
    }
}

impl BeatEstimator for OnsetBeatEstimator {
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<BeatEstimate> {
        let spec = transform::stft(samples, self.frame_size, self.hop_size)?;
        let novelty = onset_envelope(&spec.magnitudes());

        let peak = novelty.iter().copied().fold(0.0f32, f32::max);
        if peak <= 1e-9 {
            anyhow::bail!("no onsets detected");
        }

        let frame_rate = sample_rate as f64 / self.hop_size as f64;
        let lag = self.best_lag(&novelty, frame_rate)?;
        let tempo_bpm = 60.0 * frame_rate / lag;

        let beat_frames = comb_beats(&novelty, lag);
        let beat_times = beat_frames
            .into_iter()
            .map(|f| transform::frame_time(f, self.hop_size, sample_rate))
            .collect();

        log::debug!("Estimated tempo {:.2} BPM (lag {:.2} frames)", tempo_bpm, lag);

        Ok(BeatEstimate {
            tempo_bpm,
            beat_times,
        })
    }
}

impl OnsetBeatEstimator {
    /// Prior-weighted autocorrelation peak, refined to a fractional lag
    fn best_lag(&self, novelty: &[f32], frame_rate: f64) -> Result<f64> {
        let lag_min = ((60.0 * frame_rate / self.max_bpm).floor() as usize).max(1);
        let lag_max = (60.0 * frame_rate / self.min_bpm).ceil() as usize;
        if lag_max + 1 >= novelty.len() || lag_max <= lag_min {
            anyhow::bail!(
                "onset envelope too short ({} frames) for lag {}",
                novelty.len(),
                lag_max
            );
        }

        let mean = novelty.iter().map(|&v| v as f64).sum::<f64>() / novelty.len() as f64;
        let centered: Vec<f64> = novelty.iter().map(|&v| v as f64 - mean).collect();

        let raw: Vec<f64> = (0..=lag_max + 1)
            .map(|lag| autocorrelation(&centered, lag))
            .collect();

        let mut best_lag = 0usize;
        let mut best_score = 0.0f64;
        for lag in lag_min..=lag_max {
            let bpm = 60.0 * frame_rate / lag as f64;
            let score = raw[lag] * self.tempo_prior(bpm);
            if score > best_score {
                best_score = score;
                best_lag = lag;
            }
        }
        if best_lag == 0 {
            anyhow::bail!("no periodicity found in onset envelope");
        }

        Ok(refine_peak(&raw, best_lag))
    }

    /// Log-normal weight, one octave wide, centered on the prior tempo
    fn tempo_prior(&self, bpm: f64) -> f64 {
        let octaves = (bpm / self.prior_bpm).log2();
        (-0.5 * octaves * octaves).exp()
    }
}

/// Mean positive log-magnitude flux per frame
fn onset_envelope(magnitudes: &[Vec<f32>]) -> Vec<f32> {
    const COMPRESSION: f32 = 100.0;

    let log_mags: Vec<Vec<f32>> = magnitudes
        .iter()
        .map(|frame| frame.iter().map(|&m| (1.0 + COMPRESSION * m).ln()).collect())
        .collect();

    let mut novelty = vec![0.0f32; log_mags.len()];
    for t in 1..log_mags.len() {
        let (prev, cur) = (&log_mags[t - 1], &log_mags[t]);
        let flux: f32 = cur
            .iter()
            .zip(prev.iter())
            .map(|(c, p)| (c - p).max(0.0))
            .sum();
        novelty[t] = flux / cur.len().max(1) as f32;
    }
    novelty
}

/// Unbiased autocorrelation at one lag
fn autocorrelation(x: &[f64], lag: usize) -> f64 {
    if lag >= x.len() {
        return 0.0;
    }
    let sum: f64 = x[..x.len() - lag]
        .iter()
        .zip(&x[lag..])
        .map(|(a, b)| a * b)
        .sum();
    sum / (x.len() - lag) as f64
}

/// Parabolic interpolation around an integer peak
fn refine_peak(values: &[f64], peak: usize) -> f64 {
    if peak == 0 || peak + 1 >= values.len() {
        return peak as f64;
    }
    let (a, b, c) = (values[peak - 1], values[peak], values[peak + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return peak as f64;
    }
    let offset = 0.5 * (a - c) / denom;
    peak as f64 + offset.clamp(-0.5, 0.5)
}

/// Beat frames at the strongest comb phase, snapped to local onset peaks
fn comb_beats(novelty: &[f32], period: f64) -> Vec<usize> {
    let comb_sum = |phase: f64| {
        let mut sum = 0.0f32;
        let mut pos = phase;
        while (pos.round() as usize) < novelty.len() {
            sum += novelty[pos.round() as usize];
            pos += period;
        }
        sum
    };

    let mut best_phase = 0usize;
    let mut best_sum = f32::NEG_INFINITY;
    for phase in 0..(period.ceil() as usize).max(1) {
        let sum = comb_sum(phase as f64);
        if sum > best_sum {
            best_sum = sum;
            best_phase = phase;
        }
    }

    let window = ((period * 0.2).round() as usize).max(1);
    let mut beats: Vec<usize> = Vec::new();
    let mut pos = best_phase as f64;
    while (pos.round() as usize) < novelty.len() {
        let center = pos.round() as usize;
        let start = center.saturating_sub(window);
        let end = (center + window).min(novelty.len() - 1);

        let mut best_idx = center;
        for i in start..=end {
            if novelty[i] > novelty[best_idx] {
                best_idx = i;
            }
        }
        if beats.last().map_or(true, |&last| best_idx > last) {
            beats.push(best_idx);
        }
        pos += period;
    }
    beats
}
