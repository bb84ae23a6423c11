//! Chroma extraction
//!
//! Framewise pitch-class energy from the STFT power spectrum, then one
//! median-aggregated 12-vector per inter-beat interval.

use crate::beat::BeatGrid;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::separation::median;
use crate::transform;

/// Beat-synchronous chroma, one row per inter-beat interval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromaMatrix {
    rows: Vec<[f64; 12]>,
}

impl ChromaMatrix {
    pub fn from_rows(rows: Vec<[f64; 12]>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[[f64; 12]] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Spectral bin folded onto its two nearest pitch classes
#[derive(Debug, Clone, Copy)]
struct BinMapping {
    bin: usize,
    lower: usize,
    upper: usize,
    upper_weight: f32,
}

/// Chroma extractor
pub struct ChromaExtractor {
    frame_size: usize,
    hop_size: usize,
    min_freq: f32,
    max_freq: f32,
    tuning_hz: f32,
}

impl ChromaExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            frame_size: config.chroma_frame_size,
            hop_size: config.hop_size,
            min_freq: config.chroma_min_freq,
            max_freq: config.chroma_max_freq,
            tuning_hz: config.tuning_hz,
        }
    }

    /// Beat-synchronous chroma with exactly `grid.len() - 1` rows
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        grid: &BeatGrid,
    ) -> Result<ChromaMatrix> {
        let frames = self.framewise(samples, sample_rate)?;
        if grid.num_intervals() == 0 {
            return Ok(ChromaMatrix::default());
        }

        let frame_times: Vec<f64> = (0..frames.len())
            .map(|f| transform::frame_time(f, self.hop_size, sample_rate))
            .collect();

        let rows: Vec<[f64; 12]> = grid
            .times()
            .windows(2)
            .map(|interval| aggregate_interval(&frames, &frame_times, interval[0], interval[1]))
            .collect();

        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AnalysisError::FeatureExtraction(
                "beat-synchronous chroma contains non-finite values".to_string(),
            ));
        }

        log::debug!(
            "Chroma: {} frames aggregated into {} beat intervals",
            frames.len(),
            rows.len()
        );
        Ok(ChromaMatrix { rows })
    }

    /// Per-frame chroma, each frame scaled so its largest bin is 1
    pub fn framewise(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<[f32; 12]>> {
        let spec = transform::stft(samples, self.frame_size, self.hop_size)
            .map_err(|e| AnalysisError::FeatureExtraction(e.to_string()))?;
        let mapping = self.bin_mapping(sample_rate);
        if mapping.is_empty() {
            return Err(AnalysisError::FeatureExtraction(format!(
                "no spectral bins between {} and {} Hz at {} Hz",
                self.min_freq, self.max_freq, sample_rate
            )));
        }

        let mut chroma = Vec::with_capacity(spec.num_frames());
        for frame in &spec.frames {
            let mut profile = [0.0f32; 12];
            for m in &mapping {
                let power = frame[m.bin].norm_sqr();
                profile[m.lower] += power * (1.0 - m.upper_weight);
                profile[m.upper] += power * m.upper_weight;
            }

            let peak = profile.iter().copied().fold(0.0f32, f32::max);
            if !peak.is_finite() {
                return Err(AnalysisError::FeatureExtraction(
                    "non-finite spectral energy".to_string(),
                ));
            }
            if peak > 0.0 {
                profile.iter_mut().for_each(|v| *v /= peak);
            }
            chroma.push(profile);
        }
        Ok(chroma)
    }

    fn bin_mapping(&self, sample_rate: u32) -> Vec<BinMapping> {
        let num_bins = self.frame_size / 2 + 1;
        (1..num_bins)
            .filter_map(|bin| {
                let freq = transform::bin_frequency(bin, self.frame_size, sample_rate);
                if freq < self.min_freq || freq > self.max_freq {
                    return None;
                }
                // Semitones above C, relative to the tuning reference A = 9
                let semitones = 12.0 * (freq / self.tuning_hz).log2() + 9.0;
                let floor = semitones.floor();
                Some(BinMapping {
                    bin,
                    lower: (floor as i64).rem_euclid(12) as usize,
                    upper: (floor as i64 + 1).rem_euclid(12) as usize,
                    upper_weight: semitones - floor,
                })
            })
            .collect()
    }
}

/// Median of all frames in `[start, end)`, or the frame nearest the interval
/// midpoint when none falls inside
fn aggregate_interval(
    frames: &[[f32; 12]],
    frame_times: &[f64],
    start: f64,
    end: f64,
) -> [f64; 12] {
    let first = frame_times.partition_point(|&t| t < start);
    let last = frame_times.partition_point(|&t| t < end);

    let mut row = [0.0f64; 12];
    if first < last {
        let mut column = Vec::with_capacity(last - first);
        for (pc, value) in row.iter_mut().enumerate() {
            column.clear();
            column.extend(frames[first..last].iter().map(|f| f[pc]));
            *value = median(&mut column) as f64;
        }
    } else if !frames.is_empty() {
        let mid = 0.5 * (start + end);
        let nearest = frame_times
            .partition_point(|&t| t < mid)
            .min(frames.len() - 1);
        for (value, &v) in row.iter_mut().zip(frames[nearest].iter()) {
            *value = v as f64;
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beat::{BeatEstimate, BeatEstimator, BeatTracker};

    const SR: u32 = 22050;

    fn tones(freqs: &[f32], seconds: f32) -> Vec<f32> {
        let len = (seconds * SR as f32) as usize;
        (0..len)
            .map(|i| {
                let t = i as f32 / SR as f32;
                freqs
                    .iter()
                    .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                    .sum::<f32>()
                    * 0.2
            })
            .collect()
    }

    struct FixedBeats(Vec<f64>);

    impl BeatEstimator for FixedBeats {
        fn estimate(&self, _samples: &[f32], _sample_rate: u32) -> anyhow::Result<BeatEstimate> {
            Ok(BeatEstimate {
                tempo_bpm: 120.0,
                beat_times: self.0.clone(),
            })
        }
    }

    fn grid(times: Vec<f64>, len: usize) -> BeatGrid {
        let config = AnalysisConfig::default();
        BeatTracker::with_estimator(&config, Box::new(FixedBeats(times)))
            .track(&vec![0.0; len], SR)
    }

    fn argmax(row: &[f64; 12]) -> usize {
        (0..12).fold(0, |best, i| if row[i] > row[best] { i } else { best })
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        let extractor = ChromaExtractor::new(&AnalysisConfig::default());
        let frames = extractor.framewise(&tones(&[440.0], 1.0), SR).unwrap();

        let mid = frames[frames.len() / 2];
        let peak = (0..12).fold(0, |best, i| if mid[i] > mid[best] { i } else { best });
        assert_eq!(peak, 9);
        assert_eq!(mid[9], 1.0);
    }

    #[test]
    fn test_c_major_triad_profile() {
        let extractor = ChromaExtractor::new(&AnalysisConfig::default());
        let samples = tones(&[261.63, 329.63, 392.0], 2.0);
        let beats = grid(vec![0.0, 0.5, 1.0, 1.5], samples.len());

        let chroma = extractor.extract(&samples, SR, &beats).unwrap();
        assert_eq!(chroma.num_rows(), 3);
        for row in chroma.rows() {
            for pc in [0, 4, 7] {
                assert!(row[pc] > 0.5, "pc {} = {}", pc, row[pc]);
            }
            for pc in [1, 3, 6, 8, 10] {
                assert!(row[pc] < 0.2, "pc {} = {}", pc, row[pc]);
            }
        }
    }

    #[test]
    fn test_rows_follow_beat_intervals() {
        let extractor = ChromaExtractor::new(&AnalysisConfig::default());
        let mut samples = tones(&[440.0], 1.0);
        samples.extend(tones(&[392.0], 1.0));
        let beats = grid(vec![0.0, 0.5, 1.0, 1.5, 2.0], samples.len());

        let chroma = extractor.extract(&samples, SR, &beats).unwrap();
        assert_eq!(chroma.num_rows(), beats.len() - 1);
        assert_eq!(argmax(&chroma.rows()[0]), 9);
        assert_eq!(argmax(&chroma.rows()[3]), 7);
        assert!(chroma.rows().iter().flatten().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_interval_without_frames_uses_nearest() {
        let frames = vec![[0.0f32; 12], {
            let mut f = [0.0f32; 12];
            f[4] = 1.0;
            f
        }];
        let times = vec![0.0, 1.0];

        let row = aggregate_interval(&frames, &times, 0.9, 0.95);
        assert_eq!(row[4], 1.0);
    }

    #[test]
    fn test_single_beat_gives_empty_matrix() {
        let extractor = ChromaExtractor::new(&AnalysisConfig::default());
        let samples = tones(&[440.0], 0.4);
        let beats = grid(vec![0.0], samples.len());

        let chroma = extractor.extract(&samples, SR, &beats).unwrap();
        assert!(chroma.is_empty());
    }

    #[test]
    fn test_transform_failure_is_feature_extraction_error() {
        let config = AnalysisConfig {
            chroma_frame_size: 1,
            ..Default::default()
        };
        let extractor = ChromaExtractor::new(&config);
        assert!(matches!(
            extractor.framewise(&tones(&[440.0], 0.5), SR),
            Err(AnalysisError::FeatureExtraction(_))
        ));
    }
}
