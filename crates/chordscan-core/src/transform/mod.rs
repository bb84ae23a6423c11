//! Short-time Fourier transform
//!
//! Centered, Hann-windowed STFT shared by separation, onset detection and
//! chroma extraction, plus the overlap-add inverse used to resynthesize the
//! harmonic signal.

use crate::error::{AnalysisError, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Complex spectrogram of a signal
#[derive(Debug, Clone)]
pub struct Stft {
    /// Positive-frequency bins [time_frame][frequency_bin]
    pub frames: Vec<Vec<Complex<f32>>>,
    pub frame_size: usize,
    pub hop_size: usize,
    /// Length of the analysed signal in samples
    pub signal_len: usize,
}

impl Stft {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Magnitude spectrogram [time_frame][frequency_bin]
    pub fn magnitudes(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }
}

/// Compute the STFT with frames centered on multiples of `hop_size`
///
/// The signal is zero-padded by half a frame on both sides, so frame `t`
/// is centered on sample `t * hop_size`.
pub fn stft(samples: &[f32], frame_size: usize, hop_size: usize) -> Result<Stft> {
    if frame_size < 2 || hop_size == 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "invalid STFT geometry: frame {} hop {}",
            frame_size, hop_size
        )));
    }
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "cannot transform an empty signal".to_string(),
        ));
    }

    let pad = frame_size / 2;
    let num_frames = 1 + samples.len() / hop_size;
    let num_bins = frame_size / 2 + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);

    let mut frames = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex::new(0.0, 0.0); frame_size];

    for frame_idx in 0..num_frames {
        let start = (frame_idx * hop_size) as isize - pad as isize;

        for (i, slot) in buffer.iter_mut().enumerate() {
            let pos = start + i as isize;
            let sample = if pos >= 0 && (pos as usize) < samples.len() {
                samples[pos as usize]
            } else {
                0.0
            };
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buffer);
        frames.push(buffer[..num_bins].to_vec());
    }

    Ok(Stft {
        frames,
        frame_size,
        hop_size,
        signal_len: samples.len(),
    })
}

/// Overlap-add inverse of [`stft`], returning exactly `signal_len` samples
pub fn istft(spec: &Stft) -> Vec<f32> {
    let n = spec.frame_size;
    let pad = n / 2;
    let out_len = (spec.num_frames().saturating_sub(1)) * spec.hop_size + n;

    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(n);
    let window = hann_window(n);

    let mut output = vec![0.0f32; out_len.max(spec.signal_len + n)];
    let mut window_sum = vec![0.0f32; output.len()];
    let mut buffer = vec![Complex::new(0.0, 0.0); n];
    let scale = 1.0 / n as f32;

    for (frame_idx, frame) in spec.frames.iter().enumerate() {
        // Rebuild the full spectrum from its Hermitian half
        for k in 0..n {
            buffer[k] = if k < frame.len() {
                frame[k]
            } else {
                frame[n - k].conj()
            };
        }
        ifft.process(&mut buffer);

        let offset = frame_idx * spec.hop_size;
        for i in 0..n {
            output[offset + i] += buffer[i].re * scale * window[i];
            window_sum[offset + i] += window[i] * window[i];
        }
    }

    for (sample, &weight) in output.iter_mut().zip(window_sum.iter()) {
        if weight > 1e-8 {
            *sample /= weight;
        }
    }

    output[pad..pad + spec.signal_len].to_vec()
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Center frequency of an FFT bin (Hz)
pub fn bin_frequency(bin: usize, frame_size: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / frame_size as f32
}

/// Center time of an STFT frame (seconds)
pub fn frame_time(frame: usize, hop_size: usize, sample_rate: u32) -> f64 {
    (frame * hop_size) as f64 / sample_rate as f64
}
