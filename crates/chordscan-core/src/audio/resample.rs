//! Sample-rate conversion with rubato

use anyhow::Result;
use rubato::{FftFixedIn, Resampler};

const CHUNK_SIZE: usize = 1024;

/// Resample mono audio from `from_rate` to `to_rate`
///
/// The resampler delay is trimmed, so the output holds
/// `len * to_rate / from_rate` samples aligned with the input.
pub fn resample_to_target(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        anyhow::bail!("Invalid sample rates: {} -> {}", from_rate, to_rate);
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)
            .map_err(|e| anyhow::anyhow!("Failed to create resampler: {}", e))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let mut pos = 0;
    while pos + resampler.input_frames_next() <= samples.len() {
        let next = resampler.input_frames_next();
        let input: [&[f32]; 1] = [&samples[pos..pos + next]];
        let chunk = resampler.process(&input[..], None)?;
        output.extend_from_slice(&chunk[0]);
        pos += next;
    }
    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let chunk = resampler.process_partial(Some(&tail[..]), None)?;
        output.extend_from_slice(&chunk[0]);
    }
    while output.len() < expected + delay {
        let chunk = resampler.process_partial(None::<&[&[f32]]>, None)?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    let end = (delay + expected).min(output.len());
    log::debug!(
        "Resampled {} samples {} Hz -> {} samples {} Hz",
        samples.len(),
        from_rate,
        end - delay.min(end),
        to_rate
    );
    Ok(output[delay.min(end)..end].to_vec())
}
