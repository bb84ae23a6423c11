//! Viterbi decoding of the chord sequence
//!
//! Maximizes the summed per-beat score minus `switch_penalty` for every
//! label change. The DP table and back-pointers are dense T x N arrays.

use crate::error::{AnalysisError, Result};
use crate::scoring::ScoreMatrix;


/// Template index per beat
pub type ChordPath = Vec<usize>;

/// Decode the best-scoring label path
///
/// Ties prefer staying on the current label, then the lowest label index.
/// An empty score matrix yields an empty path.
pub fn decode(scores: &ScoreMatrix, switch_penalty: f64) -> Result<ChordPath> {
    if !switch_penalty.is_finite() || switch_penalty < 0.0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "switch penalty must be finite and >= 0, got {}",
            switch_penalty
        )));
    }

    let steps = scores.rows();
    let labels = scores.cols();
    if steps == 0 {
        return Ok(Vec::new());
    }
    if labels == 0 {
        return Err(AnalysisError::ShapeMismatch(
            "score matrix has no label columns".to_string(),
        ));
    }

    let mut dp = vec![0.0f64; steps * labels];
    let mut back = vec![0usize; steps * labels];
    dp[..labels].copy_from_slice(scores.row(0));

    for t in 1..steps {
        let prev = (t - 1) * labels;
        let (best_prev, best_value) = argmax(&dp[prev..prev + labels]);
        let switch_value = best_value - switch_penalty;

        for j in 0..labels {
            let stay_value = dp[prev + j];
            let (from, base) = if stay_value >= switch_value {
                (j, stay_value)
            } else {
                (best_prev, switch_value)
            };
            dp[t * labels + j] = scores.get(t, j) + base;
            back[t * labels + j] = from;
        }
    }

    let last = (steps - 1) * labels;
    let (mut label, best_score) = argmax(&dp[last..last + labels]);

    let mut path = vec![0usize; steps];
    for t in (0..steps).rev() {
        path[t] = label;
        label = back[t * labels + label];
    }

    log::debug!(
        "Decoded {} beats over {} labels: score {:.3}, {} changes",
        steps,
        labels,
        best_score,
        label_changes(&path)
    );
    Ok(path)
}

/// Number of positions where the label differs from its predecessor
pub fn label_changes(path: &[usize]) -> usize {
    path.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Index and value of the maximum, lowest index on ties
fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    (best, values[best])
}
