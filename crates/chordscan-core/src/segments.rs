//! Collapsing a per-beat label path into timed chord segments

use crate::error::{AnalysisError, Result};
use chordscan_sheet::ChordSegment;
use serde::{Deserialize, Serialize};

/// What happens to runs shorter than the minimum segment duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortSegmentPolicy {
    /// Discard the run, leaving a gap in the timeline
    #[default]
    Drop,
    /// Add the run's time to the previous segment (or the next one when
    /// nothing was emitted yet), keeping the timeline gapless
    ExtendPrevious,
}

/// A maximal run of one label over consecutive beats
struct Run {
    label: usize,
    start: f64,
    end: f64,
}

impl Run {
    fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Merge `path` into segments
///
/// `path[i]` spans `beat_times[i]..beat_times[i + 1]`; iteration is clipped
/// to whichever of the two is shorter. Runs at least `min_duration` long are
/// emitted; shorter ones are handled according to `policy`.
pub fn merge(
    path: &[usize],
    labels: &[String],
    beat_times: &[f64],
    min_duration: f64,
    policy: ShortSegmentPolicy,
) -> Result<Vec<ChordSegment>> {
    let steps = path.len().min(beat_times.len().saturating_sub(1));
    if steps < path.len() {
        log::debug!(
            "Clipping chord path of {} beats to {} beat intervals",
            path.len(),
            steps
        );
    }
    if let Some(&bad) = path[..steps].iter().find(|&&j| j >= labels.len()) {
        return Err(AnalysisError::ShapeMismatch(format!(
            "label index {} outside vocabulary of {}",
            bad,
            labels.len()
        )));
    }

    let mut runs: Vec<Run> = Vec::new();
    for (i, &label) in path[..steps].iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.label == label => run.end = beat_times[i + 1],
            _ => runs.push(Run {
                label,
                start: beat_times[i],
                end: beat_times[i + 1],
            }),
        }
    }

    let mut segments: Vec<ChordSegment> = Vec::new();
    let mut carried_start: Option<f64> = None;
    for run in runs {
        if run.duration() >= min_duration {
            let start = carried_start.take().unwrap_or(run.start);
            segments.push(ChordSegment::new(
                labels[run.label].as_str(),
                start,
                run.end - start,
            ));
            continue;
        }

        match policy {
            ShortSegmentPolicy::Drop => {}
            ShortSegmentPolicy::ExtendPrevious => match segments.last_mut() {
                Some(previous) => previous.duration = run.end - previous.start,
                None => {
                    carried_start.get_or_insert(run.start);
                }
            },
        }
    }

    Ok(segments)
}

/// The one segment reported when no chord path could be decoded
pub fn single_segment(label: &str, clip_duration: f64) -> Vec<ChordSegment> {
    vec![ChordSegment::new(label, 0.0, clip_duration)]
}
