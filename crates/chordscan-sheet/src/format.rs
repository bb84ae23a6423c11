//! Analysis result structures

use crate::diagrams::ChordDiagram;
use serde::{Deserialize, Serialize};

/// Meter reported for every analysis (no meter detection is performed)
pub const TIME_SIGNATURE: &str = "4/4";

/// A contiguous timed run of one chord
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSegment {
    /// Chord label, e.g. "C" or "F#m"
    #[serde(rename = "chord")]
    pub label: String,
    /// Start of the segment (seconds)
    #[serde(rename = "timestamp")]
    pub start: f64,
    /// Length of the segment (seconds)
    pub duration: f64,
}

impl ChordSegment {
    pub fn new(label: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            label: label.into(),
            start,
            duration,
        }
    }

    /// End of the segment (seconds)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Result of one chord analysis
///
/// Serialized as `{bpm, signature, key, chords, chordCharts}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Estimated tempo, rounded to whole beats per minute
    #[serde(rename = "bpm")]
    pub tempo_bpm: u32,
    /// Always [`TIME_SIGNATURE`]
    #[serde(rename = "signature")]
    pub time_signature: String,
    /// Estimated key, e.g. "G Major"
    pub key: String,
    /// Ordered, non-overlapping chord segments
    #[serde(rename = "chords")]
    pub segments: Vec<ChordSegment>,
    /// Unique diagrams for the chords referenced by `segments`
    #[serde(rename = "chordCharts")]
    pub diagrams: Vec<ChordDiagram>,
}

impl AnalysisResult {
    /// Distinct chord labels in order of first appearance
    pub fn unique_labels(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if !seen.contains(&segment.label.as_str()) {
                seen.push(&segment.label);
            }
        }
        seen
    }

    /// Total time covered by segments (seconds)
    pub fn covered_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            tempo_bpm: 96,
            time_signature: TIME_SIGNATURE.to_string(),
            key: "C Major".to_string(),
            segments: vec![
                ChordSegment::new("C", 0.0, 2.0),
                ChordSegment::new("Am", 2.0, 2.0),
                ChordSegment::new("C", 4.0, 1.5),
            ],
            diagrams: vec![ChordDiagram::new("C", [0, 3, 2, 0, 1, 0], [0, 3, 2, 0, 1, 0])],
        }
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();

        assert_eq!(json["bpm"], 96);
        assert_eq!(json["signature"], "4/4");
        assert_eq!(json["key"], "C Major");
        assert_eq!(json["chords"][1]["chord"], "Am");
        assert_eq!(json["chords"][1]["timestamp"], 2.0);
        assert_eq!(json["chords"][1]["duration"], 2.0);
        assert_eq!(json["chordCharts"][0]["frets"][1], 3);
    }

    #[test]
    fn test_unique_labels_keep_first_appearance() {
        let result = sample_result();
        assert_eq!(result.unique_labels(), vec!["C", "Am"]);
        assert!((result.covered_duration() - 5.5).abs() < 1e-9);
    }
}
