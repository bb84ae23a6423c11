//! End-to-end tests for the analysis pipeline

use super::*;
use crate::beat::BeatEstimate;
use approx::assert_abs_diff_eq;
use chordscan_sheet::{ChordDiagram, MissingDiagramPolicy};

const SR: u32 = 22050;
const C_MAJOR: [f32; 3] = [261.63, 329.63, 392.0];
const A_MINOR: [f32; 3] = [220.0, 261.63, 329.63];

/// Chord tones re-struck every `beat_s` seconds
fn strummed(chords: &[(&[f32], f32)], beat_s: f32) -> Vec<f32> {
    let mut samples = Vec::new();
    for (freqs, seconds) in chords {
        let len = (seconds * SR as f32).round() as usize;
        let offset = samples.len();
        samples.extend((0..len).map(|i| {
            let t = (offset + i) as f32 / SR as f32;
            let since_beat = t % beat_s;
            let envelope = 0.35 + 0.65 * (-since_beat / 0.08).exp();
            let tone: f32 = freqs
                .iter()
                .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                .sum();
            0.2 * envelope * tone
        }));
    }
    samples
}

fn c_then_a_minor() -> Signal {
    Signal::new(strummed(&[(&C_MAJOR[..], 4.0), (&A_MINOR[..], 4.0)], 0.5), SR).unwrap()
}

struct FixedBeats {
    tempo_bpm: f64,
    beat_times: Vec<f64>,
}

impl BeatEstimator for FixedBeats {
    fn estimate(&self, _samples: &[f32], _sample_rate: u32) -> anyhow::Result<BeatEstimate> {
        Ok(BeatEstimate {
            tempo_bpm: self.tempo_bpm,
            beat_times: self.beat_times.clone(),
        })
    }
}

fn half_second_grid(tempo_bpm: f64, seconds: f64) -> Box<FixedBeats> {
    let count = (seconds / 0.5) as usize + 1;
    Box::new(FixedBeats {
        tempo_bpm,
        beat_times: (0..count).map(|i| i as f64 * 0.5).collect(),
    })
}

fn assert_well_formed(result: &AnalysisResult, min_duration: f64) {
    assert_eq!(result.time_signature, "4/4");
    assert!(result.tempo_bpm > 0);
    assert!(result.key.ends_with(" Major"));
    for segment in &result.segments {
        assert!(segment.duration >= min_duration, "{:?}", segment);
    }
    for pair in result.segments.windows(2) {
        assert!(pair[0].end() <= pair[1].start + 1e-9);
    }
}

#[test]
fn test_detects_c_then_a_minor() {
    let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
    let result = analyzer.analyze(&c_then_a_minor()).unwrap();

    assert_well_formed(&result, 0.5);
    let labels = result.unique_labels();
    assert!(labels.contains(&"C"), "labels {:?}", labels);
    assert!(labels.contains(&"Am"), "labels {:?}", labels);
    assert_eq!(result.segments.first().map(|s| s.label.as_str()), Some("C"));
    assert_eq!(result.segments.last().map(|s| s.label.as_str()), Some("Am"));
    assert!(result.key == "C Major" || result.key == "A Major");
}

#[test]
fn test_fixed_grid_gives_exact_segments() {
    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_beat_estimator(half_second_grid(120.0, 8.0));
    let result = analyzer.analyze(&c_then_a_minor()).unwrap();

    assert_eq!(result.tempo_bpm, 120);
    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[0].label, "C");
    assert_abs_diff_eq!(result.segments[0].start, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.segments[0].duration, 4.0, epsilon = 1e-9);
    assert_eq!(result.segments[1].label, "Am");
    assert_abs_diff_eq!(result.segments[1].start, 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.segments[1].duration, 4.0, epsilon = 1e-9);

    // One vote each, C came first
    assert_eq!(result.key, "C Major");
    let charts: Vec<&str> = result.diagrams.iter().map(|d| d.chord.as_str()).collect();
    assert_eq!(charts, vec!["C", "Am"]);
}

#[test]
fn test_zero_tempo_reported_as_120() {
    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_beat_estimator(half_second_grid(0.0, 8.0));
    let result = analyzer.analyze(&c_then_a_minor()).unwrap();

    assert_eq!(result.tempo_bpm, 120);
}

#[test]
fn test_silence_uses_conservative_estimates() {
    let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
    let silence = Signal::new(vec![0.0; SR as usize * 3], SR).unwrap();

    let result = analyzer.analyze(&silence).unwrap();
    assert_eq!(result.tempo_bpm, 120);
    assert_eq!(result.key, "C Major");
    assert_well_formed(&result, 0.5);
}

#[test]
fn test_short_signal_is_input_error() {
    let analyzer = Analyzer::new(AnalysisConfig::default()).unwrap();
    let signal = Signal::new(vec![0.1; 1000], SR).unwrap();

    let err = analyzer.analyze(&signal).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert!(err.is_input_error());
}

#[test]
fn test_sub_sample_duration_cap_is_input_error() {
    let config = AnalysisConfig {
        max_duration_s: 1e-6,
        ..AnalysisConfig::default()
    };
    let analyzer = Analyzer::new(config).unwrap();
    let signal = Signal::new(vec![0.1; SR as usize], SR).unwrap();

    let err = analyzer.analyze(&signal).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert!(err.to_string().contains("0 samples"));
}

#[test]
fn test_single_beat_reports_one_segment() {
    // Shorter than one beat at the fallback tempo
    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_beat_estimator(Box::new(FixedBeats {
            tempo_bpm: f64::NAN,
            beat_times: vec![],
        }));
    let signal = Signal::new(strummed(&[(&C_MAJOR[..], 0.4)], 0.5), SR).unwrap();

    let result = analyzer.analyze(&signal).unwrap();
    assert_eq!(result.segments.len(), 1);
    assert_eq!(result.segments[0].label, "C");
    assert_abs_diff_eq!(result.segments[0].duration, signal.duration_s(), epsilon = 1e-9);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AnalysisConfig {
        switch_penalty: -1.0,
        ..Default::default()
    };
    assert!(matches!(
        Analyzer::new(config),
        Err(AnalysisError::InvalidConfig(_))
    ));

    let config = AnalysisConfig {
        vocabulary: Some(vec!["C".to_string(), "Hm".to_string()]),
        ..Default::default()
    };
    assert!(matches!(
        Analyzer::new(config),
        Err(AnalysisError::InvalidConfig(_))
    ));
}

#[test]
fn test_vocabulary_override_limits_labels() {
    let config = AnalysisConfig {
        vocabulary: Some(vec!["Am".to_string(), "G".to_string()]),
        ..Default::default()
    };
    let analyzer = Analyzer::new(config)
        .unwrap()
        .with_beat_estimator(half_second_grid(120.0, 8.0));

    let result = analyzer.analyze(&c_then_a_minor()).unwrap();
    assert!(result
        .segments
        .iter()
        .all(|s| s.label == "Am" || s.label == "G"));
}

#[test]
fn test_missing_diagram_policy() {
    let only_c = || {
        DiagramBook::new(vec![ChordDiagram::new(
            "C",
            [-1, 3, 2, 0, 1, 0],
            [0, 3, 2, 0, 1, 0],
        )])
        .unwrap()
    };
    let config = |policy| AnalysisConfig {
        vocabulary: Some(vec!["Am".to_string()]),
        missing_diagrams: policy,
        ..Default::default()
    };
    let signal = c_then_a_minor();

    let omitted = Analyzer::new(config(MissingDiagramPolicy::Omit))
        .unwrap()
        .with_diagrams(only_c())
        .with_beat_estimator(half_second_grid(120.0, 8.0))
        .analyze(&signal)
        .unwrap();
    assert!(omitted.diagrams.is_empty());

    let substituted = Analyzer::new(config(MissingDiagramPolicy::SubstituteDefault))
        .unwrap()
        .with_diagrams(only_c())
        .with_beat_estimator(half_second_grid(120.0, 8.0))
        .analyze(&signal)
        .unwrap();
    assert_eq!(substituted.diagrams.len(), 1);
    assert_eq!(substituted.diagrams[0].chord, "C");
}

#[test]
fn test_analysis_is_repeatable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Analyzer>();

    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_beat_estimator(half_second_grid(120.0, 8.0));
    let signal = c_then_a_minor();
    let expected = analyzer.analyze(&signal).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..3)
            .map(|_| scope.spawn(|| analyzer.analyze(&signal).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_result_serializes_to_wire_format() {
    let analyzer = Analyzer::new(AnalysisConfig::default())
        .unwrap()
        .with_beat_estimator(half_second_grid(120.0, 8.0));
    let result = analyzer.analyze(&c_then_a_minor()).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["bpm"], 120);
    assert_eq!(json["signature"], "4/4");
    assert_eq!(json["chords"][0]["chord"], "C");
    assert!(json["chords"][1]["timestamp"].is_f64());
    assert_eq!(json["chordCharts"][0]["frets"].as_array().unwrap().len(), 6);
}
