//! JSON output formatting
//!
//! Everything printed on stdout is JSON so callers can parse it directly;
//! logs go to stderr.

use chordscan_core::AnalysisError;
use serde::Serialize;

/// Kind reported for failures outside the analysis itself
const IO_ERROR_KIND: &str = "io";

/// Failure report: `{"status":"error","kind":..,"message":..}`
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub status: &'static str,
    pub kind: String,
    pub message: String,
}

impl ErrorOutput {
    pub fn from_error(err: &anyhow::Error) -> Self {
        let kind = err
            .downcast_ref::<AnalysisError>()
            .map_or(IO_ERROR_KIND, |e| e.kind().as_str());
        Self {
            status: "error",
            kind: kind.to_string(),
            message: format!("{:#}", err),
        }
    }
}

/// Outcome of one file in a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub processing_time_seconds: f64,
}

impl BatchEntry {
    pub fn success(input_file: String, output_file: String, seconds: f64) -> Self {
        Self {
            input_file,
            output_file: Some(output_file),
            status: "success",
            kind: None,
            message: None,
            processing_time_seconds: seconds,
        }
    }

    pub fn failure(input_file: String, err: &anyhow::Error, seconds: f64) -> Self {
        let report = ErrorOutput::from_error(err);
        Self {
            input_file,
            output_file: None,
            status: "error",
            kind: Some(report.kind),
            message: Some(report.message),
            processing_time_seconds: seconds,
        }
    }

    pub fn is_success(&self) -> bool {
        self.output_file.is_some()
    }
}

/// Summary of a batch run
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub status: &'static str,
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<BatchEntry>,
}

impl BatchSummary {
    /// Results are ordered by input path
    pub fn new(mut results: Vec<BatchEntry>) -> Self {
        results.sort_by(|a, b| a.input_file.cmp(&b.input_file));
        let failed = results.iter().filter(|r| !r.is_success()).count();
        let status = match failed {
            0 => "success",
            n if n == results.len() => "error",
            _ => "partial",
        };
        Self {
            status,
            processed: results.len() - failed,
            failed,
            results,
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print a failure report
pub fn print_error(err: &anyhow::Error) {
    print_json(&ErrorOutput::from_error(err));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_kind_is_reported() {
        let err = anyhow::Error::new(AnalysisError::InvalidInput("empty signal".to_string()));
        let json = serde_json::to_value(ErrorOutput::from_error(&err)).unwrap();

        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "invalid_input");
        assert_eq!(json["message"], "invalid input: empty signal");
    }

    #[test]
    fn test_context_keeps_analysis_kind() {
        let err = anyhow::Error::new(AnalysisError::Decode("bad header".to_string()))
            .context("song.mp3");
        let report = ErrorOutput::from_error(&err);

        assert_eq!(report.kind, "decode");
        assert!(report.message.contains("song.mp3"));
        assert!(report.message.contains("bad header"));
    }

    #[test]
    fn test_other_errors_are_io() {
        let err = anyhow::anyhow!("disk full");
        assert_eq!(ErrorOutput::from_error(&err).kind, "io");
    }

    #[test]
    fn test_batch_summary_counts() {
        let err = anyhow::anyhow!("unreadable");
        let summary = BatchSummary::new(vec![
            BatchEntry::success("b.wav".into(), "out/b.chords.json".into(), 1.0),
            BatchEntry::failure("a.wav".into(), &err, 0.1),
        ]);

        assert_eq!(summary.status, "partial");
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.results[0].input_file, "a.wav");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["results"][0].get("output_file").is_none());
        assert_eq!(json["results"][1]["output_file"], "out/b.chords.json");
    }

    #[test]
    fn test_empty_batch_is_success() {
        let summary = BatchSummary::new(Vec::new());
        assert_eq!(summary.status, "success");
        assert_eq!(summary.processed, 0);
    }
}
