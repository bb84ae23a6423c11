//! JSON sheet files
//!
//! A sheet file stores one analysis result together with where it came from
//! and the parameters it was produced with.

use crate::format::AnalysisResult;
use serde::{Deserialize, Serialize};

/// Current sheet file version
pub const SHEET_VERSION: &str = "1.0";

/// Complete sheet file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetFile {
    pub version: String,
    pub metadata: SheetMetadata,
    pub analysis: AnalysisResult,
}

/// Metadata about the analysed audio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetMetadata {
    /// Source identifier (file path or external id)
    pub source: String,
    pub sample_rate: u32,
    /// Analysed duration after truncation (seconds)
    pub duration_s: f64,
    pub created_at: String,
    /// Analysis parameters used, as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl SheetFile {
    /// Create a new sheet file stamped with the current time
    pub fn new(source: String, sample_rate: u32, duration_s: f64, analysis: AnalysisResult) -> Self {
        Self {
            version: SHEET_VERSION.to_string(),
            metadata: SheetMetadata {
                source,
                sample_rate,
                duration_s,
                created_at: chrono::Utc::now().to_rfc3339(),
                params: None,
            },
            analysis,
        }
    }

    /// Attach the analysis parameters
    pub fn with_params<P: Serialize>(mut self, params: &P) -> anyhow::Result<Self> {
        self.metadata.params = Some(serde_json::to_value(params)?);
        Ok(self)
    }

    /// Save to JSON file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json_str)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json_str = std::fs::read_to_string(path)?;
        let sheet: SheetFile = serde_json::from_str(&json_str)?;
        if sheet.version != SHEET_VERSION {
            anyhow::bail!(
                "Unsupported sheet version {} in {}",
                sheet.version,
                path.display()
            );
        }
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagrams::DiagramBook;
    use crate::format::{ChordSegment, TIME_SIGNATURE};
    use approx::assert_abs_diff_eq;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            tempo_bpm: 120,
            time_signature: TIME_SIGNATURE.to_string(),
            key: "C Major".to_string(),
            segments: vec![ChordSegment::new("C", 0.0, 2.0), ChordSegment::new("Am", 2.0, 2.0)],
            diagrams: DiagramBook::standard().resolve_all(
                ["C", "Am"],
                crate::MissingDiagramPolicy::Omit,
            ),
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "chordscan-sheet-test-{}.json",
            std::process::id()
        ));

        let sheet = SheetFile::new("song.wav".to_string(), 22050, 4.0, analysis())
            .with_params(&serde_json::json!({ "switch_penalty": 0.15 }))
            .unwrap();
        sheet.save(&path).unwrap();

        let loaded = SheetFile::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.version, SHEET_VERSION);
        assert_eq!(loaded.metadata.source, "song.wav");
        assert_eq!(loaded.analysis, sheet.analysis);
        assert_abs_diff_eq!(
            loaded.metadata.params.unwrap()["switch_penalty"].as_f64().unwrap(),
            0.15,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_unknown_version() {
        let path = std::env::temp_dir().join(format!(
            "chordscan-sheet-version-{}.json",
            std::process::id()
        ));

        let mut sheet = SheetFile::new("song.wav".to_string(), 22050, 4.0, analysis());
        sheet.version = "9.9".to_string();
        sheet.save(&path).unwrap();

        let loaded = SheetFile::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(loaded.is_err());
    }
}
