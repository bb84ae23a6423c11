//! Error types for chord analysis

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single analysis request
///
/// Locally recoverable degeneracies (tempo, separation) never reach this
/// type; they are replaced by fallback values inside the pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Empty, too short or non-finite input signal
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The frame-level transform behind chroma extraction failed
    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),

    /// Incompatible shapes between pipeline stages
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Source audio could not be loaded
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Serializable category of an [`AnalysisError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InvalidConfig,
    FeatureExtraction,
    ShapeMismatch,
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::FeatureExtraction => "feature_extraction",
            ErrorKind::ShapeMismatch => "shape_mismatch",
            ErrorKind::Decode => "decode",
        }
    }
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput(_) => ErrorKind::InvalidInput,
            AnalysisError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            AnalysisError::FeatureExtraction(_) => ErrorKind::FeatureExtraction,
            AnalysisError::ShapeMismatch(_) => ErrorKind::ShapeMismatch,
            AnalysisError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// True when the failure comes from the caller's data rather than a bug
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidInput(_) | AnalysisError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
