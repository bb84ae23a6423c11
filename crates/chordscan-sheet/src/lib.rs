//! Chordscan sheet format library
//!
//! Wire format of an analysis result, the chord diagram lookup and the
//! on-disk sheet file wrapping a result with its metadata.

pub mod diagrams;
pub mod format;
pub mod json_format;

pub use diagrams::{ChordDiagram, DiagramBook, MissingDiagramPolicy};
pub use format::{AnalysisResult, ChordSegment, TIME_SIGNATURE};
pub use json_format::{SheetFile, SheetMetadata, SHEET_VERSION};
