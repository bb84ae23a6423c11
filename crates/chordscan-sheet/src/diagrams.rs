//! Guitar chord diagram lookup
//!
//! Maps chord labels to a fixed fretting/fingering pattern for display.
//! Strings are ordered low E to high E; a fret of -1 marks a muted string.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Label of the diagram used when substituting missing chords
pub const DEFAULT_DIAGRAM: &str = "C";

/// Fretting and fingering for one chord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordDiagram {
    pub chord: String,
    pub frets: [i32; 6],
    pub fingers: [i32; 6],
}

impl ChordDiagram {
    pub fn new(chord: impl Into<String>, frets: [i32; 6], fingers: [i32; 6]) -> Self {
        Self {
            chord: chord.into(),
            frets,
            fingers,
        }
    }
}

/// What to do with chords that have no diagram in the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDiagramPolicy {
    /// Attach the major-C diagram in place of the missing one
    #[default]
    SubstituteDefault,
    /// Leave the chord without a diagram
    Omit,
}

#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("failed to read diagram file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse diagram file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("diagram book has no entry for the default chord {0}")]
    MissingDefault(&'static str),
}

/// Immutable chord diagram table
#[derive(Debug, Clone)]
pub struct DiagramBook {
    diagrams: Vec<ChordDiagram>,
}

impl DiagramBook {
    /// Build a book from explicit diagrams
    ///
    /// The book must contain a [`DEFAULT_DIAGRAM`] entry so substitution
    /// always has something to return.
    pub fn new(diagrams: Vec<ChordDiagram>) -> Result<Self, DiagramError> {
        let book = Self { diagrams };
        if book.get(DEFAULT_DIAGRAM).is_none() {
            return Err(DiagramError::MissingDefault(DEFAULT_DIAGRAM));
        }
        Ok(book)
    }

    /// The standard open/barre shapes for common major and minor chords
    pub fn standard() -> Self {
        let d = ChordDiagram::new;
        Self {
            diagrams: vec![
                d("C", [0, 3, 2, 0, 1, 0], [0, 3, 2, 0, 1, 0]),
                d("Am", [0, 0, 2, 2, 1, 0], [0, 0, 2, 3, 1, 0]),
                d("F", [1, 3, 3, 2, 1, 1], [1, 3, 4, 2, 1, 1]),
                d("G", [3, 2, 0, 0, 3, 3], [3, 1, 0, 0, 4, 4]),
                d("Em", [0, 2, 2, 0, 0, 0], [0, 1, 2, 0, 0, 0]),
                d("D", [-1, 0, 0, 2, 3, 2], [0, 0, 0, 1, 3, 2]),
                d("Bm", [2, 2, 4, 4, 3, 2], [1, 1, 3, 4, 2, 1]),
                d("A", [0, 0, 2, 2, 2, 0], [0, 0, 1, 2, 3, 0]),
                d("E", [0, 2, 2, 1, 0, 0], [0, 2, 3, 1, 0, 0]),
                d("C#m", [4, 4, 6, 6, 5, 4], [1, 1, 3, 4, 2, 1]),
                d("B", [2, 2, 4, 4, 4, 2], [1, 1, 2, 3, 4, 1]),
                d("Dm", [-1, 0, 0, 2, 3, 1], [0, 0, 0, 2, 3, 1]),
                d("Bb", [1, 1, 3, 3, 3, 1], [1, 1, 2, 3, 4, 1]),
                d("F#m", [2, 4, 4, 2, 2, 2], [1, 3, 4, 1, 1, 1]),
            ],
        }
    }

    /// Load a book from a JSON array of diagrams
    pub fn load(path: &Path) -> Result<Self, DiagramError> {
        let content = std::fs::read_to_string(path).map_err(|source| DiagramError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let diagrams: Vec<ChordDiagram> =
            serde_json::from_str(&content).map_err(|source| DiagramError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(diagrams)
    }

    pub fn len(&self) -> usize {
        self.diagrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagrams.is_empty()
    }

    /// Find the diagram for a label, treating enharmonic spellings as equal
    pub fn get(&self, label: &str) -> Option<&ChordDiagram> {
        let wanted = canonical_label(label);
        self.diagrams
            .iter()
            .find(|d| canonical_label(&d.chord) == wanted)
    }

    /// Resolve a single label under `policy`
    pub fn resolve(&self, label: &str, policy: MissingDiagramPolicy) -> Option<ChordDiagram> {
        match (self.get(label), policy) {
            (Some(diagram), _) => Some(diagram.clone()),
            (None, MissingDiagramPolicy::Omit) => None,
            (None, MissingDiagramPolicy::SubstituteDefault) => self.get(DEFAULT_DIAGRAM).cloned(),
        }
    }

    /// Resolve a label sequence into a duplicate-free diagram list
    ///
    /// Order follows the first appearance of each label.
    pub fn resolve_all<'a, I>(&self, labels: I, policy: MissingDiagramPolicy) -> Vec<ChordDiagram>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out: Vec<ChordDiagram> = Vec::new();
        for label in labels {
            if let Some(diagram) = self.resolve(label, policy) {
                if !out.iter().any(|d| d.chord == diagram.chord) {
                    out.push(diagram);
                }
            }
        }
        out
    }
}

impl Default for DiagramBook {
    fn default() -> Self {
        Self::standard()
    }
}

/// Spell a chord label with sharps so "Bb" and "A#" compare equal
fn canonical_label(label: &str) -> String {
    const FLATS: [(&str, &str); 7] = [
        ("Cb", "B"),
        ("Db", "C#"),
        ("Eb", "D#"),
        ("Fb", "E"),
        ("Gb", "F#"),
        ("Ab", "G#"),
        ("Bb", "A#"),
    ];

    let label = label.trim();
    for (flat, sharp) in FLATS {
        if let Some(rest) = label.strip_prefix(flat) {
            return format!("{}{}", sharp, rest);
        }
    }
    label.to_string()
}
