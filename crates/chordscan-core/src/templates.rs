//! Chord templates
//!
//! Binary triad masks over the 12 pitch classes, L1-normalized. The default
//! bank holds the 12 major triads followed by the 12 minor triads.

use crate::error::{AnalysisError, Result};

/// Pitch class names, C = 0, sharp spellings
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Triad quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
}

impl ChordQuality {
    /// Semitone offsets of the triad tones above the root
    pub fn intervals(self) -> [usize; 3] {
        match self {
            ChordQuality::Major => [0, 4, 7],
            ChordQuality::Minor => [0, 3, 7],
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
        }
    }
}

/// A triad identified by root pitch class and quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub root: usize,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn new(root: usize, quality: ChordQuality) -> Self {
        Self {
            root: root % 12,
            quality,
        }
    }

    /// Canonical label: sharp root name plus "m" for minor
    pub fn label(&self) -> String {
        format!("{}{}", PITCH_CLASSES[self.root], self.quality.suffix())
    }

    /// Parse a label such as "C", "F#m" or "Bbm"
    pub fn parse(label: &str) -> Option<Self> {
        let (root_part, quality) = match label.strip_suffix('m') {
            Some(root) => (root, ChordQuality::Minor),
            None => (label, ChordQuality::Major),
        };
        parse_pitch_class(root_part).map(|root| Self::new(root, quality))
    }

    /// L1-normalized binary template
    pub fn template(&self) -> [f64; 12] {
        let mut template = [0.0; 12];
        let intervals = self.quality.intervals();
        for interval in intervals {
            template[(self.root + interval) % 12] = 1.0 / intervals.len() as f64;
        }
        template
    }
}

/// Parse a root name with an optional single sharp or flat
pub fn parse_pitch_class(name: &str) -> Option<usize> {
    let mut chars = name.chars();
    let base = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let offset: isize = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" => -1,
        _ => return None,
    };
    Some(((base as isize + offset).rem_euclid(12)) as usize)
}

/// Ordered chord vocabulary with its templates
#[derive(Debug, Clone)]
pub struct TemplateBank {
    labels: Vec<String>,
    templates: Vec<[f64; 12]>,
}

impl TemplateBank {
    /// The 24 major and minor triads
    pub fn standard() -> Self {
        let chords = [ChordQuality::Major, ChordQuality::Minor]
            .into_iter()
            .flat_map(|quality| (0..12).map(move |root| Chord::new(root, quality)));
        Self::from_chords(chords)
    }

    /// Restrict the bank to `vocabulary`, keeping the given order
    ///
    /// Labels are canonicalized (flats become sharps); unknown or repeated
    /// chords are rejected.
    pub fn from_vocabulary<S: AsRef<str>>(vocabulary: &[S]) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "chord vocabulary is empty".to_string(),
            ));
        }

        let mut chords: Vec<Chord> = Vec::with_capacity(vocabulary.len());
        for label in vocabulary {
            let label = label.as_ref();
            let chord = Chord::parse(label).ok_or_else(|| {
                AnalysisError::InvalidConfig(format!("unknown chord label '{}'", label))
            })?;
            if chords.contains(&chord) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "duplicate chord label '{}'",
                    label
                )));
            }
            chords.push(chord);
        }
        Ok(Self::from_chords(chords))
    }

    fn from_chords(chords: impl IntoIterator<Item = Chord>) -> Self {
        let (labels, templates): (Vec<String>, Vec<[f64; 12]>) = chords
            .into_iter()
            .map(|c| (c.label(), c.template()))
            .unzip();
        Self { labels, templates }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn templates(&self) -> &[[f64; 12]] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Index of a chord label, accepting flat spellings
    pub fn index_of(&self, label: &str) -> Option<usize> {
        let canonical = Chord::parse(label)?.label();
        self.labels.iter().position(|l| *l == canonical)
    }
}

impl Default for TemplateBank {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standard_bank_layout() {
        let bank = TemplateBank::standard();
        assert_eq!(bank.len(), 24);
        assert_eq!(bank.label(0), Some("C"));
        assert_eq!(bank.label(11), Some("B"));
        assert_eq!(bank.label(12), Some("Cm"));
        assert_eq!(bank.label(21), Some("Am"));
    }

    #[test]
    fn test_templates_are_l1_normalized() {
        let bank = TemplateBank::standard();
        for template in bank.templates() {
            let sum: f64 = template.iter().sum();
            assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
            assert_eq!(template.iter().filter(|&&v| v > 0.0).count(), 3);
        }
    }

    #[test]
    fn test_triad_tones() {
        let c = Chord::parse("C").unwrap().template();
        assert!(c[0] > 0.0 && c[4] > 0.0 && c[7] > 0.0);

        let am = Chord::parse("Am").unwrap().template();
        assert!(am[9] > 0.0 && am[0] > 0.0 && am[4] > 0.0);

        // B minor wraps around the octave
        let bm = Chord::parse("Bm").unwrap().template();
        assert!(bm[11] > 0.0 && bm[2] > 0.0 && bm[6] > 0.0);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(Chord::parse("F#m").unwrap().label(), "F#m");
        assert_eq!(Chord::parse("Bb").unwrap().label(), "A#");
        assert_eq!(Chord::parse("Ebm").unwrap().label(), "D#m");
        assert_eq!(Chord::parse("Cb").unwrap().label(), "B");
        assert!(Chord::parse("H").is_none());
        assert!(Chord::parse("C7").is_none());
        assert!(Chord::parse("").is_none());
        assert!(Chord::parse("m").is_none());
    }

    #[test]
    fn test_vocabulary_override() {
        let bank = TemplateBank::from_vocabulary(&["G", "Em", "C", "D"]).unwrap();
        assert_eq!(bank.len(), 4);
        assert_eq!(bank.labels(), &["G", "Em", "C", "D"]);
        assert_eq!(bank.index_of("Em"), Some(1));
        assert_eq!(bank.index_of("Am"), None);
    }

    #[test]
    fn test_vocabulary_canonicalizes_flats() {
        let bank = TemplateBank::from_vocabulary(&["Bb", "Gm"]).unwrap();
        assert_eq!(bank.labels(), &["A#", "Gm"]);
        assert_eq!(bank.index_of("Bb"), Some(0));
    }

    #[test]
    fn test_vocabulary_rejects_unknown_and_duplicates() {
        assert!(matches!(
            TemplateBank::from_vocabulary(&["C", "Cmaj7"]),
            Err(AnalysisError::InvalidConfig(_))
        ));
        assert!(matches!(
            TemplateBank::from_vocabulary(&["A#", "Bb"]),
            Err(AnalysisError::InvalidConfig(_))
        ));
        let empty: [&str; 0] = [];
        assert!(TemplateBank::from_vocabulary(&empty).is_err());
    }
}
