//! Key estimation by majority vote over chord roots
//!
//! Only the root is considered and the result is always reported as a major
//! key; minor keys are not detected.

use chordscan_sheet::ChordSegment;

/// Root reported when there is nothing to vote on
pub const DEFAULT_KEY_ROOT: &str = "C";

/// Most frequent root, rendered as "<root> Major"
///
/// Ties go to the root encountered first.
pub fn estimate<I, S>(roots: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // (root, votes) in first-encountered order
    let mut tally: Vec<(String, usize)> = Vec::new();
    for root in roots {
        let root = root.as_ref();
        match tally.iter_mut().find(|(r, _)| r == root) {
            Some((_, votes)) => *votes += 1,
            None => tally.push((root.to_string(), 1)),
        }
    }

    let mut winner: Option<&(String, usize)> = None;
    for entry in &tally {
        if winner.map_or(true, |w| entry.1 > w.1) {
            winner = Some(entry);
        }
    }

    let root = winner.map_or(DEFAULT_KEY_ROOT, |(r, _)| r.as_str());
    format!("{} Major", root)
}

/// Strip the quality suffix from a chord label
pub fn chord_root(label: &str) -> &str {
    label.strip_suffix('m').unwrap_or(label)
}

/// Key of a merged chord sequence, one vote per segment
///
/// Votes run over the smoothed sequence rather than per beat: a chord held
/// for many beats and a brief one each count once per run, so single-beat
/// fluctuations the decoder let through weigh no more than a sustained chord.
pub fn estimate_from_segments(segments: &[ChordSegment]) -> String {
    estimate(segments.iter().map(|s| chord_root(&s.label)))
}
