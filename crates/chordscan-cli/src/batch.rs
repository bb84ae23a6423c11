//! Directory scanning and output naming for batch analysis

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File extensions picked up from the input directory
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "wave", "mp3", "flac", "ogg", "oga", "m4a", "mp4", "aac", "mkv", "webm",
];

/// Suffix appended to the input file name
pub const SHEET_SUFFIX: &str = ".chords.json";

/// Audio files directly inside `dir`, sorted by path
pub fn find_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_audio_file(path))
        .collect();
    files.sort();
    Ok(files)
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Sheet file path for `input` inside `output_dir`
///
/// Keeps the full file name, extension included, so `song.wav` and
/// `song.mp3` from one directory never share an output.
pub fn sheet_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", input.display()))?;
    Ok(output_dir.join(format!("{}{}", name, SHEET_SUFFIX)))
}
