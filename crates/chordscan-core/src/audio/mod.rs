//! Audio loading
//!
//! Local files only: WAV through hound, every other container or codec
//! symphonia can probe (MP3, AAC/M4A, FLAC, Ogg Vorbis, MKV/WebM). Output is
//! mono at the requested sample rate.

mod decoder;
mod resample;

pub use decoder::{decode_audio, AudioData};
pub use resample::resample_to_target;
