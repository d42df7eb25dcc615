//! # Audio Extraction
//!
//! Pulls the audio track out of a media container as the PCM stream Whisper
//! expects. Demuxing and resampling are delegated to an external `ffmpeg`
//! process; this module only drives it and decodes its output.
//!
//! ## Audio Format Produced:
//! - **Sample Rate**: 16kHz
//! - **Channels**: Mono
//! - **Encoding**: 32-bit little-endian float

pub mod extract;

pub use extract::extract_pcm;

/// Sample rate the Whisper models are trained on
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;
