//! # Transcription Engine
//!
//! The production [`TranscriptionBackend`]: pulls the audio track out of a
//! media file with ffmpeg and runs it through a candle Whisper model.
//!
//! ## Key Responsibilities:
//! - **Model loading**: delegates to [`WhisperModel::load`] for the worker's cache
//! - **Audio-to-text conversion**: extract PCM, decode, return timestamped segments
//! - **Performance monitoring**: log audio duration against processing time

use crate::audio::{extract_pcm, WHISPER_SAMPLE_RATE};
use crate::transcription::model::WhisperModel;
use crate::transcription::{ModelKey, TranscriptionBackend, TranscriptionResult};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Whisper on candle, fed by ffmpeg.
///
/// Stateless: every worker shares one value and keeps its own loaded
/// [`WhisperModel`] in its cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhisperBackend;

impl WhisperBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TranscriptionBackend for WhisperBackend {
    type Model = WhisperModel;

    fn load_model(&self, key: &ModelKey) -> Result<WhisperModel> {
        WhisperModel::load(key)
    }

    fn transcribe(
        &self,
        model: &mut WhisperModel,
        path: &Path,
        language: Option<&str>,
    ) -> Result<TranscriptionResult> {
        let start_time = Instant::now();

        let pcm = extract_pcm(path)
            .with_context(|| format!("failed to extract audio from {}", path.display()))?;
        let audio_duration = pcm.len() as f64 / WHISPER_SAMPLE_RATE as f64;

        let result = model
            .transcribe_pcm(&pcm, language)
            .with_context(|| format!("inference failed for {}", path.display()))?;

        let elapsed = start_time.elapsed().as_secs_f64();
        info!(
            "Transcribed {:.1}s of audio into {} segment(s) in {:.1}s (language: {})",
            audio_duration,
            result.segments.len(),
            elapsed,
            result.detected_language.as_deref().unwrap_or("unknown")
        );

        Ok(result)
    }
}
