//! # Transcription Module
//!
//! The seam between the batch orchestrator and the speech-recognition model.
//!
//! ## Key Components:
//! - **TranscriptionBackend**: trait the orchestrator drives (load a model, transcribe a file)
//! - **ModelCache**: per-worker memo of loaded models
//! - **WhisperBackend**: the production backend, Whisper on candle
//!
//! Backends must be idempotent per path: the orchestrator may transcribe the
//! same file twice when it falls back from parallel to sequential execution.

pub mod cache;    // Per-worker model memoization
pub mod engine;   // Whisper backend wiring audio extraction to the model
pub mod model;    // Candle Whisper model loading and decoding

pub use cache::{ModelCache, ModelKey};
pub use engine::WhisperBackend;

use std::path::Path;

/// A time-bounded span of transcribed speech.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds, never before `start`
    pub end: f64,
    pub text: String,
}

/// Everything a backend returns for one media file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionResult {
    /// Segments ordered by start time
    pub segments: Vec<TranscriptSegment>,
    pub detected_language: Option<String>,
}

/// The transcription collaborator.
///
/// One backend value is shared by every worker, so it must be `Send + Sync`.
/// The models it loads are not: each worker keeps its own in a [`ModelCache`]
/// and only ever hands out `&mut` access from that worker.
pub trait TranscriptionBackend: Send + Sync + 'static {
    /// Loaded model handle; expensive to build, owned by one worker
    type Model;

    /// Load (and possibly download) the model described by `key`.
    fn load_model(&self, key: &ModelKey) -> anyhow::Result<Self::Model>;

    /// Transcribe the audio track of `path`.
    ///
    /// `language` forces the transcription language; `None` asks the model to detect it.
    fn transcribe(
        &self,
        model: &mut Self::Model,
        path: &Path,
        language: Option<&str>,
    ) -> anyhow::Result<TranscriptionResult>;
}
