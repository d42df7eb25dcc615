use crate::config::Configuration;
use crate::discovery::MediaFile;
use crate::error::{BatchError, BatchResult};
use crate::subtitle::{subtitle_path_for, write_srt};
use crate::transcription::{ModelCache, ModelKey, TranscriptionBackend};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What happened to one media file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub file: MediaFile,
    pub success: bool,
    /// Written subtitle on success
    pub subtitle_path: Option<PathBuf>,
    /// Error message on failure
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn succeeded(file: MediaFile, subtitle_path: PathBuf) -> Self {
        Self {
            file,
            success: true,
            subtitle_path: Some(subtitle_path),
            error: None,
        }
    }

    pub fn failed(file: MediaFile, error: impl Into<String>) -> Self {
        Self {
            file,
            success: false,
            subtitle_path: None,
            error: Some(error.into()),
        }
    }
}

/// Transcribe one file and write its subtitle, returning the subtitle path.
pub fn run_job<B: TranscriptionBackend>(
    backend: &B,
    cache: &mut ModelCache<B::Model>,
    config: &Configuration,
    file: &MediaFile,
) -> BatchResult<PathBuf> {
    let key = ModelKey::from_config(config);
    let model = cache.get_or_load(&key, |key| backend.load_model(key))?;

    let result = backend
        .transcribe(model, &file.path, config.language.as_deref())
        .map_err(BatchError::Transcription)?;

    let output = subtitle_path_for(&file.path);
    write_srt(&result.segments, &output)?;
    Ok(output)
}

/// Run one job and fold its result into an outcome; never fails.
///
/// A panic inside the job is caught here and reported as a failure like any
/// other error. The worker's model for the job is evicted afterwards, since
/// inference may have been interrupted with the model half-updated.
///
/// `position` is 1-based and only used for progress messages.
pub fn process_file<B: TranscriptionBackend>(
    backend: &B,
    cache: &mut ModelCache<B::Model>,
    config: &Configuration,
    file: &MediaFile,
    position: usize,
    total: usize,
) -> JobOutcome {
    info!("[{}/{}] Processing: {}", position, total, file.name());

    let result = panic::catch_unwind(AssertUnwindSafe(|| run_job(backend, cache, config, file)));

    match result {
        Ok(Ok(output)) => {
            info!("Successfully created subtitle: {}", output.display());
            JobOutcome::succeeded(file.clone(), output)
        }
        Ok(Err(e)) => {
            error!("Failed to process {}: {}", file.name(), e);
            JobOutcome::failed(file.clone(), e.to_string())
        }
        Err(payload) => {
            let message = format!("job panicked: {}", panic_message(payload.as_ref()));
            error!("Failed to process {}: {}", file.name(), message);
            let key = ModelKey::from_config(config);
            if cache.remove(&key).is_some() {
                warn!("Discarded model {} after a panic; it will be reloaded", key);
            }
            JobOutcome::failed(file.clone(), message)
        }
    }
}

/// Human-readable text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::{TranscriptSegment, TranscriptionResult};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoBackend {
        loads: AtomicUsize,
    }

    impl TranscriptionBackend for EchoBackend {
        type Model = String;

        fn load_model(&self, key: &ModelKey) -> anyhow::Result<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(key.model_identifier.clone())
        }

        fn transcribe(
            &self,
            model: &mut String,
            path: &Path,
            _language: Option<&str>,
        ) -> anyhow::Result<TranscriptionResult> {
            let name = path.file_name().unwrap().to_string_lossy();
            if name.contains("corrupt") {
                anyhow::bail!("no audio stream");
            }
            if name.contains("crash") {
                panic!("index out of bounds in decoder");
            }
            Ok(TranscriptionResult {
                segments: vec![TranscriptSegment {
                    start: 0.0,
                    end: 1.5,
                    text: model.clone(),
                }],
                detected_language: Some("en".to_string()),
            })
        }
    }

    fn media(dir: &Path, name: &str) -> MediaFile {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        MediaFile {
            path,
            extension: ".mp4".to_string(),
        }
    }

    #[test]
    fn test_successful_job_writes_subtitle_beside_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = media(dir.path(), "lecture.mp4");
        let backend = EchoBackend { loads: AtomicUsize::new(0) };
        let mut cache = ModelCache::new();

        let outcome = process_file(&backend, &mut cache, &Configuration::default(), &file, 1, 1);

        let expected = dir.path().join("lecture.srt");
        assert!(outcome.success);
        assert_eq!(outcome.subtitle_path.as_deref(), Some(expected.as_path()));
        assert_eq!(
            std::fs::read_to_string(expected).unwrap(),
            "1\n00:00:00,000 --> 00:00:01,500\nbase\n\n"
        );
    }

    #[test]
    fn test_failed_job_reports_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = media(dir.path(), "corrupt.mp4");
        let backend = EchoBackend { loads: AtomicUsize::new(0) };
        let mut cache = ModelCache::new();

        let outcome = process_file(&backend, &mut cache, &Configuration::default(), &file, 1, 1);

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("no audio stream"));
        assert!(!dir.path().join("corrupt.srt").exists());
    }

    #[test]
    fn test_panicking_job_becomes_failure_and_evicts_model() {
        let dir = tempfile::tempdir().unwrap();
        let backend = EchoBackend { loads: AtomicUsize::new(0) };
        let mut cache = ModelCache::new();
        let config = Configuration::default();

        let crashed = process_file(&backend, &mut cache, &config, &media(dir.path(), "crash.mp4"), 1, 2);

        assert!(!crashed.success);
        let message = crashed.error.unwrap();
        assert!(message.contains("panicked"), "{}", message);
        assert!(message.contains("index out of bounds in decoder"), "{}", message);
        assert!(cache.is_empty());
        assert!(!dir.path().join("crash.srt").exists());

        // The next job on the same worker gets a freshly loaded model
        let next = process_file(&backend, &mut cache, &config, &media(dir.path(), "next.mp4"), 2, 2);
        assert!(next.success);
        assert_eq!(backend.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panic_message_extraction() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(static_str.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }

    #[test]
    fn test_jobs_share_the_worker_cache() {
        let dir = tempfile::tempdir().unwrap();
        let backend = EchoBackend { loads: AtomicUsize::new(0) };
        let mut cache = ModelCache::new();
        let config = Configuration::default();

        for name in ["a.mp4", "b.mp4", "c.mp4"] {
            run_job(&backend, &mut cache, &config, &media(dir.path(), name)).unwrap();
        }

        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }
}
