//! # Error Handling
//!
//! Error taxonomy for the batch subtitler.
//!
//! ## Propagation policy:
//! - **Config** and **InputNotFound** are fatal: `main` maps them to exit code 1
//! - **ModelLoad**, **Transcription** and **Io** are per-job: they are turned
//!   into a failed `JobOutcome` at the job boundary and never abort siblings
//! - **PoolFatal** means the parallel worker pool itself broke; the orchestrator
//!   logs it and re-runs the batch sequentially

use crate::device::Device;
use std::fmt;
use std::path::PathBuf;

/// Every failure the subtitler can report.
#[derive(Debug)]
pub enum BatchError {
    /// Configuration file unreadable, malformed, or holding an unusable value
    Config(String),

    /// The input path given on the command line does not exist
    InputNotFound(PathBuf),

    /// A model could not be loaded for the given key
    ModelLoad {
        model: String,
        device: Device,
        compute_type: String,
        cause: anyhow::Error,
    },

    /// Audio extraction or inference failed for one file
    Transcription(anyhow::Error),

    /// Reading or writing a file failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The parallel worker pool could not be established or lost a worker
    PoolFatal(String),
}

impl BatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BatchError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error terminates the process rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BatchError::Config(_) | BatchError::InputNotFound(_))
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BatchError::InputNotFound(path) => {
                write!(f, "Input path not found: {}", path.display())
            }
            BatchError::ModelLoad {
                model,
                device,
                compute_type,
                cause,
            } => write!(
                f,
                "Failed to load model '{}' on device '{}' with compute type '{}': {:#}",
                model, device, compute_type, cause
            ),
            BatchError::Transcription(cause) => write!(f, "Transcription failed: {:#}", cause),
            BatchError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            BatchError::PoolFatal(msg) => write!(f, "Worker pool failure: {}", msg),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Io { source, .. } => Some(source),
            BatchError::ModelLoad { cause, .. } | BatchError::Transcription(cause) => {
                Some(cause.as_ref())
            }
            _ => None,
        }
    }
}

/// Configuration loading errors (bad INI syntax, type mismatches) are fatal.
impl From<config::ConfigError> for BatchError {
    fn from(err: config::ConfigError) -> Self {
        BatchError::Config(err.to_string())
    }
}

/// Shorthand for results carrying a [`BatchError`].
pub type BatchResult<T> = Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(BatchError::Config("bad".into()).is_fatal());
        assert!(BatchError::InputNotFound("/nope".into()).is_fatal());
        assert!(!BatchError::PoolFatal("spawn".into()).is_fatal());
        assert!(!BatchError::Transcription(anyhow::anyhow!("boom")).is_fatal());
    }

    #[test]
    fn test_model_load_message_carries_context() {
        let err = BatchError::ModelLoad {
            model: "base".into(),
            device: Device::Gpu,
            compute_type: "float16".into(),
            cause: anyhow::anyhow!("network unreachable"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'base'"));
        assert!(msg.contains("'cuda'"));
        assert!(msg.contains("'float16'"));
        assert!(msg.contains("network unreachable"));
    }
}
