//! # Subtitler - Main Application Entry Point
//!
//! Batch-transcribes video files into `.srt` subtitles placed beside them.
//!
//! ## Application Architecture:
//! - **config**: Typed configuration (INI file + environment variables)
//! - **device**: CPU/GPU selection and runtime downgrade
//! - **discovery**: Finds the media files to process
//! - **transcription**: Backend trait, per-worker model cache, Whisper on candle
//! - **audio**: ffmpeg-based audio extraction
//! - **subtitle**: Timestamp formatting and atomic SRT writing
//! - **batch**: Worker pool, sequential runner and fallback
//! - **error**: Error taxonomy and propagation policy
//!
//! ## Exit Codes:
//! - `0`: the batch ran (even if some files failed) or there was nothing to do
//! - `1`: configuration could not be loaded or the input path does not exist

mod audio;          // Audio extraction (audio/ directory)
mod batch;          // Batch orchestration (batch/ directory)
mod config;         // Configuration management (config.rs)
mod device;         // Device selection (device.rs)
mod discovery;      // Media file discovery (discovery.rs)
mod error;          // Error handling types (error.rs)
mod subtitle;       // SRT output (subtitle/ directory)
mod transcription;  // Transcription backends and model cache (transcription/ directory)

use batch::BatchOrchestrator;
use clap::Parser;
use config::Configuration;
use device::DeviceManager;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcription::WhisperBackend;

/// Generate SRT subtitles for video files with Whisper.
#[derive(Debug, Parser)]
#[command(name = "subtitler", version, about)]
struct Cli {
    /// Video file or directory to scan recursively
    input_path: PathBuf,

    /// Path to the INI configuration file
    #[arg(long, default_value = "config.ini")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // It's fine if there's no .env file
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    info!("Starting subtitler v{}", env!("CARGO_PKG_VERSION"));

    let config = match Configuration::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = match cli.input_path.canonicalize() {
        Ok(path) => path,
        Err(_) => {
            error!("{}", error::BatchError::InputNotFound(cli.input_path));
            return ExitCode::FAILURE;
        }
    };

    let device = DeviceManager::resolve(config.device);
    let config = config.with_device(device);

    info!("Configuration:");
    info!("  Model: {}", config.model_identifier);
    info!("  Device: {}", config.device);
    info!("  Compute type: {}", config.compute_type);
    info!("  Language: {}", config.language.as_deref().unwrap_or("auto-detect"));
    info!("  Parallel workers: {}", config.parallel_workers);

    let files = match discovery::discover(&input, &config.video_extensions) {
        Ok(files) => files,
        Err(e) => {
            error!("{}", e);
            return if e.is_fatal() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    if files.is_empty() {
        info!("No video files found to process in {}", input.display());
        return ExitCode::SUCCESS;
    }
    info!("Found {} video file(s)", files.len());

    let orchestrator = BatchOrchestrator::new(WhisperBackend::new(), config);
    let report = orchestrator.run(files).await;
    info!("{}", report.summary());
    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        warn!(
            "  {}: {}",
            outcome.file.path.display(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing (logging) system.
///
/// `RUST_LOG` controls what gets logged; defaults to `subtitler=info`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subtitler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
