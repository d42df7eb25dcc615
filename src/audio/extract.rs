use super::WHISPER_SAMPLE_RATE;
use anyhow::{anyhow, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};

/// Program used to decode media files; overridable for unusual installs
const FFMPEG_ENV: &str = "SUBTITLER_FFMPEG";

/// Decode the first audio stream of `path` into 16kHz mono samples.
///
/// ## Errors:
/// - ffmpeg is missing or cannot be started
/// - ffmpeg exits non-zero (unreadable file, no audio stream, ...)
pub fn extract_pcm(path: &Path) -> Result<Vec<f32>> {
    let program = std::env::var(FFMPEG_ENV).unwrap_or_else(|_| "ffmpeg".to_string());
    extract_pcm_with(&program, path)
}

fn extract_pcm_with(program: &str, path: &Path) -> Result<Vec<f32>> {
    let output = Command::new(&program)
        .args(["-nostdin", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(path)
        .args(["-vn", "-ac", "1", "-ar"])
        .arg(WHISPER_SAMPLE_RATE.to_string())
        .args(["-f", "f32le", "-"])
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run '{}' (is ffmpeg installed?)", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "ffmpeg could not decode {} ({}): {}",
            path.display(),
            output.status,
            stderr.trim()
        ));
    }

    let samples = decode_f32le(&output.stdout);
    tracing::debug!(
        "Extracted {:.2}s of audio from {}",
        samples.len() as f64 / WHISPER_SAMPLE_RATE as f64,
        path.display()
    );
    Ok(samples)
}

/// Interpret raw bytes as little-endian f32 samples. A trailing partial sample is dropped.
pub fn decode_f32le(bytes: &[u8]) -> Vec<f32> {
    let mut cursor = Cursor::new(bytes);
    let mut samples = Vec::with_capacity(bytes.len() / 4);
    while let Ok(sample) = cursor.read_f32::<LittleEndian>() {
        samples.push(sample);
    }
    samples
}
