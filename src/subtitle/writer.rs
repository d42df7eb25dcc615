use super::{format_timestamp, SUBTITLE_EXTENSION};
use crate::error::{BatchError, BatchResult};
use crate::transcription::TranscriptSegment;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Output location for a media file: same directory and stem, `.srt` extension.
pub fn subtitle_path_for(media: &Path) -> PathBuf {
    media.with_extension(SUBTITLE_EXTENSION)
}

/// Render segments as an SRT document.
pub fn render_srt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(Some(segment.start)),
            format_timestamp(Some(segment.end)),
            segment.text.trim(),
        );
    }
    out
}

/// Write segments to `output_path`, replacing any existing file.
///
/// The document is written to a temporary sibling and renamed into place, so
/// `output_path` either receives the complete subtitle or stays as it was.
pub fn write_srt(segments: &[TranscriptSegment], output_path: &Path) -> BatchResult<()> {
    let contents = render_srt(segments);

    let file_name = output_path
        .file_name()
        .ok_or_else(|| {
            BatchError::io(
                output_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path has no file name"),
            )
        })?
        .to_string_lossy();
    let temp_path = output_path.with_file_name(format!(
        ".{}.{}.tmp",
        file_name,
        Uuid::new_v4().simple()
    ));

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(BatchError::io(output_path, e));
    }

    fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        BatchError::io(output_path, e)
    })
}
