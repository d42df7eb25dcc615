/// Format a second offset as an SRT clock value (`HH:MM:SS,mmm`).
///
/// Sub-millisecond precision is truncated, not rounded. The offset is first
/// rounded to whole microseconds so binary float error (0.58 stored as
/// 0.57999...) does not cost a millisecond. Hours are padded to
/// two digits but never wrap, so offsets past 99 hours keep growing the field.
/// `None`, negative and NaN offsets all format as `00:00:00,000`.
pub fn format_timestamp(seconds: Option<f64>) -> String {
    let total_ms = match seconds {
        Some(s) if s > 0.0 => (s * 1_000_000.0).round() as u64 / 1_000, // `as` saturates
        _ => 0,
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
