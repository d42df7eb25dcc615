//! # Subtitle Output
//!
//! Serializes transcript segments into SubRip (`.srt`) files.
//!
//! ## Format:
//! ```text
//! 1
//! 00:00:00,000 --> 00:00:01,000
//! hi
//!
//! ```
//! Blocks are numbered from 1 in segment order. Files are written atomically,
//! so a failed write never leaves a half-written subtitle behind.

pub mod timestamp;
pub mod writer;

pub use timestamp::format_timestamp;
pub use writer::{subtitle_path_for, write_srt};

/// File extension of generated subtitle files (without the dot)
pub const SUBTITLE_EXTENSION: &str = "srt";
