//! # Configuration Management
//!
//! Loads the batch configuration from layered sources:
//! - Built-in defaults
//! - An INI file (`config.ini` unless `--config` says otherwise)
//! - Environment variables prefixed with `SUBTITLER_`
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (`SUBTITLER_TRANSCRIPTION__DEVICE=cpu`, ...)
//! 2. Configuration file
//! 3. Default values
//!
//! The raw sections are deserialized as strings and then validated into the
//! typed, immutable [`Configuration`] record. Unknown keys are ignored.

use crate::device::Device;
use crate::error::{BatchError, BatchResult};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::warn;

/// Built-in model aliases. Entries in the `[MODELS]` section extend or override these.
const DEFAULT_MODEL_ALIASES: &[(&str, &str)] = &[
    ("tiny", "tiny"),
    ("base", "base"),
    ("small", "small"),
    ("medium", "medium"),
    ("large-turbo", "large-v3-turbo"),
];

const DEFAULT_MODEL_NAME: &str = "base";
const DEFAULT_DEVICE: &str = "cuda";
const DEFAULT_COMPUTE_TYPE: &str = "float16";
const DEFAULT_VIDEO_EXTENSIONS: &str = ".mp4, .mkv, .avi, .mov, .wmv";

/// Typed, immutable batch configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Resolved model identifier (after alias lookup)
    pub model_identifier: String,
    pub device: Device,
    /// Numeric precision tag handed to the backend, e.g. "float16"
    pub compute_type: String,
    /// Forced transcription language; `None` means auto-detect
    pub language: Option<String>,
    /// Lowercase extensions, each with a leading dot
    pub video_extensions: BTreeSet<String>,
    pub parallel_workers: NonZeroUsize,
}

/// The INI file as the `config` crate sees it: sections of string values.
///
/// Section names are accepted in either case.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default, alias = "TRANSCRIPTION")]
    transcription: TranscriptionSection,
    #[serde(default, alias = "FILES")]
    files: FilesSection,
    #[serde(default, alias = "MODELS")]
    models: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranscriptionSection {
    model_name: Option<String>,
    device: Option<String>,
    language: Option<String>,
    compute_type: Option<String>,
    parallel_workers: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilesSection {
    video_extensions: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            model_identifier: DEFAULT_MODEL_NAME.to_string(),
            device: Device::Gpu,
            compute_type: DEFAULT_COMPUTE_TYPE.to_string(),
            language: None,
            video_extensions: parse_extensions(DEFAULT_VIDEO_EXTENSIONS),
            parallel_workers: default_workers(),
        }
    }
}

impl Configuration {
    /// Load configuration from the INI file at `path` plus environment overrides.
    ///
    /// A missing file is not an error: a warning is logged and defaults apply.
    pub fn load(path: &Path) -> BatchResult<Self> {
        let mut builder = config::Config::builder();

        if path.is_file() {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Ini)
                    .required(true),
            );
        } else {
            warn!(
                "Config file not found at '{}'. Using default settings.",
                path.display()
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("SUBTITLER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    /// Load configuration from INI text, without consulting the environment.
    #[cfg(test)]
    pub fn from_ini_str(contents: &str) -> BatchResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Ini))
            .build()?;
        Self::from_raw(settings.try_deserialize()?)
    }

    /// Same record with a different device (used for the runtime GPU downgrade).
    pub fn with_device(self, device: Device) -> Self {
        Self { device, ..self }
    }

    fn from_raw(raw: RawSettings) -> BatchResult<Self> {
        let RawSettings {
            transcription,
            files,
            models,
        } = raw;

        let mut aliases: HashMap<String, String> = DEFAULT_MODEL_ALIASES
            .iter()
            .map(|(alias, id)| (alias.to_string(), id.to_string()))
            .collect();
        aliases.extend(
            models
                .into_iter()
                .map(|(alias, id)| (alias.to_lowercase(), id.trim().to_string())),
        );

        let model_name = non_empty(transcription.model_name)
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        let model_identifier = aliases
            .get(&model_name.to_lowercase())
            .cloned()
            .unwrap_or(model_name);

        let device = non_empty(transcription.device)
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string())
            .parse::<Device>()
            .map_err(BatchError::Config)?;

        let language =
            non_empty(transcription.language).filter(|lang| !lang.eq_ignore_ascii_case("none"));

        let compute_type = non_empty(transcription.compute_type)
            .map(|tag| tag.to_lowercase())
            .unwrap_or_else(|| DEFAULT_COMPUTE_TYPE.to_string());

        let parallel_workers = match non_empty(transcription.parallel_workers) {
            None => default_workers(),
            Some(value) => match value.parse::<NonZeroUsize>() {
                Ok(workers) => workers,
                Err(_) => {
                    let fallback = default_workers();
                    warn!(
                        "Invalid parallel_workers value '{}', using CPU core count ({})",
                        value, fallback
                    );
                    fallback
                }
            },
        };

        let video_extensions = parse_extensions(
            non_empty(files.video_extensions)
                .as_deref()
                .unwrap_or(DEFAULT_VIDEO_EXTENSIONS),
        );
        if video_extensions.is_empty() {
            return Err(BatchError::Config(
                "video_extensions must list at least one extension".to_string(),
            ));
        }

        Ok(Self {
            model_identifier,
            device,
            compute_type,
            language,
            video_extensions,
            parallel_workers,
        })
    }
}

/// Split a comma-separated extension list into normalized `.ext` entries.
pub fn parse_extensions(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|ext| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext != ".")
        .map(|ext| {
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = Configuration::from_ini_str("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.model_identifier, "base");
        assert_eq!(config.device, Device::Gpu);
        assert_eq!(config.compute_type, "float16");
        assert_eq!(config.language, None);
        assert_eq!(config.parallel_workers.get(), num_cpus::get());
        let exts: Vec<&str> = config.video_extensions.iter().map(String::as_str).collect();
        assert_eq!(exts, vec![".avi", ".mkv", ".mov", ".mp4", ".wmv"]);
    }

    #[test]
    fn test_full_file_is_parsed() {
        let ini = "\
[TRANSCRIPTION]
model_name = small
device = cpu
language = en
compute_type = FLOAT32
parallel_workers = 3

[FILES]
video_extensions = MP4 , .WebM,.mkv
";
        let config = Configuration::from_ini_str(ini).unwrap();
        assert_eq!(config.model_identifier, "small");
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.compute_type, "float32");
        assert_eq!(config.parallel_workers.get(), 3);
        let exts: Vec<&str> = config.video_extensions.iter().map(String::as_str).collect();
        assert_eq!(exts, vec![".mkv", ".mp4", ".webm"]);
    }

    #[test]
    fn test_model_aliases() {
        let config = Configuration::from_ini_str("[TRANSCRIPTION]\nmodel_name = large-turbo\n").unwrap();
        assert_eq!(config.model_identifier, "large-v3-turbo");

        let config = Configuration::from_ini_str(
            "[TRANSCRIPTION]\nmodel_name = fast\n[MODELS]\nfast = distil-whisper/distil-small.en\n",
        )
        .unwrap();
        assert_eq!(config.model_identifier, "distil-whisper/distil-small.en");

        // Unknown names pass through untouched
        let config = Configuration::from_ini_str("[TRANSCRIPTION]\nmodel_name = large-v2\n").unwrap();
        assert_eq!(config.model_identifier, "large-v2");
    }

    #[test]
    fn test_language_none_means_auto_detect() {
        for value in ["None", "none", "NONE", ""] {
            let ini = format!("[TRANSCRIPTION]\nlanguage = {}\n", value);
            assert_eq!(Configuration::from_ini_str(&ini).unwrap().language, None);
        }
    }

    #[test]
    fn test_invalid_parallel_workers_falls_back_to_cpu_count() {
        for value in ["lots", "0", "-2"] {
            let ini = format!("[TRANSCRIPTION]\nparallel_workers = {}\n", value);
            let config = Configuration::from_ini_str(&ini).unwrap();
            assert_eq!(config.parallel_workers.get(), num_cpus::get());
        }
    }

    #[test]
    fn test_unknown_device_is_a_config_error() {
        let err = Configuration::from_ini_str("[TRANSCRIPTION]\ndevice = abacus\n").unwrap_err();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Configuration::load(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.model_identifier, "base");
    }

    #[test]
    fn test_load_reads_ini_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ini");
        std::fs::write(&path, "[TRANSCRIPTION]\nmodel_name = tiny\n").unwrap();
        let config = Configuration::load(&path).unwrap();
        assert_eq!(config.model_identifier, "tiny");
    }

    #[test]
    fn test_parse_extensions_normalizes() {
        let exts = parse_extensions(" .MP4, avi ,, . , .mp4");
        let exts: Vec<&str> = exts.iter().map(String::as_str).collect();
        assert_eq!(exts, vec![".avi", ".mp4"]);
    }
}
