//! # Whisper Model Management
//!
//! Loads Whisper checkpoints with Candle-rs and decodes 16kHz PCM into
//! timestamped segments.
//!
//! ## Model Loading Process:
//! 1. Resolve the model identifier to a HuggingFace repository
//! 2. Download `config.json`, `tokenizer.json` and `model.safetensors` (cached locally)
//! 3. Build the mel filter bank for the model's mel bin count
//! 4. Memory-map the weights onto the worker's device at the requested precision
//!
//! ## Decoding:
//! Audio is processed in 30 second mel windows. Each window is decoded
//! greedily with timestamp tokens enabled; consecutive timestamp tokens
//! delimit segments, and their offsets are shifted by the window position.

use crate::device::{Device, DeviceManager};
use crate::transcription::{ModelKey, TranscriptSegment, TranscriptionResult};
use anyhow::{anyhow, Context, Result};
use candle_core::{DType, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::whisper::{self as m, audio, Config};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

/// Seconds represented by one timestamp token step
const TIMESTAMP_RESOLUTION: f64 = 0.02;

/// Latest allowed first timestamp, in timestamp steps (1.0s)
const MAX_INITIAL_TIMESTAMP_STEPS: usize = 50;

/// Mel frames per second of audio (16000 / HOP_LENGTH)
const FRAMES_PER_SECOND: f64 = (m::SAMPLE_RATE / m::HOP_LENGTH) as f64;

/// Whisper language tokens as (code, English name)
const LANGUAGES: &[(&str, &str)] = &[
    ("en", "english"), ("zh", "chinese"), ("de", "german"), ("es", "spanish"),
    ("ru", "russian"), ("ko", "korean"), ("fr", "french"), ("ja", "japanese"),
    ("pt", "portuguese"), ("tr", "turkish"), ("pl", "polish"), ("ca", "catalan"),
    ("nl", "dutch"), ("ar", "arabic"), ("sv", "swedish"), ("it", "italian"),
    ("id", "indonesian"), ("hi", "hindi"), ("fi", "finnish"), ("vi", "vietnamese"),
    ("he", "hebrew"), ("uk", "ukrainian"), ("el", "greek"), ("ms", "malay"),
    ("cs", "czech"), ("ro", "romanian"), ("da", "danish"), ("hu", "hungarian"),
    ("ta", "tamil"), ("no", "norwegian"), ("th", "thai"), ("ur", "urdu"),
    ("hr", "croatian"), ("bg", "bulgarian"), ("lt", "lithuanian"), ("la", "latin"),
    ("mi", "maori"), ("ml", "malayalam"), ("cy", "welsh"), ("sk", "slovak"),
    ("te", "telugu"), ("fa", "persian"), ("lv", "latvian"), ("bn", "bengali"),
    ("sr", "serbian"), ("az", "azerbaijani"), ("sl", "slovenian"), ("kn", "kannada"),
    ("et", "estonian"), ("mk", "macedonian"), ("br", "breton"), ("eu", "basque"),
    ("is", "icelandic"), ("hy", "armenian"), ("ne", "nepali"), ("mn", "mongolian"),
    ("bs", "bosnian"), ("kk", "kazakh"), ("sq", "albanian"), ("sw", "swahili"),
    ("gl", "galician"), ("mr", "marathi"), ("pa", "punjabi"), ("si", "sinhala"),
    ("km", "khmer"), ("sn", "shona"), ("yo", "yoruba"), ("so", "somali"),
    ("af", "afrikaans"), ("oc", "occitan"), ("ka", "georgian"), ("be", "belarusian"),
    ("tg", "tajik"), ("sd", "sindhi"), ("gu", "gujarati"), ("am", "amharic"),
    ("yi", "yiddish"), ("lo", "lao"), ("uz", "uzbek"), ("fo", "faroese"),
    ("ht", "haitian creole"), ("ps", "pashto"), ("tk", "turkmen"), ("nn", "nynorsk"),
    ("mt", "maltese"), ("sa", "sanskrit"), ("lb", "luxembourgish"), ("my", "myanmar"),
    ("bo", "tibetan"), ("tl", "tagalog"), ("mg", "malagasy"), ("as", "assamese"),
    ("tt", "tatar"), ("haw", "hawaiian"), ("ln", "lingala"), ("ha", "hausa"),
    ("ba", "bashkir"), ("jw", "javanese"), ("su", "sundanese"), ("yue", "cantonese"),
];

/// HuggingFace repository holding the weights for a model identifier.
///
/// Bare names ("base", "large-v3-turbo") map to the OpenAI checkpoints; an
/// identifier containing `/` is already a repository id.
pub fn repo_id(model_identifier: &str) -> String {
    if model_identifier.contains('/') {
        model_identifier.to_string()
    } else {
        format!("openai/whisper-{}", model_identifier)
    }
}

/// Weight precision for a compute type tag on a given device.
///
/// Half precision on CPU is downgraded to f32, which candle's CPU kernels
/// handle far better.
pub fn compute_dtype(compute_type: &str, device: Device) -> Result<DType> {
    let dtype = match compute_type {
        "float32" | "f32" => DType::F32,
        "float16" | "f16" => DType::F16,
        "bfloat16" | "bf16" => DType::BF16,
        other => return Err(anyhow!("Unsupported compute type: {}", other)),
    };

    if device == Device::Cpu && dtype != DType::F32 {
        warn!("Compute type '{}' is not efficient on CPU, using float32", compute_type);
        return Ok(DType::F32);
    }
    Ok(dtype)
}

/// Slaney-style mel filter bank, row-major `(n_mels, n_fft / 2 + 1)`.
///
/// Matches the filters the Whisper checkpoints were trained with
/// (librosa defaults: fmin 0, fmax sr/2, Slaney mel scale and normalization).
pub fn mel_filter_bank(n_mels: usize, n_fft: usize, sample_rate: usize) -> Vec<f32> {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;
    let log_step = 6.4f64.ln() / 27.0;

    let hz_to_mel = |hz: f64| {
        if hz >= MIN_LOG_HZ {
            MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step
        } else {
            hz / F_SP
        }
    };
    let mel_to_hz = |mel: f64| {
        if mel >= MIN_LOG_MEL {
            MIN_LOG_HZ * (log_step * (mel - MIN_LOG_MEL)).exp()
        } else {
            F_SP * mel
        }
    };

    let n_freqs = n_fft / 2 + 1;
    let fft_freqs: Vec<f64> = (0..n_freqs)
        .map(|i| i as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let mel_max = hz_to_mel(sample_rate as f64 / 2.0);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut filters = vec![0.0f32; n_mels * n_freqs];
    for i in 0..n_mels {
        let (lower, center, upper) = (mel_points[i], mel_points[i + 1], mel_points[i + 2]);
        let norm = 2.0 / (upper - lower);
        for (j, &freq) in fft_freqs.iter().enumerate() {
            let rising = (freq - lower) / (center - lower);
            let falling = (upper - freq) / (upper - center);
            let weight = rising.min(falling).max(0.0);
            filters[i * n_freqs + j] = (weight * norm) as f32;
        }
    }
    filters
}

/// Token ids the decoder needs, looked up once from the tokenizer.
#[derive(Debug, Clone)]
struct SpecialTokens {
    sot: u32,
    eot: u32,
    transcribe: u32,
    no_timestamps: u32,
    /// First timestamp token (`<|0.00|>`)
    timestamp_begin: u32,
    /// Language tokens present in this tokenizer; empty for English-only models
    languages: Vec<(&'static str, u32)>,
}

impl SpecialTokens {
    fn from_tokenizer(tokenizer: &Tokenizer) -> Result<Self> {
        let token = |name: &str| {
            tokenizer
                .token_to_id(name)
                .ok_or_else(|| anyhow!("tokenizer has no {} token", name))
        };
        let no_timestamps = token(m::NO_TIMESTAMPS_TOKEN)?;
        let languages = LANGUAGES
            .iter()
            .filter_map(|(code, _)| {
                tokenizer
                    .token_to_id(&format!("<|{}|>", code))
                    .map(|id| (*code, id))
            })
            .collect();

        Ok(Self {
            sot: token(m::SOT_TOKEN)?,
            eot: token(m::EOT_TOKEN)?,
            transcribe: token(m::TRANSCRIBE_TOKEN)?,
            no_timestamps,
            timestamp_begin: no_timestamps + 1,
            languages,
        })
    }

    fn is_multilingual(&self) -> bool {
        !self.languages.is_empty()
    }

    /// Resolve a configured language (code or English name) to its token.
    fn language(&self, requested: &str) -> Option<(&'static str, u32)> {
        let requested = requested.trim().to_lowercase();
        let code = LANGUAGES
            .iter()
            .find(|(code, name)| *code == requested || *name == requested)
            .map(|(code, _)| *code)?;
        self.languages.iter().copied().find(|(c, _)| *c == code)
    }
}

/// A loaded Whisper model ready for transcription.
///
/// Owned by exactly one worker; decoding mutates the decoder's kv cache.
pub struct WhisperModel {
    model: m::model::Whisper,
    config: Config,
    tokenizer: Tokenizer,
    tokens: SpecialTokens,
    mel_filters: Vec<f32>,
    device: candle_core::Device,
    dtype: DType,
}

impl WhisperModel {
    /// Download (if needed) and load the model described by `key`.
    pub fn load(key: &ModelKey) -> Result<Self> {
        let repo_name = repo_id(&key.model_identifier);
        let dtype = compute_dtype(&key.compute_type, key.device)?;
        let device = DeviceManager::open(key.device)?;

        let api = {
            use hf_hub::api::sync::ApiBuilder;

            let mut builder = ApiBuilder::new().with_progress(false);
            if let Ok(token) = std::env::var("HF_TOKEN") {
                builder = builder.with_token(Some(token));
            }
            if let Ok(cache_dir) = std::env::var("HF_HUB_CACHE") {
                builder = builder.with_cache_dir(cache_dir.into());
            } else if let Ok(hf_home) = std::env::var("HF_HOME") {
                builder = builder.with_cache_dir(std::path::PathBuf::from(hf_home).join("hub"));
            }
            builder.build().context("failed to create HuggingFace API client")?
        };

        info!("Fetching model files from {}", repo_name);
        let repo = api.model(repo_name.clone());
        let config_file = repo
            .get("config.json")
            .with_context(|| format!("failed to download config.json from {}", repo_name))?;
        let tokenizer_file = repo
            .get("tokenizer.json")
            .with_context(|| format!("failed to download tokenizer.json from {}", repo_name))?;
        let weights_file = repo
            .get("model.safetensors")
            .with_context(|| format!("failed to download model.safetensors from {}", repo_name))?;

        let config: Config = serde_json::from_reader(
            std::fs::File::open(&config_file)
                .with_context(|| format!("failed to open {}", config_file.display()))?,
        )
        .context("invalid model config.json")?;
        debug!("Model config: {:?}", config);

        let tokenizer = Tokenizer::from_file(&tokenizer_file)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        let tokens = SpecialTokens::from_tokenizer(&tokenizer)?;

        let mel_filters = mel_filter_bank(config.num_mel_bins, m::N_FFT, m::SAMPLE_RATE);

        // SAFETY: the weights file is owned by the hub cache and not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_file], dtype, &device)? };
        let model = m::model::Whisper::load(&vb, config.clone())?;

        Ok(Self {
            model,
            config,
            tokenizer,
            tokens,
            mel_filters,
            device,
            dtype,
        })
    }

    /// Transcribe 16kHz mono PCM into timestamped segments.
    ///
    /// ## Parameters:
    /// - **pcm**: samples in [-1.0, 1.0]
    /// - **language**: forced language (code like "en" or name like "english"); `None` detects it
    pub fn transcribe_pcm(&mut self, pcm: &[f32], language: Option<&str>) -> Result<TranscriptionResult> {
        if pcm.is_empty() {
            return Ok(TranscriptionResult::default());
        }

        let mel = audio::pcm_to_mel(&self.config, pcm, &self.mel_filters);
        let n_mels = self.config.num_mel_bins;
        let mel_len = mel.len();
        let mel = Tensor::from_vec(mel, (1, n_mels, mel_len / n_mels), &self.device)?.to_dtype(self.dtype)?;

        // Decode only real audio, not the zero padding pcm_to_mel appends
        let content_frames = (pcm.len() / m::HOP_LENGTH).min(mel.dims3()?.2);
        if content_frames == 0 {
            return Ok(TranscriptionResult::default());
        }

        let language_token = self.language_token(&mel, content_frames, language)?;
        let detected_language = language_token.map(|(code, _)| code.to_string());

        let mut prompt = vec![self.tokens.sot];
        if let Some((_, token)) = language_token {
            prompt.push(token);
        }
        prompt.push(self.tokens.transcribe);

        let mut segments = Vec::new();
        let mut seek = 0;
        while seek < content_frames {
            let segment_size = (content_frames - seek).min(m::N_FRAMES);
            let window = mel.narrow(2, seek, segment_size)?;
            let offset = seek as f64 / FRAMES_PER_SECOND;
            let window_seconds = segment_size as f64 / FRAMES_PER_SECOND;

            let output = self.decode_window(&window, &prompt)?;
            let (window_segments, consumed) = split_segments(
                &output,
                self.tokens.timestamp_begin,
                self.tokens.eot,
                offset,
                window_seconds,
                |tokens| self.decode_text(tokens),
            )?;
            debug!(
                "Window at {:.2}s produced {} segment(s)",
                offset,
                window_segments.len()
            );
            segments.extend(window_segments);

            // Resume after the last closed segment when the window ended mid-sentence
            let advance = consumed
                .map(|seconds| (seconds * FRAMES_PER_SECOND) as usize)
                .filter(|frames| *frames > 0)
                .unwrap_or(segment_size);
            seek += advance.min(segment_size);
        }

        Ok(TranscriptionResult {
            segments,
            detected_language,
        })
    }

    /// Forced language token, or the most likely one for the first window.
    fn language_token(
        &mut self,
        mel: &Tensor,
        content_frames: usize,
        requested: Option<&str>,
    ) -> Result<Option<(&'static str, u32)>> {
        if !self.tokens.is_multilingual() {
            if let Some(lang) = requested {
                let english = lang.eq_ignore_ascii_case("en") || lang.eq_ignore_ascii_case("english");
                if !english {
                    warn!("English-only model ignores requested language '{}'", lang);
                }
            }
            return Ok(None);
        }

        if let Some(lang) = requested {
            return self
                .tokens
                .language(lang)
                .map(Some)
                .ok_or_else(|| anyhow!("Unsupported language: {}", lang));
        }

        let window = mel.narrow(2, 0, content_frames.min(m::N_FRAMES))?;
        let audio_features = self.model.encoder.forward(&window, true)?;
        let sot = Tensor::new(&[[self.tokens.sot]], &self.device)?;
        let ys = self.model.decoder.forward(&sot, &audio_features, true)?;
        let logits = self.logits_at_last(&ys)?;

        let detected = self
            .tokens
            .languages
            .iter()
            .copied()
            .max_by(|a, b| logits[a.1 as usize].total_cmp(&logits[b.1 as usize]));
        if let Some((code, _)) = detected {
            info!("Detected language: {}", code);
        }
        Ok(detected)
    }

    /// Greedy decoding of one mel window with timestamp rules applied.
    fn decode_window(&mut self, window: &Tensor, prompt: &[u32]) -> Result<Vec<u32>> {
        let audio_features = self.model.encoder.forward(window, true)?;
        let sample_len = self.config.max_target_positions / 2;
        let mut tokens = prompt.to_vec();
        let mut output = Vec::new();

        for step in 0..sample_len {
            let tokens_t = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
            let ys = self.model.decoder.forward(&tokens_t, &audio_features, step == 0)?;
            let mut logits = self.logits_at_last(&ys)?;
            self.apply_timestamp_rules(&mut logits, &output);

            let next = argmax(&logits);
            if next == self.tokens.eot || tokens.len() >= self.config.max_target_positions {
                break;
            }
            tokens.push(next);
            output.push(next);
        }
        Ok(output)
    }

    fn logits_at_last(&self, ys: &Tensor) -> Result<Vec<f32>> {
        let (_, seq_len, _) = ys.dims3()?;
        let logits = self
            .model
            .decoder
            .final_linear(&ys.i((..1, seq_len - 1..))?)?
            .i(0)?
            .i(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;
        Ok(logits)
    }

    /// Constrain logits so timestamps come in increasing pairs around text.
    fn apply_timestamp_rules(&self, logits: &mut [f32], output: &[u32]) {
        let ts_begin = self.tokens.timestamp_begin as usize;
        let eot = self.tokens.eot as usize;
        let vocab = logits.len();
        let suppress = |logits: &mut [f32], range: std::ops::Range<usize>| {
            for logit in &mut logits[range.start.min(vocab)..range.end.min(vocab)] {
                *logit = f32::NEG_INFINITY;
            }
        };

        for &token in &self.config.suppress_tokens {
            if let Some(logit) = logits.get_mut(token as usize) {
                *logit = f32::NEG_INFINITY;
            }
        }
        suppress(logits, self.tokens.no_timestamps as usize..self.tokens.no_timestamps as usize + 1);
        // Special tokens between EOT and the timestamps are never content
        suppress(logits, eot + 1..ts_begin);

        let is_ts = |t: &u32| *t >= self.tokens.timestamp_begin;
        let last_was_ts = output.last().map_or(false, is_ts);
        let penultimate_was_ts = output.len() < 2 || output.get(output.len() - 2).map_or(false, is_ts);

        if output.is_empty() {
            // Every window opens with a timestamp, no later than one second in
            suppress(logits, 0..ts_begin);
            suppress(logits, ts_begin + MAX_INITIAL_TIMESTAMP_STEPS + 1..vocab);
            return;
        }
        if last_was_ts {
            if penultimate_was_ts {
                suppress(logits, ts_begin..vocab);
            } else {
                suppress(logits, 0..eot);
            }
        }

        // Timestamps never go backwards
        if let Some(&last_ts) = output.iter().rev().find(|t| **t >= self.tokens.timestamp_begin) {
            let floor = if last_was_ts && !penultimate_was_ts { last_ts } else { last_ts + 1 };
            suppress(logits, ts_begin..floor as usize);
        }

        // Prefer a timestamp when timestamps are collectively more likely than any text token
        let text_max = logits[..ts_begin.min(vocab)]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let ts_logsumexp = log_sum_exp(&logits[ts_begin.min(vocab)..]);
        if ts_logsumexp > text_max {
            suppress(logits, 0..ts_begin);
        }
    }

    fn decode_text(&self, tokens: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| anyhow!("Tokenizer decode error: {}", e))
    }
}

/// Cut decoded window tokens into segments.
///
/// Returns the segments (absolute times) and, when the window ended with an
/// unclosed segment, the window-relative time of the last closed timestamp
/// so the next window can resume there.
fn split_segments<F>(
    output: &[u32],
    timestamp_begin: u32,
    eot: u32,
    offset: f64,
    window_seconds: f64,
    decode: F,
) -> Result<(Vec<TranscriptSegment>, Option<f64>)>
where
    F: Fn(&[u32]) -> Result<String>,
{
    let segment = |start: f64, end: f64, tokens: &[u32]| -> Result<TranscriptSegment> {
        Ok(TranscriptSegment {
            start: offset + start,
            end: offset + end.max(start),
            text: decode(tokens)?.trim().to_string(),
        })
    };

    let mut segments = Vec::new();
    let mut open: Option<f64> = None;
    let mut text_tokens: Vec<u32> = Vec::new();
    let mut last_closed: Option<f64> = None;

    for &token in output {
        if token >= timestamp_begin {
            let time = (token - timestamp_begin) as f64 * TIMESTAMP_RESOLUTION;
            match open.take() {
                None => open = Some(time),
                Some(start) => {
                    if !text_tokens.is_empty() {
                        segments.push(segment(start, time, &text_tokens)?);
                    }
                    text_tokens.clear();
                    last_closed = Some(time);
                }
            }
        } else if token < eot {
            text_tokens.push(token);
        }
    }

    if let Some(start) = open {
        if !text_tokens.is_empty() {
            match last_closed {
                // Leave the unfinished sentence for the next window
                Some(end) if end > 0.0 && end < window_seconds => return Ok((segments, Some(end))),
                _ => segments.push(segment(start, window_seconds, &text_tokens)?),
            }
        }
    }
    Ok((segments, None))
}

fn argmax(values: &[f32]) -> u32 {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i as u32)
        .unwrap_or(0)
}

fn log_sum_exp(values: &[f32]) -> f32 {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f32>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id() {
        assert_eq!(repo_id("base"), "openai/whisper-base");
        assert_eq!(repo_id("large-v3-turbo"), "openai/whisper-large-v3-turbo");
        assert_eq!(repo_id("distil-whisper/distil-small.en"), "distil-whisper/distil-small.en");
    }

    #[test]
    fn test_compute_dtype() {
        assert_eq!(compute_dtype("float16", Device::Gpu).unwrap(), DType::F16);
        assert_eq!(compute_dtype("bfloat16", Device::Gpu).unwrap(), DType::BF16);
        assert_eq!(compute_dtype("float16", Device::Cpu).unwrap(), DType::F32);
        assert_eq!(compute_dtype("float32", Device::Cpu).unwrap(), DType::F32);
        assert!(compute_dtype("int4", Device::Gpu).is_err());
    }

    #[test]
    fn test_mel_filter_bank_shape() {
        let filters = mel_filter_bank(80, m::N_FFT, m::SAMPLE_RATE);
        let n_freqs = m::N_FFT / 2 + 1;
        assert_eq!(filters.len(), 80 * n_freqs);
        assert!(filters.iter().all(|w| *w >= 0.0));
        // Every filter covers at least one frequency bin
        for row in filters.chunks(n_freqs) {
            assert!(row.iter().any(|w| *w > 0.0));
        }
    }

    const EOT: u32 = 50257;
    const TS: u32 = 50364;

    fn words(tokens: &[u32]) -> Result<String> {
        Ok(tokens.iter().map(|t| format!(" w{}", t)).collect())
    }

    #[test]
    fn test_split_segments_on_timestamp_pairs() {
        // <|0.00|> 1 2 <|1.50|><|1.50|> 3 <|2.00|>
        let output = [TS, 1, 2, TS + 75, TS + 75, 3, TS + 100];
        let (segments, resume) = split_segments(&output, TS, EOT, 30.0, 30.0, words).unwrap();

        assert_eq!(resume, None);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "w1 w2");
        assert!((segments[0].start - 30.0).abs() < 1e-9);
        assert!((segments[0].end - 31.5).abs() < 1e-9);
        assert!((segments[1].start - 31.5).abs() < 1e-9);
        assert!((segments[1].end - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_unfinished_segment_resumes_next_window() {
        let output = [TS, 1, TS + 250, TS + 250, 2, 3];
        let (segments, resume) = split_segments(&output, TS, EOT, 0.0, 30.0, words).unwrap();

        assert_eq!(segments.len(), 1);
        assert!((resume.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_unfinished_only_segment_runs_to_window_end() {
        let output = [TS + 10, 4, 5];
        let (segments, resume) = split_segments(&output, TS, EOT, 0.0, 12.5, words).unwrap();

        assert_eq!(resume, None);
        assert_eq!(segments.len(), 1);
        assert!((segments[0].start - 0.2).abs() < 1e-9);
        assert!((segments[0].end - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_argmax_and_log_sum_exp() {
        assert_eq!(argmax(&[0.1, 2.0, -1.0]), 1);
        assert!((log_sum_exp(&[0.0, 0.0]) - 2.0f32.ln()).abs() < 1e-6);
        assert_eq!(log_sum_exp(&[f32::NEG_INFINITY]), f32::NEG_INFINITY);
    }
}
