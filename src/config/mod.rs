//! Configuration management for voxlate
//!
//! Layered resolution: environment variables (`VOXLATE_*`) override the
//! TOML config file, which overrides built-in defaults.

pub mod file;

use std::time::Duration;

use crate::audio::CaptureOptions;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// Default translation service endpoint
const DEFAULT_TRANSLATE_URL: &str = "http://localhost:5000";

/// Default TTS service endpoint
const DEFAULT_TTS_URL: &str = "http://localhost:5002";

/// Default recognition service endpoint
const DEFAULT_RECOGNIZE_URL: &str = "http://localhost:5003";

/// voxlate configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Default target language name when none is given on the CLI
    pub target_language: String,

    /// Remote service endpoints
    pub services: ServicesConfig,

    /// Chunk size limits for the two size-constrained services
    pub chunking: ChunkingConfig,

    /// Retry policy for TTS calls
    pub retry: RetryPolicy,

    /// Voice capture bounds and recognition locale
    pub capture: CaptureConfig,
}

/// Remote service endpoints
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// Translation service base URL
    pub translate_url: String,

    /// Text-to-speech service base URL
    pub tts_url: String,

    /// Speech recognition service base URL
    pub recognize_url: String,
}

/// Chunk size limits
///
/// TTS services are stricter than translation services, so the TTS limit
/// is the smaller of the two.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Max chars per translation request
    pub translate_max_chars: usize,

    /// Max chars per TTS request
    pub tts_max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            translate_max_chars: 4500,
            tts_max_chars: 900,
        }
    }
}

/// Voice capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture bounds (wait-for-speech timeout, phrase limit, calibration)
    pub options: CaptureOptions,

    /// Locale hint passed to the recognition service
    pub locale: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            options: CaptureOptions::default(),
            locale: "en-in".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: env > TOML file > defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a resolved value is invalid (zero chunk size or
    /// an unknown default language).
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let target_language = env_var("VOXLATE_TARGET_LANG")
            .or(fc.target_language)
            .unwrap_or_else(|| "english".to_string());
        if crate::lang::code_for(&target_language).is_none() {
            return Err(Error::UnknownLanguage(target_language));
        }

        let services = ServicesConfig {
            translate_url: env_var("VOXLATE_TRANSLATE_URL")
                .or(fc.services.translate_url)
                .unwrap_or_else(|| DEFAULT_TRANSLATE_URL.to_string()),
            tts_url: env_var("VOXLATE_TTS_URL")
                .or(fc.services.tts_url)
                .unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
            recognize_url: env_var("VOXLATE_RECOGNIZE_URL")
                .or(fc.services.recognize_url)
                .unwrap_or_else(|| DEFAULT_RECOGNIZE_URL.to_string()),
        };

        let chunking_default = ChunkingConfig::default();
        let chunking = ChunkingConfig {
            translate_max_chars: env_parse("VOXLATE_TRANSLATE_MAX_CHARS")
                .or(fc.chunking.translate_max_chars)
                .unwrap_or(chunking_default.translate_max_chars),
            tts_max_chars: env_parse("VOXLATE_TTS_MAX_CHARS")
                .or(fc.chunking.tts_max_chars)
                .unwrap_or(chunking_default.tts_max_chars),
        };
        if chunking.translate_max_chars == 0 || chunking.tts_max_chars == 0 {
            return Err(Error::Config("chunk sizes must be nonzero".to_string()));
        }

        let retry_default = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_parse("VOXLATE_TTS_RETRIES")
                .or(fc.retry.max_attempts)
                .unwrap_or(retry_default.max_attempts),
            backoff: env_parse("VOXLATE_TTS_BACKOFF_MS")
                .or(fc.retry.backoff_ms)
                .map_or(retry_default.backoff, Duration::from_millis),
        };

        let capture_default = CaptureConfig::default();
        let capture = CaptureConfig {
            options: CaptureOptions {
                timeout: env_parse("VOXLATE_CAPTURE_TIMEOUT_SECS")
                    .or(fc.capture.timeout_secs)
                    .map_or(capture_default.options.timeout, Duration::from_secs),
                phrase_limit: env_parse("VOXLATE_PHRASE_LIMIT_SECS")
                    .or(fc.capture.phrase_limit_secs)
                    .map_or(capture_default.options.phrase_limit, Duration::from_secs),
                calibration: capture_default.options.calibration,
            },
            locale: env_var("VOXLATE_LOCALE")
                .or(fc.capture.locale)
                .unwrap_or(capture_default.locale),
        };

        Ok(Self {
            target_language,
            services,
            chunking,
            retry,
            capture,
        })
    }
}

/// Read a non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, ignoring unparsable values
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|v| v.parse().ok())
}
