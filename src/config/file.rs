//! TOML configuration file loading
//!
//! Supports `~/.config/voxlate/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of
//! defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct VoxlateConfigFile {
    /// Default target language name (e.g. "french")
    #[serde(default)]
    pub target_language: Option<String>,

    /// Remote service endpoints
    #[serde(default)]
    pub services: ServicesFileConfig,

    /// Chunk size limits
    #[serde(default)]
    pub chunking: ChunkingFileConfig,

    /// TTS retry behavior
    #[serde(default)]
    pub retry: RetryFileConfig,

    /// Voice capture bounds
    #[serde(default)]
    pub capture: CaptureFileConfig,
}

/// Remote service endpoint configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServicesFileConfig {
    /// Translation service base URL
    pub translate_url: Option<String>,

    /// Text-to-speech service base URL
    pub tts_url: Option<String>,

    /// Speech recognition service base URL
    pub recognize_url: Option<String>,
}

/// Chunk size configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChunkingFileConfig {
    /// Max chars per translation request
    pub translate_max_chars: Option<usize>,

    /// Max chars per TTS request
    pub tts_max_chars: Option<usize>,
}

/// TTS retry configuration
#[derive(Debug, Default, Deserialize)]
pub struct RetryFileConfig {
    /// Attempt budget per chunk
    pub max_attempts: Option<u32>,

    /// Base backoff in milliseconds (linear per attempt)
    pub backoff_ms: Option<u64>,
}

/// Voice capture configuration
#[derive(Debug, Default, Deserialize)]
pub struct CaptureFileConfig {
    /// Max seconds to wait for speech to begin
    pub timeout_secs: Option<u64>,

    /// Max utterance length in seconds
    pub phrase_limit_secs: Option<u64>,

    /// Locale hint for recognition (e.g. "en-in")
    pub locale: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `VoxlateConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file() -> VoxlateConfigFile {
    let Some(path) = config_file_path() else {
        return VoxlateConfigFile::default();
    };

    if !path.exists() {
        return VoxlateConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                VoxlateConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            VoxlateConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voxlate/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voxlate").join("config.toml"))
}
