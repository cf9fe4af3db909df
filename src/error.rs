//! Error types for voxlate

use thiserror::Error;

/// Result type alias for voxlate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the voxlate pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown language name or code
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// Translation service error
    #[error("translation error: {0}")]
    Translate(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognize(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
