//! Remote service clients
//!
//! The pipeline consumes three external collaborators: a translation
//! service, a text-to-speech service, and a speech-recognition service.
//! Each is a trait seam with a reqwest-backed implementation; the
//! orchestrators depend on the traits so tests can inject stubs.

mod recognize;
mod translate;
mod tts;

pub use recognize::HttpRecognizer;
pub use translate::{HttpTranslator, Translator};
pub use tts::{HttpSpeechService, SavedAudio, Synthesizer};

use crate::Result;

/// Translates one size-limited text chunk into a target language
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    /// Translate `text` into the language identified by `target`.
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails.
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Renders one size-limited text chunk as an audio payload
#[async_trait::async_trait]
pub trait SpeechService: Send + Sync {
    /// Synthesize `text` spoken in the language identified by `lang`.
    ///
    /// Returns the audio bytes (MP3 format).
    ///
    /// # Errors
    ///
    /// Returns error if the service call fails or yields no audio.
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>>;
}

/// Resolves captured audio to text
#[async_trait::async_trait]
pub trait RecognitionService: Send + Sync {
    /// Transcribe WAV-encoded audio, hinted with a locale.
    ///
    /// Returns `None` when the service cannot produce a transcription —
    /// a defined outcome, distinct from a transport failure.
    ///
    /// # Errors
    ///
    /// Returns error if the service call itself fails.
    async fn transcribe(&self, wav: &[u8], locale: &str) -> Result<Option<String>>;
}
