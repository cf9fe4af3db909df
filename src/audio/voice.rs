//! Voice input: microphone capture resolved through recognition

use std::sync::Arc;

use crate::audio::{CaptureOptions, Microphone, SAMPLE_RATE, samples_to_wav};
use crate::services::RecognitionService;

/// Captures one spoken utterance and resolves it to text.
///
/// Every failure mode — no speech within the timeout, an unrecognized
/// utterance, a microphone fault, a recognition transport error — is
/// logged and collapsed to `None`; the caller only distinguishes "got
/// text" from "got nothing".
pub struct VoiceInput {
    recognizer: Arc<dyn RecognitionService>,
    locale: String,
    options: CaptureOptions,
}

impl VoiceInput {
    /// Create a voice input with the given recognition locale hint
    #[must_use]
    pub fn new(recognizer: Arc<dyn RecognitionService>, locale: String) -> Self {
        Self {
            recognizer,
            locale,
            options: CaptureOptions::default(),
        }
    }

    /// Override the capture bounds
    #[must_use]
    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// Capture one utterance and transcribe it.
    ///
    /// Recording runs on a blocking worker so the caller's task never
    /// waits on audio hardware directly.
    pub async fn capture_utterance(&self) -> Option<String> {
        let opts = self.options.clone();
        let recorded = tokio::task::spawn_blocking(move || {
            let mic = Microphone::new()?;
            mic.record_utterance(&opts)
        })
        .await;

        let samples = match recorded {
            Ok(Ok(Some(samples))) if !samples.is_empty() => samples,
            Ok(Ok(_)) => {
                tracing::info!("no speech detected within the capture window");
                return None;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "microphone error during capture");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "capture task failed");
                return None;
            }
        };

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode captured audio");
                return None;
            }
        };

        // A transport failure is treated the same as "not understood"
        match self.recognizer.transcribe(&wav, &self.locale).await {
            Ok(Some(text)) => {
                tracing::info!(transcript = %text, "utterance recognized");
                Some(text)
            }
            Ok(None) => {
                tracing::info!("utterance not recognized");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, locale = %self.locale, "recognition failed");
                None
            }
        }
    }
}
