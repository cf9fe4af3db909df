//! Speech recognition service client

use crate::services::RecognitionService;
use crate::{Error, Result};

/// Response from the recognition API
#[derive(serde::Deserialize)]
struct RecognizeResponse {
    text: String,
}

/// HTTP speech recognition client
///
/// Uploads captured WAV audio and returns the best-guess transcription.
pub struct HttpRecognizer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRecognizer {
    /// Create a client against a recognition endpoint base URL
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl RecognitionService for HttpRecognizer {
    async fn transcribe(&self, wav: &[u8], locale: &str) -> Result<Option<String>> {
        tracing::debug!(audio_bytes = wav.len(), locale, "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav.to_vec())
                    .file_name("utterance.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Recognize(e.to_string()))?,
            )
            .text("language", locale.to_string());

        let url = format!("{}/recognize", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Recognize(format!(
                "recognition API error {status}: {body}"
            )));
        }

        let result: RecognizeResponse = response.json().await?;
        let text = result.text.trim();

        // An empty transcript means the service could not understand the
        // audio — a defined outcome, not an error
        if text.is_empty() {
            return Ok(None);
        }

        tracing::debug!(transcript = %text, "transcription complete");
        Ok(Some(text.to_string()))
    }
}
