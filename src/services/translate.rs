//! Translation service client and chunked orchestration

use std::sync::Arc;

use crate::services::TranslationService;
use crate::{Error, Result, chunk};

/// Response from the translation API
#[derive(serde::Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// HTTP translation client
pub struct HttpTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranslator {
    /// Create a client against a translation endpoint base URL
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl TranslationService for HttpTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        #[derive(serde::Serialize)]
        struct TranslateRequest<'a> {
            q: &'a str,
            source: &'a str,
            target: &'a str,
        }

        let request = TranslateRequest {
            q: text,
            source: "auto",
            target,
        };

        let url = format!("{}/translate", self.base_url.trim_end_matches('/'));
        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Translate(format!(
                "translation API error {status}: {body}"
            )));
        }

        let result: TranslateResponse = response.json().await?;
        Ok(result.translated_text)
    }
}

/// Chunked translation orchestrator
///
/// Splits text to the service's safe size, translates each chunk
/// independently, and joins the results. A failed chunk contributes an
/// empty string rather than aborting the whole translation.
pub struct Translator {
    service: Arc<dyn TranslationService>,
    max_chunk_chars: usize,
}

impl Translator {
    /// Default chunk limit for translation requests
    pub const DEFAULT_MAX_CHARS: usize = 4500;

    /// Create an orchestrator with the default chunk limit
    #[must_use]
    pub fn new(service: Arc<dyn TranslationService>) -> Self {
        Self {
            service,
            max_chunk_chars: Self::DEFAULT_MAX_CHARS,
        }
    }

    /// Override the per-chunk size limit
    #[must_use]
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Translate `text` into `target`, chunking as needed.
    ///
    /// Empty input translates to an empty string. When the input is
    /// nonempty and every chunk fails, the translation is unavailable and
    /// an error is returned — callers must not mistake it for a valid
    /// empty translation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Translate`] when all chunks of a nonempty input
    /// failed.
    pub async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let chunks = chunk::chunk_text(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Ok(String::new());
        }

        let total = chunks.len();
        let mut parts: Vec<String> = Vec::with_capacity(total);
        let mut failed = 0usize;

        for (idx, chunk) in chunks.iter().enumerate() {
            tracing::debug!(chunk = idx + 1, total, target, "translating chunk");
            match self.service.translate(chunk, target).await {
                Ok(translated) => parts.push(translated),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        chunk = idx + 1,
                        total,
                        target,
                        error = %e,
                        "chunk translation failed, substituting empty string"
                    );
                    parts.push(String::new());
                }
            }
        }

        if failed == total {
            return Err(Error::Translate(format!(
                "all {total} chunks failed for target {target}"
            )));
        }

        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(joined.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stub that uppercases its input, failing on texts containing a marker
    struct MarkedStub {
        fail_on: &'static str,
    }

    #[async_trait::async_trait]
    impl TranslationService for MarkedStub {
        async fn translate(&self, text: &str, _target: &str) -> Result<String> {
            if !self.fail_on.is_empty() && text.contains(self.fail_on) {
                return Err(Error::Translate("stub failure".to_string()));
            }
            Ok(text.to_uppercase())
        }
    }

    fn translator(fail_on: &'static str, max_chars: usize) -> Translator {
        Translator::new(Arc::new(MarkedStub { fail_on })).with_max_chunk_chars(max_chars)
    }

    #[tokio::test]
    async fn empty_input_is_empty_success() {
        let t = translator("", 100);
        assert_eq!(t.translate("", "fr").await.unwrap(), "");
        assert_eq!(t.translate("   ", "fr").await.unwrap(), "");
    }

    #[tokio::test]
    async fn single_chunk_translates() {
        let t = translator("", 100);
        assert_eq!(t.translate("hello there.", "fr").await.unwrap(), "HELLO THERE.");
    }

    #[tokio::test]
    async fn failed_middle_chunk_contributes_nothing() {
        // "One. Two. Three." at limit 6 chunks to ["One.", "Two.", "Three."]
        let t = translator("Two", 6);
        let result = t.translate("One. Two. Three.", "fr").await.unwrap();
        assert_eq!(result, "ONE. THREE.");
    }

    #[tokio::test]
    async fn all_chunks_failed_is_an_error() {
        let t = translator("x", 6);
        let result = t.translate("xx. xxx. xx.", "fr").await;
        assert!(matches!(result, Err(Error::Translate(_))));
    }

    #[tokio::test]
    async fn one_surviving_chunk_is_not_an_error() {
        let t = translator("x", 6);
        let result = t.translate("xx. ok. xx.", "fr").await.unwrap();
        assert_eq!(result, "OK.");
    }
}
