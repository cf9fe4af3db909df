//! Text-to-speech synthesis into temporary audio clips

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::AudioClip;
use crate::retry::{RetryPolicy, retry};
use crate::services::SpeechService;
use crate::{Error, Result, chunk};

/// HTTP text-to-speech client
///
/// Fetches the spoken audio payload (MP3) for one text chunk.
pub struct HttpSpeechService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechService {
    /// Create a client against a TTS endpoint base URL
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl SpeechService for HttpSpeechService {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/api/tts?tl={}&q={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(lang),
            urlencoding::encode(text)
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("TTS API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(Error::Tts("empty audio payload".to_string()));
        }
        Ok(audio.to_vec())
    }
}

/// Where a saved synthesis ended up
#[derive(Debug)]
pub enum SavedAudio {
    /// The whole text fit in one service call and one file
    Single(PathBuf),
    /// Whole-text synthesis failed; numbered part files were written
    Parts(Vec<PathBuf>),
}

/// Chunked speech synthesizer
///
/// Splits text to the TTS-safe size and synthesizes each chunk into a
/// temporary audio file, retrying transient failures with linear backoff.
/// Synthesis is best-effort: a chunk that exhausts its retries is logged
/// and skipped, never aborting the remaining chunks.
pub struct Synthesizer {
    service: Arc<dyn SpeechService>,
    max_chunk_chars: usize,
    retry: RetryPolicy,
    out_dir: PathBuf,
}

impl Synthesizer {
    /// Default chunk limit for TTS requests (stricter than translation)
    pub const DEFAULT_MAX_CHARS: usize = 900;

    /// Create a synthesizer with default chunking, retry, and temp dir
    #[must_use]
    pub fn new(service: Arc<dyn SpeechService>) -> Self {
        Self {
            service,
            max_chunk_chars: Self::DEFAULT_MAX_CHARS,
            retry: RetryPolicy::default(),
            out_dir: std::env::temp_dir(),
        }
    }

    /// Override the per-chunk size limit
    #[must_use]
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override where temporary clips are written
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: PathBuf) -> Self {
        self.out_dir = out_dir;
        self
    }

    /// Synthesize `text` into zero or more temporary audio clips.
    ///
    /// Returns one clip per chunk that succeeded, in chunk order; chunks
    /// that permanently failed are absent. The caller owns the clips and
    /// is responsible for their eventual deletion (the playback engine
    /// deletes consumed clips unconditionally).
    pub async fn synthesize(&self, text: &str, lang: &str) -> Vec<AudioClip> {
        let chunks = chunk::chunk_text(text, self.max_chunk_chars);
        let total = chunks.len();
        let mut clips = Vec::with_capacity(total);

        for (idx, chunk) in chunks.iter().enumerate() {
            let label = format!("tts chunk {}/{total}", idx + 1);
            let chunk = chunk.as_str();
            let result = retry(&self.retry, &label, move || {
                self.synthesize_to_file(chunk, lang)
            })
            .await;

            match result {
                Ok(path) => {
                    tracing::debug!(chunk = idx + 1, total, lang, path = %path.display(), "chunk synthesized");
                    clips.push(AudioClip::new(path, idx));
                }
                Err(e) => {
                    tracing::error!(
                        chunk = idx + 1,
                        total,
                        lang,
                        error = %e,
                        "chunk synthesis failed after retries, skipping"
                    );
                }
            }
        }

        clips
    }

    /// Synthesize `text` to `path` on explicit user request.
    ///
    /// Tries one whole-text service call first; if that fails, falls back
    /// to per-chunk numbered part files (`stem_part1.ext`, ...), each with
    /// the usual retry treatment.
    ///
    /// # Errors
    ///
    /// Returns error if the fallback path also fails to produce a part,
    /// or the files cannot be written.
    pub async fn save_to_file(&self, text: &str, lang: &str, path: &Path) -> Result<SavedAudio> {
        match self.service.synthesize(text, lang).await {
            Ok(bytes) => {
                tokio::fs::write(path, &bytes).await?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "saved audio");
                Ok(SavedAudio::Single(path.to_path_buf()))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "whole-text synthesis failed, falling back to part files"
                );
                self.save_parts(text, lang, path).await
            }
        }
    }

    /// Write one numbered part file per chunk
    async fn save_parts(&self, text: &str, lang: &str, path: &Path) -> Result<SavedAudio> {
        let chunks = chunk::chunk_text(text, self.max_chunk_chars);
        let total = chunks.len();

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("mp3");
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut parts = Vec::with_capacity(total);
        for (idx, chunk) in chunks.iter().enumerate() {
            let label = format!("save part {}/{total}", idx + 1);
            let chunk = chunk.as_str();
            let bytes = retry(&self.retry, &label, move || {
                self.service.synthesize(chunk, lang)
            })
            .await?;

            let part_path = dir.join(format!("{stem}_part{}.{ext}", idx + 1));
            tokio::fs::write(&part_path, &bytes).await?;
            parts.push(part_path);
        }

        tracing::info!(parts = parts.len(), "saved audio as part files");
        Ok(SavedAudio::Parts(parts))
    }

    /// One synthesis attempt: temp file first, audio written on success,
    /// any partial artifact deleted on failure.
    async fn synthesize_to_file(&self, text: &str, lang: &str) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix("voxlate-")
            .suffix(".mp3")
            .tempfile_in(&self.out_dir)?;
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| Error::Io(e.error))?;

        match self.service.synthesize(text, lang).await {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&path, &bytes).await {
                    remove_partial(&path);
                    return Err(e.into());
                }
                Ok(path)
            }
            Err(e) => {
                remove_partial(&path);
                Err(e)
            }
        }
    }
}

/// Delete a partially-created audio artifact before the next attempt
fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(
                path = %path.display(),
                error = %e,
                "failed to remove partial audio file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    /// Stub that counts calls and fails the first `fail_first` of them
    struct FlakySpeech {
        calls: AtomicU32,
        fail_first: u32,
    }

    impl FlakySpeech {
        fn new(fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                fail_first,
            })
        }
    }

    #[async_trait::async_trait]
    impl SpeechService for FlakySpeech {
        async fn synthesize(&self, _text: &str, _lang: &str) -> Result<Vec<u8>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(Error::Tts("transient".to_string()))
            } else {
                Ok(b"mp3data".to_vec())
            }
        }
    }

    /// Stub that rejects texts longer than a threshold
    struct SizeLimitedSpeech {
        max_len: usize,
    }

    #[async_trait::async_trait]
    impl SpeechService for SizeLimitedSpeech {
        async fn synthesize(&self, text: &str, _lang: &str) -> Result<Vec<u8>> {
            if text.len() > self.max_len {
                Err(Error::Tts("payload too large".to_string()))
            } else {
                Ok(format!("audio:{text}").into_bytes())
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    // ---- synthesize ----

    #[tokio::test]
    async fn empty_text_produces_no_clips() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FlakySpeech::new(0))
            .with_out_dir(dir.path().to_path_buf());
        assert!(synth.synthesize("", "fr").await.is_empty());
    }

    #[tokio::test]
    async fn successful_chunks_become_clips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FlakySpeech::new(0))
            .with_max_chunk_chars(6)
            .with_retry(fast_retry())
            .with_out_dir(dir.path().to_path_buf());

        let clips = synth.synthesize("One. Two. Three.", "fr").await;
        assert_eq!(clips.len(), 3);
        for (i, clip) in clips.iter().enumerate() {
            assert_eq!(clip.chunk_index(), i);
            assert_eq!(std::fs::read(clip.path()).unwrap(), b"mp3data");
        }
    }

    #[tokio::test]
    async fn always_failing_service_yields_empty_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let service = FlakySpeech::new(u32::MAX);
        let synth = Synthesizer::new(service.clone())
            .with_retry(fast_retry())
            .with_out_dir(dir.path().to_path_buf());

        let clips = synth.synthesize("Hello there.", "fr").await;
        assert!(clips.is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        // No partial artifacts left behind
        assert_eq!(count_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn transient_failure_recovers_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let service = FlakySpeech::new(1);
        let synth = Synthesizer::new(service.clone())
            .with_retry(fast_retry())
            .with_out_dir(dir.path().to_path_buf());

        let clips = synth.synthesize("Hello there.", "fr").await;
        assert_eq!(clips.len(), 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert_eq!(count_files(dir.path()), 1);
    }

    // ---- save_to_file ----

    #[tokio::test]
    async fn save_writes_single_file_when_whole_text_fits() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");
        let synth = Synthesizer::new(Arc::new(SizeLimitedSpeech { max_len: 1000 }))
            .with_retry(fast_retry());

        let saved = synth.save_to_file("Short text.", "fr", &out).await.unwrap();
        assert!(matches!(saved, SavedAudio::Single(_)));
        assert!(out.exists());
    }

    #[tokio::test]
    async fn save_falls_back_to_numbered_parts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("speech.mp3");
        let synth = Synthesizer::new(Arc::new(SizeLimitedSpeech { max_len: 20 }))
            .with_max_chunk_chars(20)
            .with_retry(fast_retry());

        let text = "First sentence here. Second sentence too.";
        let saved = synth.save_to_file(text, "fr", &out).await.unwrap();

        let SavedAudio::Parts(parts) = saved else {
            panic!("expected part files");
        };
        assert_eq!(parts.len(), 2);
        assert!(dir.path().join("speech_part1.mp3").exists());
        assert!(dir.path().join("speech_part2.mp3").exists());
        assert!(!out.exists());
    }
}
