//! Application pipeline
//!
//! Wires voice capture, translation, synthesis, and playback together.
//! Each user action runs on a worker task; workers never block the
//! foreground and report progress and results back over an event channel
//! instead of mutating shared state.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audio::VoiceInput;
use crate::config::Config;
use crate::playback::PlaybackEngine;
use crate::services::{
    HttpRecognizer, HttpSpeechService, HttpTranslator, SavedAudio, Synthesizer, Translator,
};

/// Events emitted by worker tasks
#[derive(Debug)]
pub enum AppEvent {
    /// Human-readable progress line
    Status(String),
    /// Voice capture finished; `None` means nothing was recognized
    Captured(Option<String>),
    /// Translation finished
    Translated(String),
    /// Synthesis and playback of one session finished
    PlaybackFinished,
    /// Audio rendered to disk on user request
    Saved(SavedAudio),
    /// The action failed; the pipeline itself keeps running
    Failed(String),
}

/// The voxlate application pipeline
pub struct App {
    translator: Arc<Translator>,
    synthesizer: Arc<Synthesizer>,
    engine: Arc<PlaybackEngine>,
    voice: Arc<VoiceInput>,
    events: mpsc::Sender<AppEvent>,
}

impl App {
    /// Build the pipeline from configuration.
    ///
    /// Returns the app and the receiving end of its event channel.
    #[must_use]
    pub fn new(config: &Config) -> (Self, mpsc::Receiver<AppEvent>) {
        let (events, rx) = mpsc::channel(32);

        let translator = Arc::new(
            Translator::new(Arc::new(HttpTranslator::new(
                config.services.translate_url.clone(),
            )))
            .with_max_chunk_chars(config.chunking.translate_max_chars),
        );

        let synthesizer = Arc::new(
            Synthesizer::new(Arc::new(HttpSpeechService::new(
                config.services.tts_url.clone(),
            )))
            .with_max_chunk_chars(config.chunking.tts_max_chars)
            .with_retry(config.retry.clone()),
        );

        let engine = Arc::new(PlaybackEngine::with_default_backends());

        let voice = Arc::new(
            VoiceInput::new(
                Arc::new(HttpRecognizer::new(config.services.recognize_url.clone())),
                config.capture.locale.clone(),
            )
            .with_options(config.capture.options.clone()),
        );

        (
            Self {
                translator,
                synthesizer,
                engine,
                voice,
                events,
            },
            rx,
        )
    }

    /// Capture one utterance from the microphone
    pub fn capture_voice(&self) -> JoinHandle<()> {
        let voice = Arc::clone(&self.voice);
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events
                .send(AppEvent::Status("listening...".to_string()))
                .await;
            let text = voice.capture_utterance().await;
            let _ = events.send(AppEvent::Captured(text)).await;
        })
    }

    /// Translate text into the target language
    pub fn translate(&self, text: String, target_code: String) -> JoinHandle<()> {
        let translator = Arc::clone(&self.translator);
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = Self::run_translate(&translator, &events, &text, &target_code).await;
        })
    }

    /// Synthesize text in `lang_code` and play it as one session
    pub fn speak(&self, text: String, lang_code: String) -> JoinHandle<()> {
        let synthesizer = Arc::clone(&self.synthesizer);
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        tokio::spawn(async move {
            Self::run_speak(&synthesizer, &engine, &events, &text, &lang_code).await;
        })
    }

    /// Translate text, then speak the translation
    pub fn translate_and_speak(&self, text: String, target_code: String) -> JoinHandle<()> {
        let translator = Arc::clone(&self.translator);
        let synthesizer = Arc::clone(&self.synthesizer);
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        tokio::spawn(async move {
            let Some(translated) =
                Self::run_translate(&translator, &events, &text, &target_code).await
            else {
                return;
            };
            Self::run_speak(&synthesizer, &engine, &events, &translated, &target_code).await;
        })
    }

    /// Capture an utterance, translate it, and speak the translation
    pub fn listen_and_speak(&self, target_code: String) -> JoinHandle<()> {
        let voice = Arc::clone(&self.voice);
        let translator = Arc::clone(&self.translator);
        let synthesizer = Arc::clone(&self.synthesizer);
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events
                .send(AppEvent::Status("listening...".to_string()))
                .await;
            let captured = voice.capture_utterance().await;
            let _ = events.send(AppEvent::Captured(captured.clone())).await;
            let Some(text) = captured else {
                return;
            };

            let Some(translated) =
                Self::run_translate(&translator, &events, &text, &target_code).await
            else {
                return;
            };
            Self::run_speak(&synthesizer, &engine, &events, &translated, &target_code).await;
        })
    }

    /// Render text to an audio file on disk
    pub fn save_audio(&self, text: String, lang_code: String, path: PathBuf) -> JoinHandle<()> {
        let synthesizer = Arc::clone(&self.synthesizer);
        let events = self.events.clone();
        tokio::spawn(async move {
            if text.trim().is_empty() {
                let _ = events
                    .send(AppEvent::Failed("no text to save".to_string()))
                    .await;
                return;
            }
            let _ = events
                .send(AppEvent::Status("rendering audio...".to_string()))
                .await;
            match synthesizer.save_to_file(&text, &lang_code, &path).await {
                Ok(saved) => {
                    let _ = events.send(AppEvent::Saved(saved)).await;
                }
                Err(e) => {
                    let _ = events.send(AppEvent::Failed(format!("save failed: {e}"))).await;
                }
            }
        })
    }

    /// Pause the active playback session, if the backend allows it
    pub fn pause(&self) -> bool {
        self.engine.pause()
    }

    /// Resume a paused playback session
    pub fn resume(&self) -> bool {
        self.engine.resume()
    }

    /// Stop the active playback session
    pub fn stop(&self) {
        self.engine.stop();
    }

    /// Best-effort stop-and-cleanup before process exit
    pub fn shutdown(&self) {
        tracing::debug!("shutting down pipeline");
        self.engine.shutdown();
    }

    /// Shared translate step: emits events, returns the translation
    async fn run_translate(
        translator: &Translator,
        events: &mpsc::Sender<AppEvent>,
        text: &str,
        target_code: &str,
    ) -> Option<String> {
        if text.trim().is_empty() {
            let _ = events
                .send(AppEvent::Failed("no text to translate".to_string()))
                .await;
            return None;
        }

        let _ = events
            .send(AppEvent::Status(format!("translating into {target_code}...")))
            .await;
        match translator.translate(text, target_code).await {
            Ok(translated) => {
                let _ = events.send(AppEvent::Translated(translated.clone())).await;
                Some(translated)
            }
            Err(e) => {
                let _ = events
                    .send(AppEvent::Failed(format!("translation unavailable: {e}")))
                    .await;
                None
            }
        }
    }

    /// Shared speak step: synthesize, then play on a blocking worker
    async fn run_speak(
        synthesizer: &Synthesizer,
        engine: &Arc<PlaybackEngine>,
        events: &mpsc::Sender<AppEvent>,
        text: &str,
        lang_code: &str,
    ) {
        if text.trim().is_empty() {
            let _ = events
                .send(AppEvent::Failed("no text to speak".to_string()))
                .await;
            return;
        }

        let _ = events
            .send(AppEvent::Status("generating speech...".to_string()))
            .await;
        let clips = synthesizer.synthesize(text, lang_code).await;
        if clips.is_empty() {
            let _ = events
                .send(AppEvent::Failed("no audio generated".to_string()))
                .await;
            return;
        }

        let _ = events
            .send(AppEvent::Status(format!("playing {} clip(s)...", clips.len())))
            .await;

        let engine = Arc::clone(engine);
        let played = tokio::task::spawn_blocking(move || engine.play_sequence(clips)).await;
        if played.is_err() {
            let _ = events
                .send(AppEvent::Failed("playback worker panicked".to_string()))
                .await;
        } else {
            let _ = events.send(AppEvent::PlaybackFinished).await;
        }
    }
}
