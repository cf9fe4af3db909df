//! Shared test stubs
//!
//! Service doubles for the remote collaborators and an inspectable
//! playback backend, so the pipeline tests run without network or audio
//! hardware.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use voxlate::playback::AudioBackend;
use voxlate::services::{SpeechService, TranslationService};
use voxlate::{Error, Result};

/// Translation stub: uppercases input, failing on chunks containing a marker
pub struct MarkedTranslation {
    pub fail_on: &'static str,
}

#[async_trait::async_trait]
impl TranslationService for MarkedTranslation {
    async fn translate(&self, text: &str, _target: &str) -> Result<String> {
        if !self.fail_on.is_empty() && text.contains(self.fail_on) {
            return Err(Error::Translate("stub failure".to_string()));
        }
        Ok(text.to_uppercase())
    }
}

/// Speech stub that counts calls and always fails
#[derive(Default)]
pub struct DeadSpeech {
    pub calls: AtomicU32,
}

#[async_trait::async_trait]
impl SpeechService for DeadSpeech {
    async fn synthesize(&self, _text: &str, _lang: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Tts("service down".to_string()))
    }
}

/// Speech stub returning a fixed payload
pub struct CannedSpeech;

#[async_trait::async_trait]
impl SpeechService for CannedSpeech {
    async fn synthesize(&self, text: &str, _lang: &str) -> Result<Vec<u8>> {
        Ok(format!("audio:{text}").into_bytes())
    }
}

/// Inspectable state shared between a test and its fake backend
#[derive(Default)]
pub struct BackendProbe {
    /// Whether start() should fail
    pub fail: AtomicBool,
    /// True between start() and stop()/finish
    playing: AtomicBool,
    /// Concurrently playing count and its high-water mark
    concurrent: AtomicUsize,
    max_concurrent: AtomicUsize,
    /// File names handed to start(), in order
    started: Mutex<Vec<String>>,
}

impl BackendProbe {
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

/// Playback backend double driven by a shared [`BackendProbe`].
///
/// A started clip stays "busy" until the engine stops it, which is what
/// lets tests hold a session open while a second one supersedes it.
#[derive(Clone)]
pub struct ProbeBackend {
    pub probe: Arc<BackendProbe>,
    /// When set, clips finish immediately instead of waiting for stop()
    pub instant: bool,
}

impl ProbeBackend {
    pub fn new(probe: &Arc<BackendProbe>, instant: bool) -> Box<dyn AudioBackend> {
        Box::new(Self {
            probe: Arc::clone(probe),
            instant,
        })
    }
}

impl AudioBackend for ProbeBackend {
    fn name(&self) -> &'static str {
        "probe"
    }

    fn start(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.probe.started.lock().unwrap().push(name);

        if self.probe.fail.load(Ordering::SeqCst) {
            return Err(Error::Playback("probe backend down".to_string()));
        }

        if !self.instant {
            self.probe.playing.store(true, Ordering::SeqCst);
            let n = self.probe.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.probe.max_concurrent.fetch_max(n, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.instant && self.probe.playing.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.probe.playing.swap(false, Ordering::SeqCst) {
            self.probe.concurrent.fetch_sub(1, Ordering::SeqCst);
        }
    }
}
