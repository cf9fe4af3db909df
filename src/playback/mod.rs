//! Audio playback with ordered backend fallback
//!
//! Playback goes through a fixed priority list of backends implementing a
//! common capability surface; each file is played by the first backend
//! that accepts it. One playback session runs at a time — starting a new
//! session force-stops the current backend and waits on the session gate,
//! so two audio streams never overlap.

mod external;
mod sink;
mod stream;

pub use external::ExternalBackend;
pub use sink::SinkBackend;
pub use stream::StreamBackend;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::Result;
use crate::audio::AudioClip;

/// Busy-poll cadence for blocking playback
const BUSY_POLL: Duration = Duration::from_millis(100);

/// Lock a mutex, recovering the guard if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Capability surface of one playback backend.
///
/// `start` loads the file and begins playback; not every backend
/// implements pausing, so callers probe `supports_pause` first.
pub trait AudioBackend: Send + Sync {
    /// Short backend identifier for logs
    fn name(&self) -> &'static str;

    /// Load `path` and begin playback, returning once audio is running.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be loaded or the device refuses
    /// the stream; the engine falls through to the next backend.
    fn start(&self, path: &Path) -> Result<()>;

    /// True while the most recently started playback is still running
    fn is_busy(&self) -> bool;

    /// Whether this backend can pause and resume
    fn supports_pause(&self) -> bool {
        false
    }

    /// Pause playback.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot pause.
    fn pause(&self) -> Result<()> {
        Err(crate::Error::Playback(format!(
            "{} backend does not support pausing",
            self.name()
        )))
    }

    /// Resume paused playback.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot resume.
    fn resume(&self) -> Result<()> {
        Err(crate::Error::Playback(format!(
            "{} backend does not support resuming",
            self.name()
        )))
    }

    /// Halt playback; idempotent
    fn stop(&self);
}

/// State of the active playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session running
    Idle,
    /// Clips are being played
    Playing,
    /// Playback paused by the user
    Paused,
    /// Session stopped or superseded; cleanup pending
    Stopped,
}

/// Plays sequences of audio clips through the backend list.
///
/// Exactly one session is active at a time; the session gate and an
/// atomic stop signal enforce the mutual exclusion.
pub struct PlaybackEngine {
    backends: Vec<Box<dyn AudioBackend>>,
    gate: Mutex<()>,
    state: Mutex<SessionState>,
    stop_requested: AtomicBool,
    active_backend: Mutex<Option<usize>>,
}

impl PlaybackEngine {
    /// Create an engine with an explicit backend list (priority order)
    #[must_use]
    pub fn new(backends: Vec<Box<dyn AudioBackend>>) -> Self {
        Self {
            backends,
            gate: Mutex::new(()),
            state: Mutex::new(SessionState::Idle),
            stop_requested: AtomicBool::new(false),
            active_backend: Mutex::new(None),
        }
    }

    /// Create an engine with the default backends, probed in priority
    /// order: rodio sink, raw cpal stream, external player process.
    ///
    /// A backend that fails to initialize is skipped with a warning —
    /// degraded capability, never fatal. An engine with no backends
    /// reports every playback as failed without crashing.
    #[must_use]
    pub fn with_default_backends() -> Self {
        let mut backends: Vec<Box<dyn AudioBackend>> = Vec::new();

        match SinkBackend::new() {
            Ok(backend) => backends.push(Box::new(backend)),
            Err(e) => tracing::warn!(error = %e, "sink backend unavailable"),
        }

        match StreamBackend::new() {
            Ok(backend) => backends.push(Box::new(backend)),
            Err(e) => tracing::warn!(error = %e, "stream backend unavailable"),
        }

        if let Some(backend) = ExternalBackend::discover() {
            backends.push(Box::new(backend));
        } else {
            tracing::warn!("no external player binary found");
        }

        if backends.is_empty() {
            tracing::error!("no playback backends available, playback will fail");
        } else {
            let names: Vec<_> = backends.iter().map(|b| b.name()).collect();
            tracing::info!(backends = ?names, "playback backends initialized");
        }

        Self::new(backends)
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// True while a session is playing or paused
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state(), SessionState::Playing | SessionState::Paused)
    }

    /// Play one clip, trying backends in priority order.
    ///
    /// The first backend whose `start` succeeds wins; later backends are
    /// never touched for this clip. Backend failures are logged and fall
    /// through. When `blocking`, waits (polling the busy flag every
    /// 100ms) until playback finishes or the session is stopped.
    ///
    /// Returns whether any backend played the clip.
    pub fn play_one(&self, clip: &AudioClip, blocking: bool) -> bool {
        for (idx, backend) in self.backends.iter().enumerate() {
            if self.stop_requested.load(Ordering::SeqCst) {
                return false;
            }

            // Mark the backend active before starting it so a superseding
            // session can always reach it with a force-stop
            *lock(&self.active_backend) = Some(idx);

            match backend.start(clip.path()) {
                Ok(()) => {
                    tracing::debug!(
                        backend = backend.name(),
                        chunk = clip.chunk_index(),
                        "playback started"
                    );
                    if blocking {
                        self.wait_while_busy(idx);
                    }
                    return true;
                }
                Err(e) => {
                    *lock(&self.active_backend) = None;
                    tracing::warn!(
                        backend = backend.name(),
                        path = %clip.path().display(),
                        error = %e,
                        "backend failed, trying next"
                    );
                }
            }
        }

        tracing::error!(path = %clip.path().display(), "all playback backends failed");
        false
    }

    /// Play clips strictly in order as one exclusive session.
    ///
    /// Any active session is superseded first: its stop is signalled, its
    /// backend halted, and the new session waits for the gate. After the
    /// session ends — by completion, stop, or supersession — every clip's
    /// file is deleted exactly once regardless of per-clip success.
    pub fn play_sequence(&self, clips: Vec<AudioClip>) {
        if self.is_active() {
            tracing::info!("superseding active playback session");
            self.stop_requested.store(true, Ordering::SeqCst);
            self.stop_active_backend();
        }

        {
            let _session = lock(&self.gate);
            self.stop_requested.store(false, Ordering::SeqCst);
            *lock(&self.state) = SessionState::Playing;

            let total = clips.len();
            let mut played = 0usize;
            for clip in &clips {
                if self.stop_requested.load(Ordering::SeqCst) {
                    tracing::info!("session stopped, skipping remaining clips");
                    break;
                }
                if self.play_one(clip, true) {
                    played += 1;
                } else {
                    tracing::warn!(chunk = clip.chunk_index(), "clip could not be played");
                }
            }

            *lock(&self.active_backend) = None;
            *lock(&self.state) = SessionState::Stopped;
            tracing::debug!(played, total, "playback session finished");
            *lock(&self.state) = SessionState::Idle;
        }

        // Cleanup happens outside the gate so a superseding session can
        // start while files are unlinked
        for clip in clips {
            clip.remove();
        }
    }

    /// Pause the active backend, if it supports pausing.
    ///
    /// Returns whether the session is now paused; lack of support is
    /// reported and ignored.
    pub fn pause(&self) -> bool {
        if self.state() != SessionState::Playing {
            tracing::debug!("pause ignored, nothing playing");
            return false;
        }

        let Some(backend) = self.active() else {
            return false;
        };
        if !backend.supports_pause() {
            tracing::info!(backend = backend.name(), "pause not supported, ignoring");
            return false;
        }

        match backend.pause() {
            Ok(()) => {
                *lock(&self.state) = SessionState::Paused;
                true
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "pause failed");
                false
            }
        }
    }

    /// Resume a paused session.
    ///
    /// Returns whether the session is now playing again.
    pub fn resume(&self) -> bool {
        if self.state() != SessionState::Paused {
            tracing::debug!("resume ignored, nothing paused");
            return false;
        }

        let Some(backend) = self.active() else {
            return false;
        };
        match backend.resume() {
            Ok(()) => {
                *lock(&self.state) = SessionState::Playing;
                true
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "resume failed");
                false
            }
        }
    }

    /// Stop the active session.
    ///
    /// The session's remaining clips are skipped; their files are still
    /// deleted by the session's own cleanup.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.stop_active_backend();
        let mut state = lock(&self.state);
        if matches!(*state, SessionState::Playing | SessionState::Paused) {
            *state = SessionState::Stopped;
        }
    }

    /// Best-effort shutdown before process exit
    pub fn shutdown(&self) {
        self.stop();
    }

    /// The currently active backend, if a clip is playing
    fn active(&self) -> Option<&dyn AudioBackend> {
        let idx = (*lock(&self.active_backend))?;
        self.backends.get(idx).map(|b| &**b)
    }

    /// Halt whichever backend is currently playing
    fn stop_active_backend(&self) {
        if let Some(backend) = self.active() {
            tracing::debug!(backend = backend.name(), "force-stopping backend");
            backend.stop();
        }
    }

    /// Poll the backend's busy flag until playback ends or stop is requested
    fn wait_while_busy(&self, idx: usize) {
        let Some(backend) = self.backends.get(idx) else {
            return;
        };
        while backend.is_busy() {
            if self.stop_requested.load(Ordering::SeqCst) {
                backend.stop();
                break;
            }
            std::thread::sleep(BUSY_POLL);
        }
    }
}
