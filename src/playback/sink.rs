//! Rodio sink playback backend
//!
//! The preferred backend: full capability surface including pause and
//! resume. The output stream must live on the thread that plays it, so
//! each `start` spawns a short-lived playback thread and shares only the
//! `Sink` control handle.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::playback::AudioBackend;
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sink-based playback through the default output device
pub struct SinkBackend {
    sink: Mutex<Option<Arc<rodio::Sink>>>,
}

impl SinkBackend {
    /// Probe the default output device.
    ///
    /// # Errors
    ///
    /// Returns error if no output stream can be opened.
    pub fn new() -> Result<Self> {
        // The probe stream is dropped immediately; playback opens its own
        // stream on a dedicated thread per start() call
        let (_stream, _handle) = rodio::OutputStream::try_default()
            .map_err(|e| Error::Playback(e.to_string()))?;

        tracing::debug!("sink backend initialized");
        Ok(Self {
            sink: Mutex::new(None),
        })
    }
}

impl AudioBackend for SinkBackend {
    fn name(&self) -> &'static str {
        "sink"
    }

    fn start(&self, path: &Path) -> Result<()> {
        // Decode up front so an unreadable file fails over to the next
        // backend instead of dying silently on the playback thread
        let decoder = rodio::Decoder::new(BufReader::new(File::open(path)?))
            .map_err(|e| Error::Playback(e.to_string()))?;

        // Halt whatever this backend was playing before
        if let Some(previous) = lock(&self.sink).take() {
            previous.stop();
        }

        let (tx, rx) = mpsc::channel::<Result<Arc<rodio::Sink>>>();
        std::thread::spawn(move || {
            let (stream, handle) = match rodio::OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = tx.send(Err(Error::Playback(e.to_string())));
                    return;
                }
            };
            let sink = match rodio::Sink::try_new(&handle) {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    let _ = tx.send(Err(Error::Playback(e.to_string())));
                    return;
                }
            };

            sink.append(decoder);
            let _ = tx.send(Ok(Arc::clone(&sink)));

            // Keep the output stream alive until the sink drains or is
            // stopped from the control handle
            sink.sleep_until_end();
            drop(stream);
        });

        let sink = rx
            .recv()
            .map_err(|_| Error::Playback("playback thread exited".to_string()))??;
        *lock(&self.sink) = Some(sink);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        lock(&self.sink).as_ref().is_some_and(|sink| !sink.empty())
    }

    fn supports_pause(&self) -> bool {
        true
    }

    fn pause(&self) -> Result<()> {
        match lock(&self.sink).as_ref() {
            Some(sink) => {
                sink.pause();
                Ok(())
            }
            None => Err(Error::Playback("nothing playing".to_string())),
        }
    }

    fn resume(&self) -> Result<()> {
        match lock(&self.sink).as_ref() {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(Error::Playback("nothing paused".to_string())),
        }
    }

    fn stop(&self) {
        if let Some(sink) = lock(&self.sink).take() {
            sink.stop();
        }
    }
}
