//! External player process backend
//!
//! Last-resort fallback: hand the file to whatever command-line audio
//! player is installed. Useful on hosts where the in-process audio stack
//! cannot open a device but a system player can.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::playback::AudioBackend;
use crate::{Error, Result};

/// Candidate players in preference order, with the flags that make them
/// quiet and exit when the file ends
const PLAYER_CANDIDATES: &[(&str, &[&str])] = &[
    ("mpg123", &["-q"]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("afplay", &[]),
];

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Plays audio files by spawning an installed player binary
pub struct ExternalBackend {
    program: PathBuf,
    args: &'static [&'static str],
    child: Mutex<Option<Child>>,
}

impl ExternalBackend {
    /// Probe `PATH` for a known player binary.
    ///
    /// Returns `None` when no candidate is installed.
    #[must_use]
    pub fn discover() -> Option<Self> {
        for (binary, args) in PLAYER_CANDIDATES {
            if let Ok(program) = which::which(binary) {
                tracing::debug!(player = %program.display(), "external player found");
                return Some(Self {
                    program,
                    args,
                    child: Mutex::new(None),
                });
            }
        }
        None
    }
}

impl AudioBackend for ExternalBackend {
    fn name(&self) -> &'static str {
        "external"
    }

    fn start(&self, path: &Path) -> Result<()> {
        // Reap any previous player before starting a new one
        self.stop();

        let child = Command::new(&self.program)
            .args(self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::Playback(format!(
                    "failed to spawn {}: {e}",
                    self.program.display()
                ))
            })?;

        *lock(&self.child) = Some(child);
        Ok(())
    }

    fn is_busy(&self) -> bool {
        let mut slot = lock(&self.child);
        match slot.as_mut() {
            Some(child) => match child.try_wait() {
                // Still running
                Ok(None) => true,
                Ok(Some(_)) | Err(_) => {
                    *slot = None;
                    false
                }
            },
            None => false,
        }
    }

    fn stop(&self) {
        if let Some(mut child) = lock(&self.child).take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "external player already exited");
            }
            let _ = child.wait();
        }
    }
}
