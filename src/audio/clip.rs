//! Temporary audio clip handles

use std::path::{Path, PathBuf};

/// Handle to one temporary audio file produced for a single text chunk.
///
/// The file is owned by the synthesis call until consumed by playback and
/// must be deleted exactly once afterward, whether or not playback
/// succeeded. `remove` consumes the clip to make double-deletion
/// unrepresentable.
#[derive(Debug)]
pub struct AudioClip {
    path: PathBuf,
    chunk_index: usize,
}

impl AudioClip {
    /// Wrap an on-disk audio file produced for chunk `chunk_index`.
    #[must_use]
    pub const fn new(path: PathBuf, chunk_index: usize) -> Self {
        Self { path, chunk_index }
    }

    /// Path of the underlying audio file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Zero-based index of the text chunk this clip was synthesized from
    #[must_use]
    pub const fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    /// Delete the underlying file.
    ///
    /// Deletion failures are logged and swallowed; they cannot affect the
    /// correctness of the next operation.
    pub fn remove(self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "deleted audio clip");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to delete audio clip"
                );
            }
        }
    }
}
