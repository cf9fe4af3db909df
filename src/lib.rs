//! voxlate - voice translation pipeline
//!
//! Captures text or spoken input, translates it through a remote
//! translation service, synthesizes the result through a remote TTS
//! service, and plays the audio through the first working backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Input                            │
//! │        Typed text      │      Microphone             │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────┐
//! │                voxlate pipeline                      │
//! │  Chunker │ Translator │ Synthesizer │ Playback       │
//! └────────────────────────┬────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────┐
//! │              Remote services                         │
//! │  Translation  │  TTS  │  Speech recognition          │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod audio;
pub mod chunk;
pub mod config;
pub mod error;
pub mod lang;
pub mod playback;
pub mod retry;
pub mod services;

pub use app::{App, AppEvent};
pub use config::Config;
pub use error::{Error, Result};
pub use retry::RetryPolicy;
