//! Audio capture and clip handling
//!
//! Microphone input runs through `cpal` at 16kHz mono; captured samples
//! are WAV-encoded with `hound` for the recognition service. Synthesized
//! audio lives in temporary clip files until playback consumes them.

mod capture;
mod clip;
mod voice;

pub use capture::{CaptureOptions, Microphone, SAMPLE_RATE, samples_to_wav};
pub use clip::AudioClip;
pub use voice::VoiceInput;
