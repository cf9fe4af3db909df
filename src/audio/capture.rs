//! Microphone capture of bounded utterances

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// Buffer poll cadence while waiting for or recording speech
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Floor for the speech-energy threshold, used when the room is silent
const MIN_ENERGY_THRESHOLD: f32 = 0.01;

/// Multiplier applied to the calibrated ambient RMS
const AMBIENT_MARGIN: f32 = 2.0;

/// Trailing silence that ends an utterance before the phrase limit
const TRAILING_SILENCE: Duration = Duration::from_secs(1);

/// Bounds for one utterance capture
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Maximum wait for speech to begin
    pub timeout: Duration,
    /// Maximum utterance length once speech has begun
    pub phrase_limit: Duration,
    /// Ambient-noise calibration window before listening
    pub calibration: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(6),
            phrase_limit: Duration::from_secs(20),
            calibration: Duration::from_millis(500),
        }
    }
}

/// Records bounded utterances from the default input device.
///
/// All recording is blocking; callers run it on a worker thread so the
/// foreground never waits on audio I/O.
pub struct Microphone {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl Microphone {
    /// Open the default input device at 16kHz mono.
    ///
    /// # Errors
    ///
    /// Returns error if no input device or suitable config is available.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Record one utterance (blocking).
    ///
    /// Calibrates the ambient-noise threshold for a short fixed window,
    /// waits up to `opts.timeout` for speech to begin, then records until
    /// `opts.phrase_limit` elapses or trailing silence follows the
    /// speech. Returns `None` when no speech began within the window — a
    /// defined outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be opened.
    pub fn record_utterance(&self, opts: &CaptureOptions) -> Result<Option<Vec<f32>>> {
        let stream = self.open_stream()?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Calibrate against ambient noise before listening
        std::thread::sleep(opts.calibration);
        let ambient = rms(&self.drain());
        let threshold = (ambient * AMBIENT_MARGIN).max(MIN_ENERGY_THRESHOLD);
        tracing::debug!(ambient, threshold, "ambient noise calibrated");

        // Wait for speech to begin
        let mut recorded: Vec<f32> = Vec::new();
        let wait_start = Instant::now();
        let speech_started = loop {
            if wait_start.elapsed() >= opts.timeout {
                break false;
            }
            std::thread::sleep(POLL_INTERVAL);
            let samples = self.drain();
            if rms(&samples) > threshold {
                recorded.extend_from_slice(&samples);
                break true;
            }
        };

        if !speech_started {
            drop(stream);
            tracing::debug!(waited = ?wait_start.elapsed(), "no speech detected");
            return Ok(None);
        }

        // Record until the phrase limit or trailing silence
        let phrase_start = Instant::now();
        let mut silence = Duration::ZERO;
        while phrase_start.elapsed() < opts.phrase_limit {
            std::thread::sleep(POLL_INTERVAL);
            let samples = self.drain();
            let quiet = rms(&samples) <= threshold;
            recorded.extend_from_slice(&samples);

            if quiet {
                silence += POLL_INTERVAL;
                if silence >= TRAILING_SILENCE {
                    break;
                }
            } else {
                silence = Duration::ZERO;
            }
        }

        drop(stream);
        tracing::debug!(
            samples = recorded.len(),
            duration = ?phrase_start.elapsed(),
            "utterance recorded"
        );
        Ok(Some(recorded))
    }

    /// Build an input stream feeding the shared buffer
    fn open_stream(&self) -> Result<Stream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let buffer = Arc::clone(&self.buffer);
        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        Ok(stream)
    }

    /// Take everything captured since the last drain
    fn drain(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert f32 samples to WAV bytes for the recognition service
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
