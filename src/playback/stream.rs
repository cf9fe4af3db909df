//! Raw cpal stream playback backend
//!
//! Decodes MP3 clips with minimp3 and feeds the samples straight to a
//! cpal output stream. No pause capability; stopping halts the feeder
//! thread.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use crate::playback::AudioBackend;
use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Plays decoded samples through the default output device
pub struct StreamBackend {
    config: StreamConfig,
    busy: Arc<AtomicBool>,
    halt: Arc<AtomicBool>,
}

impl StreamBackend {
    /// Probe the default output device for a usable config.
    ///
    /// # Errors
    ///
    /// Returns error if no output device or suitable config is available.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "stream backend initialized"
        );

        Ok(Self {
            config,
            busy: Arc::new(AtomicBool::new(false)),
            halt: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl AudioBackend for StreamBackend {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn start(&self, path: &Path) -> Result<()> {
        let samples = decode_mp3(&std::fs::read(path)?)?;
        if samples.is_empty() {
            return Err(Error::Playback("no audio frames in file".to_string()));
        }

        self.halt.store(false, Ordering::SeqCst);
        self.busy.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let busy = Arc::clone(&self.busy);
        let halt = Arc::clone(&self.halt);
        let (tx, rx) = mpsc::channel::<Result<()>>();

        // The cpal stream must live on the thread that drives it; the
        // channel reports whether the stream came up
        std::thread::spawn(move || {
            feed_stream(&config, samples, &halt, &tx);
            busy.store(false, Ordering::SeqCst);
        });

        let started = rx
            .recv()
            .map_err(|_| Error::Playback("playback thread exited".to_string()))?;
        if started.is_err() {
            self.busy.store(false, Ordering::SeqCst);
        }
        started
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.halt.store(true, Ordering::SeqCst);
    }
}

/// Open the output stream, report readiness on `tx`, then block until the
/// samples are consumed, `halt` is raised, or the expected duration (plus
/// margin) elapses.
fn feed_stream(
    config: &StreamConfig,
    samples: Vec<f32>,
    halt: &Arc<AtomicBool>,
    tx: &mpsc::Sender<Result<()>>,
) {
    let sample_count = samples.len();
    let finished = Arc::new(AtomicBool::new(false));

    let stream = match open_stream(config, samples, &finished) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(error = %e, "failed to open output stream");
            let _ = tx.send(Err(e));
            return;
        }
    };
    let _ = tx.send(Ok(()));

    let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

    while !finished.load(Ordering::SeqCst) && !halt.load(Ordering::SeqCst) {
        if Instant::now() > deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Let the device drain the tail of the buffer
    std::thread::sleep(Duration::from_millis(100));
    drop(stream);
    tracing::debug!(samples = sample_count, "stream playback finished");
}

/// Build and start an output stream feeding `samples` frame by frame
fn open_stream(
    config: &StreamConfig,
    samples: Vec<f32>,
    finished: &Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = config.channels as usize;
    let position = Arc::new(Mutex::new(0usize));
    let finished_cb = Arc::clone(finished);

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Ok(mut pos) = position.lock() else {
                    return;
                };
                for frame in data.chunks_mut(channels) {
                    let sample = if *pos < samples.len() {
                        let s = samples[*pos];
                        *pos += 1;
                        s
                    } else {
                        finished_cb.store(true, Ordering::SeqCst);
                        0.0
                    };
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio playback error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(stream)
}

/// Decode MP3 bytes to f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                // Convert i16 samples to f32, averaging stereo to mono
                let frame_samples: Vec<f32> = if frame.channels == 2 {
                    frame
                        .data
                        .chunks(2)
                        .map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right =
                                f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            f32::midpoint(left, right)
                        })
                        .collect()
                } else {
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect()
                };

                samples.extend(frame_samples);
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Playback(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_garbage() {
        // minimp3 skips junk until EOF, yielding no frames
        let result = decode_mp3(b"definitely not an mp3 file");
        match result {
            Ok(samples) => assert!(samples.is_empty()),
            Err(Error::Playback(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn decode_empty_input_yields_no_samples() {
        let samples = decode_mp3(&[]).unwrap();
        assert!(samples.is_empty());
    }
}
