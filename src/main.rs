use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voxlate::audio::{AudioClip, CaptureOptions, Microphone, SAMPLE_RATE, samples_to_wav};
use voxlate::playback::PlaybackEngine;
use voxlate::services::SavedAudio;
use voxlate::{App, AppEvent, Config, lang};

/// voxlate - translate text or speech and play it aloud
#[derive(Parser)]
#[command(name = "voxlate", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate text and print the result ("-" reads stdin)
    Translate {
        /// Text to translate
        text: String,
        /// Target language name (e.g. "french")
        #[arg(short, long, env = "VOXLATE_TARGET_LANG")]
        to: Option<String>,
    },
    /// Translate text and speak the translation
    Speak {
        /// Text to translate and speak
        text: String,
        /// Target language name
        #[arg(short, long, env = "VOXLATE_TARGET_LANG")]
        to: Option<String>,
    },
    /// Speak text as-is, without translating
    Say {
        /// Text to speak
        text: String,
        /// Language code (e.g. "fr", "zh-cn")
        #[arg(short, long, default_value = "en")]
        lang: String,
    },
    /// Capture an utterance, translate it, and speak the translation
    Listen {
        /// Target language name
        #[arg(short, long, env = "VOXLATE_TARGET_LANG")]
        to: Option<String>,
    },
    /// Render a translation to a standalone audio file
    Save {
        /// Text to translate and render
        text: String,
        /// Target language name
        #[arg(short, long, env = "VOXLATE_TARGET_LANG")]
        to: Option<String>,
        /// Output file path
        #[arg(short, long)]
        out: PathBuf,
    },
    /// List supported languages (name — code)
    Languages,
    /// Test microphone input
    TestMic {
        /// Listening window in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voxlate=info",
        1 => "info,voxlate=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Languages => {
            for (name, code) in lang::supported() {
                println!("{name} — {code}");
            }
            Ok(())
        }
        Command::TestMic { duration } => {
            tokio::task::spawn_blocking(move || test_mic(duration)).await?
        }
        Command::TestSpeaker => tokio::task::spawn_blocking(test_speaker).await?,
        Command::Translate { text, to } => {
            let config = Config::load()?;
            let text = read_text(&text)?;
            ensure_text(&text)?;
            let code = resolve_target(&config, to)?;
            let session = Session::start(&config);
            let handle = session.app.translate(text, code);
            session.finish(handle).await
        }
        Command::Speak { text, to } => {
            let config = Config::load()?;
            let text = read_text(&text)?;
            ensure_text(&text)?;
            let code = resolve_target(&config, to)?;
            let session = Session::start(&config);
            let handle = session.app.translate_and_speak(text, code);
            session.finish(handle).await
        }
        Command::Say { text, lang } => {
            let config = Config::load()?;
            let text = read_text(&text)?;
            ensure_text(&text)?;
            let code = resolve_code(&lang)?;
            let session = Session::start(&config);
            let handle = session.app.speak(text, code);
            session.finish(handle).await
        }
        Command::Listen { to } => {
            let config = Config::load()?;
            let code = resolve_target(&config, to)?;
            let session = Session::start(&config);
            let handle = session.app.listen_and_speak(code);
            session.finish(handle).await
        }
        Command::Save { text, to, out } => {
            let config = Config::load()?;
            let text = read_text(&text)?;
            ensure_text(&text)?;
            let code = resolve_target(&config, to)?;
            let session = Session::start(&config);
            let handle = session.app.save_audio(text, code, out);
            session.finish(handle).await
        }
    }
}

/// A running pipeline plus the task printing its events
struct Session {
    app: App,
    printer: tokio::task::JoinHandle<()>,
}

impl Session {
    fn start(config: &Config) -> Self {
        let (app, mut rx) = App::new(config);
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                print_event(&event);
            }
        });
        Self { app, printer }
    }

    /// Wait for the action to finish, stopping cleanly on ctrl-c
    async fn finish(self, handle: tokio::task::JoinHandle<()>) -> anyhow::Result<()> {
        tokio::select! {
            res = handle => res?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping playback");
                self.app.shutdown();
            }
        }

        // Dropping the app closes the event channel; drain the printer
        drop(self.app);
        let _ = self.printer.await;
        Ok(())
    }
}

fn print_event(event: &AppEvent) {
    match event {
        AppEvent::Status(msg) => tracing::info!("{msg}"),
        AppEvent::Captured(Some(text)) => println!("heard: {text}"),
        AppEvent::Captured(None) => eprintln!("could not understand voice input"),
        AppEvent::Translated(text) => println!("{text}"),
        AppEvent::PlaybackFinished => tracing::info!("playback finished"),
        AppEvent::Saved(SavedAudio::Single(path)) => {
            println!("saved audio to {}", path.display());
        }
        AppEvent::Saved(SavedAudio::Parts(parts)) => {
            println!("saved {} audio part files", parts.len());
        }
        AppEvent::Failed(msg) => eprintln!("error: {msg}"),
    }
}

/// Expand "-" to stdin
fn read_text(text: &str) -> anyhow::Result<String> {
    if text == "-" {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
        Ok(buf)
    } else {
        Ok(text.to_string())
    }
}

/// Empty input is reported synchronously, before any worker starts
fn ensure_text(text: &str) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("no text provided");
    }
    Ok(())
}

/// Resolve a language name (or the configured default) to a service code
fn resolve_target(config: &Config, to: Option<String>) -> anyhow::Result<String> {
    let name = to.unwrap_or_else(|| config.target_language.clone());
    lang::code_for(&name).map_or_else(
        || anyhow::bail!("unknown language: {name} (see `voxlate languages`)"),
        |code| Ok(code.to_string()),
    )
}

/// Validate a bare language code
fn resolve_code(code: &str) -> anyhow::Result<String> {
    if lang::is_known_code(code) {
        Ok(code.trim().to_lowercase())
    } else {
        anyhow::bail!("unknown language code: {code} (see `voxlate languages`)")
    }
}

/// Test microphone input by capturing one utterance
fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone: speak within the next {duration} seconds...");

    let mic = Microphone::new()?;
    let opts = CaptureOptions {
        timeout: Duration::from_secs(duration),
        phrase_limit: Duration::from_secs(duration),
        calibration: Duration::from_millis(500),
    };

    match mic.record_utterance(&opts)? {
        Some(samples) => {
            #[allow(clippy::cast_precision_loss)]
            let seconds = samples.len() as f32 / SAMPLE_RATE as f32;
            println!("Captured {} samples (~{seconds:.1}s of audio)", samples.len());
            println!("Your microphone is working!");
        }
        None => {
            println!("No speech detected.");
            println!("Check:");
            println!("  1. Is your mic plugged in?");
            println!("  2. Run: pactl info | grep 'Default Source'");
            println!("  3. Run: arecord -l (to list devices)");
            println!("  4. Try: pavucontrol (to check levels)");
        }
    }

    Ok(())
}

/// Test speaker output with a sine wave played through the backend chain
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24_000_u32;
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    let wav = samples_to_wav(&samples, sample_rate)?;
    let file = tempfile::Builder::new()
        .prefix("voxlate-test-")
        .suffix(".wav")
        .tempfile()?;
    std::fs::write(file.path(), &wav)?;
    let path = file.into_temp_path().keep()?;

    let engine = PlaybackEngine::with_default_backends();
    let clip = AudioClip::new(path, 0);
    let played = engine.play_one(&clip, true);
    clip.remove();

    if played {
        println!("\nIf you heard the tone, your speakers are working!");
    } else {
        println!("\nAll playback backends failed. Check:");
        println!("  1. Run: pactl info | grep 'Default Sink'");
        println!("  2. Run: pactl list sinks short");
        println!("  3. Try installing mpg123 or ffmpeg for the fallback player");
    }

    Ok(())
}
