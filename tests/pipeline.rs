//! Pipeline integration tests
//!
//! Exercises the chunk → translate → synthesize → play pipeline through
//! the public API with stub services and probe backends; no network or
//! audio hardware required.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use common::{BackendProbe, CannedSpeech, DeadSpeech, MarkedTranslation, ProbeBackend};
use voxlate::RetryPolicy;
use voxlate::audio::AudioClip;
use voxlate::playback::{PlaybackEngine, SessionState};
use voxlate::services::{Synthesizer, Translator};

/// Poll until `cond` holds, panicking after a generous timeout
fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff: Duration::from_millis(1),
    }
}

fn make_clip(dir: &tempfile::TempDir, name: &str, index: usize) -> AudioClip {
    let path = dir.path().join(name);
    std::fs::write(&path, b"mp3").unwrap();
    AudioClip::new(path, index)
}

// ---- translation: partial failure tolerance ----

#[tokio::test]
async fn translation_tolerates_a_failed_middle_chunk() {
    let translator = Translator::new(Arc::new(MarkedTranslation { fail_on: "Two" }))
        .with_max_chunk_chars(6);

    // Chunks to ["One.", "Two.", "Three."]; chunk 2 fails and contributes
    // nothing, the rest survive
    let result = translator.translate("One. Two. Three.", "fr").await.unwrap();
    assert_eq!(result, "ONE. THREE.");
}

#[tokio::test]
async fn translation_unavailable_when_every_chunk_fails() {
    let translator = Translator::new(Arc::new(MarkedTranslation { fail_on: "x" }))
        .with_max_chunk_chars(6);

    let result = translator.translate("xx. xxx.", "fr").await;
    assert!(result.is_err(), "all-failed translation must not look empty");
}

// ---- synthesis: retry exhaustion ----

#[tokio::test]
async fn synthesis_gives_up_after_three_attempts_per_chunk() {
    let service = Arc::new(DeadSpeech::default());
    let dir = tempfile::tempdir().unwrap();
    let synthesizer = Synthesizer::new(service.clone())
        .with_retry(fast_retry())
        .with_out_dir(dir.path().to_path_buf());

    // One chunk, service always fails: exactly 3 attempts, no clips
    let clips = synthesizer.synthesize("Hello over there.", "fr").await;
    assert!(clips.is_empty());
    assert_eq!(service.calls.load(Ordering::SeqCst), 3);

    // No stray files survive the failed attempts
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ---- playback: fallback order ----

#[test]
fn fallback_skips_failed_backend_and_stops_at_first_success() {
    let failing = Arc::new(BackendProbe::default());
    failing.fail.store(true, Ordering::SeqCst);
    let working = Arc::new(BackendProbe::default());
    let untouched = Arc::new(BackendProbe::default());

    let engine = PlaybackEngine::new(vec![
        ProbeBackend::new(&failing, true),
        ProbeBackend::new(&working, true),
        ProbeBackend::new(&untouched, true),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let clip = make_clip(&dir, "clip.mp3", 0);
    assert!(engine.play_one(&clip, true));
    clip.remove();

    assert_eq!(failing.start_count(), 1);
    assert_eq!(working.start_count(), 1);
    assert_eq!(untouched.start_count(), 0, "backend C must never be invoked");
}

// ---- playback: cleanup guarantee ----

#[test]
fn sequence_deletes_every_clip_even_on_total_failure() {
    let probe = Arc::new(BackendProbe::default());
    probe.fail.store(true, Ordering::SeqCst);
    let engine = PlaybackEngine::new(vec![ProbeBackend::new(&probe, true)]);

    let dir = tempfile::tempdir().unwrap();
    let clips = vec![
        make_clip(&dir, "one.mp3", 0),
        make_clip(&dir, "two.mp3", 1),
    ];
    let paths: Vec<PathBuf> = clips.iter().map(|c| c.path().to_path_buf()).collect();

    engine.play_sequence(clips);

    for path in paths {
        assert!(!path.exists(), "clip not deleted: {}", path.display());
    }
    assert_eq!(engine.state(), SessionState::Idle);
}

// ---- playback: strict ordering ----

#[test]
fn sequence_plays_clips_in_chunk_order() {
    let probe = Arc::new(BackendProbe::default());
    let engine = PlaybackEngine::new(vec![ProbeBackend::new(&probe, true)]);

    let dir = tempfile::tempdir().unwrap();
    let clips = vec![
        make_clip(&dir, "part0.mp3", 0),
        make_clip(&dir, "part1.mp3", 1),
        make_clip(&dir, "part2.mp3", 2),
    ];

    engine.play_sequence(clips);

    assert_eq!(probe.started(), vec!["part0.mp3", "part1.mp3", "part2.mp3"]);
}

// ---- playback: mutual exclusion ----

#[test]
fn superseding_session_stops_the_active_one_first() {
    let probe = Arc::new(BackendProbe::default());
    let engine = Arc::new(PlaybackEngine::new(vec![ProbeBackend::new(&probe, false)]));

    let dir = tempfile::tempdir().unwrap();
    let first = vec![make_clip(&dir, "first.mp3", 0)];
    let second = vec![make_clip(&dir, "second.mp3", 0)];
    let first_path = first[0].path().to_path_buf();
    let second_path = second[0].path().to_path_buf();

    // Session 1 starts its clip and stays busy until stopped
    let engine1 = Arc::clone(&engine);
    let session1 = std::thread::spawn(move || engine1.play_sequence(first));
    wait_for("first clip to start", || probe.start_count() == 1);
    assert!(engine.is_active());

    // Session 2 supersedes: session 1's backend is force-stopped before
    // session 2's clip begins
    let engine2 = Arc::clone(&engine);
    let session2 = std::thread::spawn(move || engine2.play_sequence(second));
    wait_for("second clip to start", || probe.start_count() == 2);

    // End session 2 so the test can join both threads
    engine.stop();
    session1.join().unwrap();
    session2.join().unwrap();

    // At no instant were two sessions playing simultaneously
    assert_eq!(probe.max_concurrent(), 1);
    assert_eq!(probe.started(), vec!["first.mp3", "second.mp3"]);

    // Both sessions deleted their clips
    assert!(!first_path.exists());
    assert!(!second_path.exists());
}

// ---- end to end: synthesize then play ----

#[tokio::test]
async fn synthesized_clips_play_in_order_and_are_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let synthesizer = Synthesizer::new(Arc::new(CannedSpeech))
        .with_max_chunk_chars(6)
        .with_retry(fast_retry())
        .with_out_dir(dir.path().to_path_buf());

    let clips = synthesizer.synthesize("One. Two. Three.", "fr").await;
    assert_eq!(clips.len(), 3);
    let paths: Vec<PathBuf> = clips.iter().map(|c| c.path().to_path_buf()).collect();
    let expected: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();

    let probe = Arc::new(BackendProbe::default());
    let engine = PlaybackEngine::new(vec![ProbeBackend::new(&probe, true)]);

    let engine = Arc::new(engine);
    let worker = Arc::clone(&engine);
    tokio::task::spawn_blocking(move || worker.play_sequence(clips))
        .await
        .unwrap();

    assert_eq!(probe.started(), expected);
    for path in paths {
        assert!(!path.exists(), "clip not deleted: {}", path.display());
    }
}
