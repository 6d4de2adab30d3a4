//! Playback driver tests against a recording backend.
//!
//! Covers the teardown ordering and the "decode failure opens nothing"
//! contract without touching a real audio device.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use termplay::console::key_poll::{KeyPoll, NoKeys, KEY_ENTER};
use termplay::engine::wave::Wave;
use termplay::engine::AudioBackend;
use termplay::{cli, PlayOutcome, Player, PlayerConfig, PlayerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    LoadWave(PathBuf),
    InitDevice,
    LoadSound,
    PlaySound,
    UnloadSound,
    CloseDevice,
    UnloadWave,
}

type Log = Rc<RefCell<Vec<Call>>>;

/// Backend that decodes real files with symphonia but records every device
/// step instead of opening one.
struct RecordingBackend {
    log: Log,
    device_fails: bool,
}

impl RecordingBackend {
    fn new(log: Log) -> Self {
        Self {
            log,
            device_fails: false,
        }
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl AudioBackend for RecordingBackend {
    type Sound = ();

    fn load_wave(&mut self, path: &Path) -> Result<Wave> {
        self.push(Call::LoadWave(path.to_path_buf()));
        Wave::load(path)
    }

    fn init_device(&mut self) -> Result<()> {
        self.push(Call::InitDevice);
        if self.device_fails {
            Err(PlayerError::DeviceNotFound)
        } else {
            Ok(())
        }
    }

    fn close_device(&mut self) {
        self.push(Call::CloseDevice);
    }

    fn load_sound(&mut self, _wave: &Wave) -> Result<()> {
        self.push(Call::LoadSound);
        Ok(())
    }

    fn play_sound(&mut self, _sound: &mut ()) -> Result<()> {
        self.push(Call::PlaySound);
        Ok(())
    }

    fn unload_sound(&mut self, _sound: ()) {
        self.push(Call::UnloadSound);
    }

    fn unload_wave(&mut self, wave: Wave) {
        self.push(Call::UnloadWave);
        drop(wave);
    }
}

/// Reports Enter on the first poll.
struct EnterPressed(bool);

impl KeyPoll for EnterPressed {
    fn key_available(&mut self) -> bool {
        !self.0
    }

    fn read_key(&mut self) -> Option<char> {
        if self.0 {
            None
        } else {
            self.0 = true;
            Some(KEY_ENTER)
        }
    }
}

fn no_keys() -> Box<dyn KeyPoll> {
    Box::new(NoKeys)
}

fn enter_pressed() -> Box<dyn KeyPoll> {
    Box::new(EnterPressed(false))
}

fn config() -> PlayerConfig {
    PlayerConfig {
        poll_interval: Duration::from_millis(1),
        ..PlayerConfig::default()
    }
}

/// Writes a mono 16-bit WAV of `duration_ms` at 8 kHz.
fn write_wav(dir: &TempDir, name: &str, duration_ms: u32) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..(8 * duration_ms) {
        let value = if (i / 20) % 2 == 0 { 8000i16 } else { -8000 };
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn count(log: &Log, call: &Call) -> usize {
    log.borrow().iter().filter(|c| *c == call).count()
}

#[test]
fn test_missing_file_touches_no_device() {
    let log = Log::default();
    let mut out = Vec::new();
    let mut player = Player::new(RecordingBackend::new(log.clone()), no_keys, &mut out, &config());

    let outcome = player.play_file(Path::new("/definitely/not/here.wav"));

    assert_eq!(outcome, PlayOutcome::NotLoaded);
    assert_eq!(count(&log, &Call::InitDevice), 0);
    assert_eq!(count(&log, &Call::CloseDevice), 0);
    assert_eq!(log.borrow().len(), 1);
    drop(player);
    assert!(out.is_empty(), "nothing should be printed for a failed load");
}

#[test]
fn test_corrupt_file_touches_no_device() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.wav");
    std::fs::write(&path, vec![0u8; 512]).unwrap();

    let log = Log::default();
    let mut player = Player::new(RecordingBackend::new(log.clone()), no_keys, Vec::new(), &config());

    assert_eq!(player.play_file(&path), PlayOutcome::NotLoaded);
    assert_eq!(count(&log, &Call::InitDevice), 0);
    assert_eq!(count(&log, &Call::CloseDevice), 0);
}

#[test]
fn test_full_playback_runs_steps_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "short.wav", 60);

    let log = Log::default();
    let mut out = Vec::new();
    let mut player = Player::new(RecordingBackend::new(log.clone()), no_keys, &mut out, &config());

    let started = Instant::now();
    let outcome = player.play_file(&path);
    let waited = started.elapsed();
    drop(player);

    assert_eq!(outcome, PlayOutcome::Finished);
    assert!(waited >= Duration::from_millis(60));
    assert_eq!(
        *log.borrow(),
        vec![
            Call::LoadWave(path.clone()),
            Call::InitDevice,
            Call::LoadSound,
            Call::PlaySound,
            Call::UnloadSound,
            Call::CloseDevice,
            Call::UnloadWave,
        ]
    );

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Playing sound [0.06 sec.]. Press ENTER to finish."));
    assert!(text.contains("[100%]"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn test_early_exit_still_tears_down() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "long.wav", 5000);

    let log = Log::default();
    let mut out = Vec::new();
    let mut player = Player::new(RecordingBackend::new(log.clone()), enter_pressed, &mut out, &config());

    let started = Instant::now();
    let outcome = player.play_file(&path);
    let waited = started.elapsed();
    drop(player);

    assert_eq!(outcome, PlayOutcome::Interrupted);
    assert!(waited < Duration::from_millis(2500), "waited {:?}", waited);
    assert_eq!(count(&log, &Call::InitDevice), 1);
    assert_eq!(count(&log, &Call::UnloadSound), 1);
    assert_eq!(count(&log, &Call::CloseDevice), 1);
    assert_eq!(count(&log, &Call::UnloadWave), 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Playing sound [5.00 sec.]"));
    assert!(!text.contains("[100%]"));
}

#[test]
fn test_device_failure_still_closes_and_releases() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "tone.wav", 20);

    let log = Log::default();
    let mut backend = RecordingBackend::new(log.clone());
    backend.device_fails = true;
    let mut player = Player::new(backend, no_keys, Vec::new(), &config());

    assert_eq!(player.play_file(&path), PlayOutcome::DeviceUnavailable);
    assert!(player.backend().device_fails);
    assert!(Rc::ptr_eq(&player.backend().log, &log));
    assert_eq!(
        *log.borrow(),
        vec![
            Call::LoadWave(path.clone()),
            Call::InitDevice,
            Call::CloseDevice,
            Call::UnloadWave,
        ]
    );
}

#[test]
fn test_run_without_arguments_does_nothing() {
    let log = Log::default();
    let mut player = Player::new(RecordingBackend::new(log.clone()), no_keys, Vec::new(), &config());

    assert_eq!(cli::run(["termplay"], &mut player), None);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_run_plays_first_argument_only() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "first.wav", 10);

    let log = Log::default();
    let mut player = Player::new(RecordingBackend::new(log.clone()), no_keys, Vec::new(), &config());

    let args = [
        "termplay".to_string(),
        path.to_string_lossy().into_owned(),
        "ignored.wav".to_string(),
    ];
    assert_eq!(cli::run(args, &mut player), Some(PlayOutcome::Finished));
    assert_eq!(count(&log, &Call::LoadWave(path.clone())), 1);
    assert_eq!(log.borrow().len(), 7);
}
