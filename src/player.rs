use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PlayerConfig;
use crate::console::countdown::{Countdown, WaitOutcome};
use crate::console::key_poll::KeyPoll;
use crate::engine::wave::Wave;
use crate::engine::AudioBackend;

const BANNER: &str = "\
//////////////////////////////////////////////////////////////////////
//                                                                  //
// termplay - console audio player                                  //
//                                                                  //
// WAV, OGG, FLAC and MP3 are decoded in memory and played on the   //
// default output device.                                           //
//                                                                  //
//////////////////////////////////////////////////////////////////////
";

/// How a `play_file` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The file could not be decoded; no device was opened.
    NotLoaded,
    /// The output device or sound could not be set up.
    DeviceUnavailable,
    /// The wait ran for the whole clip.
    Finished,
    /// An exit key ended the wait.
    Interrupted,
}

/// Playback driver: decode, open the device, play, wait, tear down.
pub struct Player<B, K, W> {
    backend: B,
    keys: K,
    out: W,
    countdown: Countdown,
}

impl<B, K, W> Player<B, K, W>
where
    B: AudioBackend,
    K: FnMut() -> Box<dyn KeyPoll>,
    W: Write,
{
    /// `keys` is called once per playback, right before the wait, so raw
    /// terminal mode is only held while the progress bar runs.
    pub fn new(backend: B, keys: K, out: W, config: &PlayerConfig) -> Self {
        Self {
            backend,
            keys,
            out,
            countdown: Countdown::new(config),
        }
    }

    /// The collaborator this player drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn play_file(&mut self, path: &Path) -> PlayOutcome {
        let wave = match self.backend.load_wave(path) {
            Ok(wave) => wave,
            Err(e) => {
                warn!("Could not load {}: {}", path.display(), e);
                return PlayOutcome::NotLoaded;
            }
        };
        let duration_ms = wave.duration_ms();

        let outcome = match self.backend.init_device() {
            Ok(()) => self.play_on_device(&wave, duration_ms),
            Err(e) => {
                warn!("Could not open audio device: {}", e);
                PlayOutcome::DeviceUnavailable
            }
        };

        self.backend.close_device();
        self.backend.unload_wave(wave);
        outcome
    }

    fn play_on_device(&mut self, wave: &Wave, duration_ms: u64) -> PlayOutcome {
        let mut sound = match self.backend.load_sound(wave) {
            Ok(sound) => sound,
            Err(e) => {
                warn!("Could not prepare sound: {}", e);
                return PlayOutcome::DeviceUnavailable;
            }
        };

        self.print_header(duration_ms);

        if let Err(e) = self.backend.play_sound(&mut sound) {
            // The countdown still runs so the console behaves the same.
            warn!("Could not start playback: {}", e);
        }

        let waited = {
            let mut keys = (self.keys)();
            self.countdown
                .wait(Duration::from_millis(duration_ms), keys.as_mut(), &mut self.out)
        };

        self.backend.unload_sound(sound);

        match waited {
            Ok(WaitOutcome::Completed) => PlayOutcome::Finished,
            Ok(WaitOutcome::EarlyExit) => {
                debug!("playback interrupted by key");
                PlayOutcome::Interrupted
            }
            Err(e) => {
                warn!("Console output failed: {}", e);
                PlayOutcome::Interrupted
            }
        }
    }

    fn print_header(&mut self, duration_ms: u64) {
        let written = write!(
            self.out,
            "\n{}\nPlaying sound [{:.2} sec.]. Press ENTER to finish.\n",
            BANNER,
            duration_ms as f64 / 1000.0
        )
        .and_then(|()| self.out.flush());
        if let Err(e) = written {
            warn!("Console output failed: {}", e);
        }
    }
}
