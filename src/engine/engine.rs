use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::PlayerConfig;
use crate::engine::clock::{Clock, PlaybackState};
use crate::engine::output::{device::AudioDevice, AudioOutput};
use crate::engine::sound::Sound;
use crate::engine::wave::Wave;
use crate::engine::AudioBackend;
use crate::error::{PlayerError, Result};

/// cpal-backed engine. Nothing touches the audio host until `init_device`.
pub struct AudioEngine {
    clock: Arc<Clock>,
    device: AudioDevice,
    resample_chunk: usize,
}

impl AudioEngine {
    pub fn new(config: &PlayerConfig) -> Self {
        let clock = Arc::new(Clock::new(44100)); // Default, will be updated by output
        let device = AudioDevice::new(clock.clone(), config.buffer_secs);

        Self {
            clock,
            device,
            resample_chunk: config.resample_chunk,
        }
    }

    fn stop_sound(&mut self, sound: &mut Sound) {
        self.clock.set_state(PlaybackState::Stopped);
        self.clock.signal_clear_buffer();
        if let Err(e) = self.device.stop() {
            warn!("Failed to pause output: {}", e);
        }

        if let Some((generation, producer)) = sound.stop_feeder() {
            self.device.restore_producer(generation, producer);
        }
        debug!(position_secs = self.clock.get_time_secs(), "sound stopped");
    }
}

impl AudioBackend for AudioEngine {
    type Sound = Sound;

    fn load_wave(&mut self, path: &Path) -> Result<Wave> {
        Wave::load(path)
    }

    fn init_device(&mut self) -> Result<()> {
        self.device.init()
    }

    fn close_device(&mut self) {
        self.device.close();
    }

    fn load_sound(&mut self, wave: &Wave) -> Result<Sound> {
        if !self.device.is_open() {
            return Err(PlayerError::DeviceClosed);
        }
        let clock = self.device.clock();
        Sound::from_wave(wave, clock.get_sample_rate(), clock.get_channels(), self.resample_chunk)
    }

    fn play_sound(&mut self, sound: &mut Sound) -> Result<()> {
        if let Some((generation, producer)) = sound.stop_feeder() {
            self.device.restore_producer(generation, producer);
        }
        let (generation, producer) = self.device.lease_producer()?;

        self.clock.set_state(PlaybackState::Stopped);
        self.clock.set_sample_pos(0);
        sound.start_feeder(generation, producer, self.clock.clone());

        self.clock.set_state(PlaybackState::Playing);
        self.device.start()?;
        debug!(duration_ms = sound.duration_ms(), "sound playing");
        Ok(())
    }

    fn unload_sound(&mut self, mut sound: Sound) {
        self.stop_sound(&mut sound);
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.device.close();
    }
}
