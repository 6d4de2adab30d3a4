use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::buffer::AudioBufferProducer;
use crate::engine::clock::{Clock, PlaybackState};
use crate::engine::output::{cpal_backend::CpalBackend, AudioOutput};
use crate::error::{PlayerError, Result};

/// Owns the output stream and the producing end of its ring buffer between
/// `init` and `close`.
pub struct AudioDevice {
    backend: Option<CpalBackend>,
    producer: Option<AudioBufferProducer>,
    clock: Arc<Clock>,
    buffer_secs: f32,
    /// Bumped on every successful open so stale producers are never reused.
    generation: u64,
}

impl AudioDevice {
    pub fn new(clock: Arc<Clock>, buffer_secs: f32) -> Self {
        Self {
            backend: None,
            producer: None,
            clock,
            buffer_secs,
            generation: 0,
        }
    }

    /// Opens the default output device. Calling it on an open device is a
    /// no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.backend.is_some() {
            return Ok(());
        }

        let (backend, producer) = CpalBackend::open(self.clock.clone(), self.buffer_secs)?;
        self.backend = Some(backend);
        self.producer = Some(producer);
        self.generation += 1;
        debug!(generation = self.generation, "audio device opened");
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            self.clock.set_state(PlaybackState::Stopped);
            if let Err(e) = backend.stop() {
                warn!("Failed to pause stream on close: {}", e);
            }
            if !backend.is_healthy() {
                warn!("Output stream reported errors during playback");
            }
            debug!(generation = self.generation, "audio device closed");
        }
        self.producer = None;
    }

    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    pub fn clock(&self) -> &Arc<Clock> {
        &self.clock
    }

    /// Hands out the ring buffer producer together with the generation it
    /// belongs to.
    pub fn lease_producer(&mut self) -> Result<(u64, AudioBufferProducer)> {
        if self.backend.is_none() {
            return Err(PlayerError::DeviceClosed);
        }
        let producer = self
            .producer
            .take()
            .ok_or_else(|| PlayerError::DeviceError("Producer already in use".into()))?;
        Ok((self.generation, producer))
    }

    /// Takes a leased producer back; producers from a previous open are dropped.
    pub fn restore_producer(&mut self, generation: u64, producer: AudioBufferProducer) {
        if self.backend.is_some() && generation == self.generation && self.producer.is_none() {
            self.producer = Some(producer);
        }
    }
}

impl AudioOutput for AudioDevice {
    fn start(&mut self) -> Result<()> {
        match &mut self.backend {
            Some(backend) => backend.start(),
            None => Err(PlayerError::DeviceClosed),
        }
    }

    fn stop(&mut self) -> Result<()> {
        match &mut self.backend {
            Some(backend) => backend.stop(),
            None => Ok(()),
        }
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.close();
    }
}
