use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

use crate::engine::buffer::AudioBufferProducer;
use crate::engine::clock::Clock;
use crate::engine::dsp::{channel_map, resampler::Resampler};
use crate::engine::wave::{self, Wave};
use crate::error::Result;

/// Minimum free space before the feeder pushes again.
const FEED_BLOCK: usize = 1024;

struct Feeder {
    handle: JoinHandle<AudioBufferProducer>,
    stop: Arc<AtomicBool>,
    generation: u64,
}

/// Playback handle: a wave converted to the device format, plus the thread
/// that streams it into the output ring buffer while playing.
pub struct Sound {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u32,
    feeder: Option<Feeder>,
}

impl Sound {
    /// Converts `wave` to `sample_rate`/`channels`.
    pub fn from_wave(wave: &Wave, sample_rate: u32, channels: u32, resample_chunk: usize) -> Result<Self> {
        let mut samples = channel_map::remix(wave.samples(), wave.channels() as usize, channels as usize);

        if wave.sample_rate() != sample_rate && !samples.is_empty() {
            debug!(
                "Resampling {}Hz -> {}Hz, {}ch -> {}ch",
                wave.sample_rate(),
                sample_rate,
                wave.channels(),
                channels
            );
            let mut resampler = Resampler::new(wave.sample_rate(), sample_rate, channels as usize, resample_chunk)?;
            samples = resampler.process_all(&samples)?;
        }

        Ok(Self {
            samples: samples.into(),
            sample_rate,
            channels,
            feeder: None,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn duration_ms(&self) -> u64 {
        wave::duration_ms(self.samples.len() as u64, self.sample_rate, self.channels)
    }

    pub fn is_feeding(&self) -> bool {
        self.feeder.as_ref().is_some_and(|f| !f.handle.is_finished())
    }

    /// Spawns the feeder thread. Any previous feeder is stopped first and its
    /// producer is dropped.
    pub(crate) fn start_feeder(&mut self, generation: u64, mut producer: AudioBufferProducer, clock: Arc<Clock>) {
        let _ = self.stop_feeder();

        let samples = self.samples.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        clock.set_eos(false);
        let handle = thread::spawn(move || {
            let mut pushed = 0;
            while pushed < samples.len() {
                if stop_flag.load(Ordering::Relaxed) {
                    return producer;
                }

                // Wait out a pending clear so it cannot discard fresh samples,
                // and sleep briefly while the buffer is full.
                if clock.should_clear_buffer()
                    || producer.vacant_len() < FEED_BLOCK.min(samples.len() - pushed)
                {
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }

                pushed += producer.push_slice(&samples[pushed..]);
            }
            clock.set_eos(true);
            producer
        });

        self.feeder = Some(Feeder {
            handle,
            stop,
            generation,
        });
    }

    /// Stops and joins the feeder, returning the producer it held.
    pub(crate) fn stop_feeder(&mut self) -> Option<(u64, AudioBufferProducer)> {
        let feeder = self.feeder.take()?;
        feeder.stop.store(true, Ordering::SeqCst);
        match feeder.handle.join() {
            Ok(producer) => Some((feeder.generation, producer)),
            Err(_) => {
                warn!("Sound feeder thread panicked");
                None
            }
        }
    }
}

impl Drop for Sound {
    fn drop(&mut self) {
        let _ = self.stop_feeder();
    }
}
