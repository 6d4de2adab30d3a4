use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use crate::engine::buffer::{create_audio_buffer, AudioBufferConsumer, AudioBufferProducer};
use crate::engine::clock::{Clock, PlaybackState};
use crate::engine::output::AudioOutput;
use crate::error::{PlayerError, Result};

pub struct CpalBackend {
    stream: Stream,
    is_healthy: Arc<AtomicBool>,
}

impl CpalBackend {
    /// Opens the default output device and builds a stream that drains a
    /// fresh ring buffer sized to `buffer_secs` of device audio. The stream is
    /// created paused.
    pub fn open(clock: Arc<Clock>, buffer_secs: f32) -> Result<(Self, AudioBufferProducer)> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlayerError::DeviceNotFound)?;

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();

        clock.set_sample_rate(config.sample_rate);
        clock.set_channels(config.channels as u32);

        let capacity = ((config.sample_rate as f32 * config.channels as f32 * buffer_secs) as usize).max(1024);
        let (producer, consumer) = create_audio_buffer(capacity);

        let is_healthy = Arc::new(AtomicBool::new(true));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, clock, is_healthy.clone())?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, clock, is_healthy.clone())?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, clock, is_healthy.clone())?,
            other => return Err(PlayerError::UnsupportedFormat(format!("{other:?}"))),
        };
        // Some hosts start streams immediately on build.
        let _ = stream.pause();

        debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            ?sample_format,
            capacity,
            "output stream built"
        );

        Ok((Self { stream, is_healthy }, producer))
    }

    pub fn is_healthy(&self) -> bool {
        self.is_healthy.load(Ordering::SeqCst)
    }
}

impl AudioOutput for CpalBackend {
    fn start(&mut self) -> Result<()> {
        self.stream.play()?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stream.pause()?;
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: AudioBufferConsumer,
    clock: Arc<Clock>,
    is_healthy: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let err_fn = move |err: cpal::StreamError| {
        error!("Output stream error: {}", err);
        is_healthy.store(false, Ordering::SeqCst);
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| process_audio(data, &mut consumer, &clock),
        err_fn,
        None,
    )?;
    Ok(stream)
}

fn process_audio<T: Sample + FromSample<f32>>(
    data: &mut [T],
    consumer: &mut AudioBufferConsumer,
    clock: &Clock,
) {
    if clock.should_clear_buffer() {
        consumer.clear();
        clock.reset_clear_buffer();
    }

    if clock.get_state() != PlaybackState::Playing {
        for sample in data.iter_mut() {
            *sample = T::from_sample(0.0);
        }
        return;
    }

    let samples_read = consumer.pop_slice_f32(data);

    if samples_read < data.len() {
        for sample in &mut data[samples_read..] {
            *sample = T::from_sample(0.0);
        }
    }

    clock.increment_samples(samples_read as u64);

    if samples_read == 0 && clock.is_eos() {
        clock.set_state(PlaybackState::Stopped);
    }
}

trait ConsumerExt {
    fn pop_slice_f32<T: Sample + FromSample<f32>>(&mut self, data: &mut [T]) -> usize;
}

impl ConsumerExt for AudioBufferConsumer {
    fn pop_slice_f32<T: Sample + FromSample<f32>>(&mut self, data: &mut [T]) -> usize {
        let mut count = 0;
        for out in data.iter_mut() {
            if let Some(sample) = self.pop() {
                *out = T::from_sample(sample);
                count += 1;
            } else {
                break;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer::create_audio_buffer;

    #[test]
    fn silence_while_stopped() {
        let clock = Clock::new(48000);
        let (mut prod, mut cons) = create_audio_buffer(16);
        prod.push_slice(&[0.5; 8]);

        let mut out = [1.0f32; 4];
        process_audio(&mut out, &mut cons, &clock);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(cons.occupied_len(), 8);
    }

    #[test]
    fn drains_buffer_and_pads_with_silence() {
        let clock = Clock::new(48000);
        clock.set_state(PlaybackState::Playing);
        let (mut prod, mut cons) = create_audio_buffer(16);
        prod.push_slice(&[0.5, -0.5]);

        let mut out = [1.0f32; 4];
        process_audio(&mut out, &mut cons, &clock);
        assert_eq!(out, [0.5, -0.5, 0.0, 0.0]);
        assert_eq!(clock.get_sample_pos(), 2);
        assert_eq!(clock.get_state(), PlaybackState::Playing);
    }

    #[test]
    fn stops_once_drained_after_end_of_stream() {
        let clock = Clock::new(48000);
        clock.set_state(PlaybackState::Playing);
        clock.set_eos(true);
        let (_prod, mut cons) = create_audio_buffer(16);

        let mut out = [0i16; 4];
        process_audio(&mut out, &mut cons, &clock);
        assert_eq!(clock.get_state(), PlaybackState::Stopped);
    }

    #[test]
    fn clear_signal_discards_queued_samples() {
        let clock = Clock::new(48000);
        clock.set_state(PlaybackState::Playing);
        clock.signal_clear_buffer();
        let (mut prod, mut cons) = create_audio_buffer(16);
        prod.push_slice(&[0.5; 4]);

        let mut out = [1.0f32; 4];
        process_audio(&mut out, &mut cons, &clock);
        assert_eq!(out, [0.0; 4]);
        assert!(!clock.should_clear_buffer());
    }
}
