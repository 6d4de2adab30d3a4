use std::path::Path;
use tracing::debug;

use crate::engine::decoder::{symphonia_decoder::SymphoniaDecoder, AudioDecoder};
use crate::error::{PlayerError, Result};

/// Fully decoded audio held in memory as interleaved `f32` samples.
#[derive(Debug, Clone)]
pub struct Wave {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u32,
    bits_per_sample: Option<u32>,
}

impl Wave {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            bits_per_sample: None,
        }
    }

    /// Decodes the whole file at `path`. A stream that yields no samples is
    /// reported as [`PlayerError::EmptyStream`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut decoder = SymphoniaDecoder::new(path)?;
        // Every supported format spends at least one byte per sample
        let max_prealloc = std::fs::metadata(path)
            .map(|meta| meta.len() as usize)
            .unwrap_or(0);
        let wave = Self::decode_all(&mut decoder, max_prealloc);
        if wave.samples.is_empty() {
            return Err(PlayerError::EmptyStream(path.to_path_buf()));
        }
        debug!(
            path = %path.display(),
            samples = wave.samples.len(),
            duration_ms = wave.duration_ms(),
            "wave loaded"
        );
        Ok(wave)
    }

    /// Drains `decoder` into a wave. The header's frame count only sizes the
    /// initial allocation, capped at `max_prealloc` samples.
    pub fn decode_all<D: AudioDecoder>(decoder: &mut D, max_prealloc: usize) -> Self {
        let capacity = decoder
            .frames_hint()
            .map(|frames| (frames as usize).saturating_mul(decoder.channels() as usize))
            .unwrap_or(0)
            .min(max_prealloc);

        let mut samples = Vec::new();
        if let Err(e) = samples.try_reserve(capacity) {
            debug!(capacity, "skipping pre-allocation: {}", e);
        }
        while let Some(block) = decoder.decode_next() {
            samples.extend_from_slice(&block);
        }

        // Rate and layout may only be known once a packet has been decoded
        Self {
            samples,
            sample_rate: decoder.sample_rate(),
            channels: decoder.channels(),
            bits_per_sample: decoder.bits_per_sample(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Interleaved sample count (frames times channels).
    pub fn sample_count(&self) -> u64 {
        self.samples.len() as u64
    }

    pub fn frame_count(&self) -> u64 {
        if self.channels == 0 {
            0
        } else {
            self.sample_count() / self.channels as u64
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> Option<u32> {
        self.bits_per_sample
    }

    pub fn duration_ms(&self) -> u64 {
        duration_ms(self.sample_count(), self.sample_rate, self.channels)
    }
}

/// Playback length of `sample_count` interleaved samples, truncated toward
/// zero. Returns 0 when the rate or channel count is zero.
pub fn duration_ms(sample_count: u64, sample_rate: u32, channels: u32) -> u64 {
    let per_second = sample_rate as u64 * channels as u64;
    if per_second == 0 {
        return 0;
    }
    sample_count.saturating_mul(1000) / per_second
}
