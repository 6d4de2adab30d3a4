use rubato::{Resampler as RubatoResampler, Fft, FixedSync};
use audioadapter_buffers::direct::SequentialSliceOfVecs;

use crate::error::{PlayerError, Result};

fn resample_err<E: std::fmt::Display>(err: E) -> PlayerError {
    PlayerError::ResampleError(err.to_string())
}

/// Interleaved wrapper around rubato's FFT resampler.
pub struct Resampler {
    resampler: Fft<f32>,
    channels: usize,
    chunk_size: usize,
    source_rate: u32,
    target_rate: u32,
    buffer: Vec<f32>,
}

impl Resampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        let resampler = Fft::<f32>::new(
            source_sample_rate as usize,
            target_sample_rate as usize,
            chunk_size,
            2,
            channels,
            FixedSync::Input,
        )
        .map_err(resample_err)?;
        // rubato may round the chunk to fit the rate ratio.
        let chunk_size = resampler.input_frames_next();

        Ok(Self {
            resampler,
            channels,
            chunk_size,
            source_rate: source_sample_rate,
            target_rate: target_sample_rate,
            buffer: Vec::with_capacity(chunk_size * channels),
        })
    }

    /// Resamples whole chunks of `input`; a trailing partial chunk is kept
    /// for the next call or for `flush`.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let block = self.chunk_size * self.channels;
        let mut all_output = Vec::new();
        let mut input = input;

        // Top up the pending partial chunk first.
        if !self.buffer.is_empty() {
            let take = (block - self.buffer.len()).min(input.len());
            self.buffer.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.buffer.len() < block {
                return Ok(all_output);
            }
            let chunk = std::mem::take(&mut self.buffer);
            self.process_chunk(&chunk, &mut all_output)?;
        }

        let mut chunks = input.chunks_exact(block);
        for chunk in &mut chunks {
            self.process_chunk(chunk, &mut all_output)?;
        }
        self.buffer.extend_from_slice(chunks.remainder());

        Ok(all_output)
    }

    fn process_chunk(&mut self, chunk: &[f32], all_output: &mut Vec<f32>) -> Result<()> {
        let num_frames = self.chunk_size;

        let mut input_buffer = vec![vec![0.0; num_frames]; self.channels];
        for i in 0..num_frames {
            for ch in 0..self.channels {
                input_buffer[ch][i] = chunk[i * self.channels + ch];
            }
        }

        let out_len = self.resampler.output_frames_next();
        let mut output_buffer = vec![vec![0.0; out_len]; self.channels];

        let input_adapter = SequentialSliceOfVecs::new(&input_buffer, self.channels, num_frames)
            .map_err(resample_err)?;
        let mut output_adapter = SequentialSliceOfVecs::new_mut(&mut output_buffer, self.channels, out_len)
            .map_err(resample_err)?;

        self.resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(resample_err)?;

        all_output.reserve(out_len * self.channels);
        for i in 0..out_len {
            for ch in 0..self.channels {
                all_output.push(output_buffer[ch][i]);
            }
        }
        Ok(())
    }

    /// Pads the pending partial chunk with silence and pushes it through.
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.buffer.is_empty() {
            return Ok(Vec::new());
        }

        let remaining_frames = self.buffer.len() / self.channels;
        let padding_needed = (self.chunk_size - remaining_frames) * self.channels;
        self.buffer.extend(vec![0.0; padding_needed]);

        self.process(&[])
    }

    /// Resamples a complete interleaved signal, trimming the silence padding
    /// so the result has the length the rate ratio predicts.
    pub fn process_all(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let mut output = self.process(input)?;
        output.extend(self.flush()?);

        let in_frames = (input.len() / self.channels) as u64;
        let expected_frames = in_frames * self.target_rate as u64 / self.source_rate as u64;
        output.truncate(expected_frames as usize * self.channels);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsampling_scales_length_by_ratio() {
        let mut resampler = Resampler::new(22050, 44100, 1, 1024).unwrap();
        let input = vec![0.25f32; 22050];
        let output = resampler.process_all(&input).unwrap();
        assert_eq!(output.len(), 44100);
    }

    #[test]
    fn keeps_channels_interleaved() {
        let mut resampler = Resampler::new(48000, 44100, 2, 1024).unwrap();
        let input = vec![0.0f32; 48000 * 2];
        let output = resampler.process_all(&input).unwrap();
        assert_eq!(output.len(), 44100 * 2);
        assert_eq!(output.len() % 2, 0);
    }

    #[test]
    fn piecewise_input_matches_one_shot() {
        let input: Vec<f32> = (0..44100 * 2).map(|i| ((i % 200) as f32 / 100.0) - 1.0).collect();

        let mut whole = Resampler::new(44100, 48000, 2, 1024).unwrap();
        let expected = whole.process_all(&input).unwrap();

        let mut pieces = Resampler::new(44100, 48000, 2, 1024).unwrap();
        let mut output = Vec::new();
        for piece in input.chunks(1234) {
            output.extend(pieces.process(piece).unwrap());
        }
        output.extend(pieces.flush().unwrap());
        output.truncate(expected.len());

        assert_eq!(output, expected);
    }

    #[test]
    fn long_stereo_track_resamples_in_linear_time() {
        let secs = 180;
        let input = vec![0.1f32; 44100 * 2 * secs];
        let mut resampler = Resampler::new(44100, 48000, 2, 1024).unwrap();

        let started = std::time::Instant::now();
        let output = resampler.process_all(&input).unwrap();
        let took = started.elapsed();

        assert_eq!(output.len(), 48000 * 2 * secs);
        assert!(took < std::time::Duration::from_secs(30), "took {:?}", took);
    }

    #[test]
    fn flush_without_pending_input_is_empty() {
        let mut resampler = Resampler::new(44100, 48000, 2, 1024).unwrap();
        assert!(resampler.flush().unwrap().is_empty());
    }
}
