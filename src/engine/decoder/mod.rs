pub mod symphonia_decoder;

pub trait AudioDecoder {
    /// Decodes the next block of interleaved audio data.
    /// Returns None when the end of the stream is reached.
    fn decode_next(&mut self) -> Option<Vec<f32>>;

    /// Returns the sample rate of the audio.
    fn sample_rate(&self) -> u32;

    /// Returns the number of channels.
    fn channels(&self) -> u32;

    /// Bit depth reported by the container, if any.
    fn bits_per_sample(&self) -> Option<u32>;

    /// Total number of frames, if the container reports it.
    fn frames_hint(&self) -> Option<u64>;
}
