use std::time::Duration;

/// Tunables for the console player. Nothing here is read from flags or the
/// environment; the binary always runs with `PlayerConfig::default()`.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Number of cells in the progress bar.
    pub bar_width: usize,
    /// Sleep between key/timer polls while waiting.
    pub poll_interval: Duration,
    /// Ring buffer capacity, in seconds of device audio.
    pub buffer_secs: f32,
    /// Frames per resampler chunk.
    pub resample_chunk: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            bar_width: 50,
            poll_interval: Duration::from_millis(5),
            buffer_secs: 1.0,
            resample_chunk: 1024,
        }
    }
}
