use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

/// Represents the current playback state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Stopped = 0,
    Playing = 1,
}

impl From<u8> for PlaybackState {
    fn from(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            _ => PlaybackState::Stopped,
        }
    }
}

/// Shared timing state between the engine and the output callback.
/// Everything is atomic so the real-time callback never takes a lock.
pub struct Clock {
    /// Samples handed to the device since playback started.
    sample_pos: AtomicU64,
    /// Device sample rate.
    sample_rate: AtomicU64,
    /// Device channel count.
    channels: AtomicU32,
    /// Current state of playback (stored as u8 for atomicity).
    state: AtomicU8,
    /// Flag to signal the buffer should be cleared.
    clear_buffer: AtomicBool,
    /// Set once the feeder has queued the last sample.
    end_of_stream: AtomicBool,
}

impl Clock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_pos: AtomicU64::new(0),
            sample_rate: AtomicU64::new(sample_rate as u64),
            channels: AtomicU32::new(2),
            state: AtomicU8::new(PlaybackState::Stopped as u8),
            clear_buffer: AtomicBool::new(false),
            end_of_stream: AtomicBool::new(false),
        }
    }

    pub fn get_sample_pos(&self) -> u64 {
        self.sample_pos.load(Ordering::Relaxed)
    }

    pub fn set_sample_pos(&self, pos: u64) {
        self.sample_pos.store(pos, Ordering::SeqCst);
    }

    /// Advances the position; ignored unless playing.
    pub fn increment_samples(&self, amount: u64) {
        if self.get_state() == PlaybackState::Playing {
            self.sample_pos.fetch_add(amount, Ordering::Relaxed);
        }
    }

    /// Returns the current playback position in seconds.
    pub fn get_time_secs(&self) -> f64 {
        let pos = self.get_sample_pos() as f64;
        let rate = self.sample_rate.load(Ordering::Relaxed) as f64;
        let channels = self.get_channels() as f64;
        if rate > 0.0 && channels > 0.0 {
            pos / (rate * channels)
        } else {
            0.0
        }
    }

    pub fn get_state(&self) -> PlaybackState {
        PlaybackState::from(self.state.load(Ordering::Relaxed))
    }

    pub fn set_state(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate as u64, Ordering::SeqCst);
    }

    pub fn get_sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed) as u32
    }

    pub fn set_channels(&self, channels: u32) {
        self.channels.store(channels, Ordering::SeqCst);
    }

    pub fn get_channels(&self) -> u32 {
        self.channels.load(Ordering::Relaxed)
    }

    pub fn signal_clear_buffer(&self) {
        self.clear_buffer.store(true, Ordering::SeqCst);
    }

    pub fn should_clear_buffer(&self) -> bool {
        self.clear_buffer.load(Ordering::Relaxed)
    }

    pub fn reset_clear_buffer(&self) {
        self.clear_buffer.store(false, Ordering::SeqCst);
    }

    pub fn set_eos(&self, eos: bool) {
        self.end_of_stream.store(eos, Ordering::SeqCst);
    }

    pub fn is_eos(&self) -> bool {
        self.end_of_stream.load(Ordering::Relaxed)
    }
}
