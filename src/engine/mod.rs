pub mod buffer;
pub mod clock;
pub mod decoder;
pub mod dsp;
pub mod engine;
pub mod output;
pub mod sound;
pub mod wave;

use std::path::Path;

use crate::engine::wave::Wave;
use crate::error::Result;

pub use crate::engine::engine::AudioEngine;

/// Decode and playback operations the player drives, in the order it drives
/// them. Implemented by [`AudioEngine`] over cpal; tests substitute a
/// recording fake.
pub trait AudioBackend {
    /// Playback handle bound to a loaded wave.
    type Sound;

    /// Decodes the file at `path` into memory.
    fn load_wave(&mut self, path: &Path) -> Result<Wave>;

    /// Opens the output device. Safe to call on an open device.
    fn init_device(&mut self) -> Result<()>;

    /// Closes the output device. Safe to call on a closed device.
    fn close_device(&mut self);

    /// Prepares `wave` for playback on the open device.
    fn load_sound(&mut self, wave: &Wave) -> Result<Self::Sound>;

    /// Starts playback without blocking.
    fn play_sound(&mut self, sound: &mut Self::Sound) -> Result<()>;

    /// Stops playback and releases the handle.
    fn unload_sound(&mut self, sound: Self::Sound);

    /// Releases decoded sample memory.
    fn unload_wave(&mut self, wave: Wave) {
        drop(wave);
    }
}
