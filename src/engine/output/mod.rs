pub mod cpal_backend;
pub mod device;

use crate::error::Result;

pub trait AudioOutput {
    /// Starts the audio output stream.
    fn start(&mut self) -> Result<()>;

    /// Stops the audio output stream.
    fn stop(&mut self) -> Result<()>;
}
