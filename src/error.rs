use std::path::PathBuf;
use thiserror::Error;

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    /// File could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Probe or decode failure reported by symphonia
    #[error("Unsupported or corrupt audio: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No supported audio tracks found")]
    NoTrack,

    /// The stream decoded to zero samples
    #[error("No audio data decoded from {0}")]
    EmptyStream(PathBuf),

    #[error("Audio device not found")]
    DeviceNotFound,

    #[error("Audio device is not open")]
    DeviceClosed,

    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play stream: {0}")]
    PlayError(String),

    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),
}

impl From<cpal::BuildStreamError> for PlayerError {
    fn from(err: cpal::BuildStreamError) -> Self {
        PlayerError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for PlayerError {
    fn from(err: cpal::PlayStreamError) -> Self {
        PlayerError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for PlayerError {
    fn from(err: cpal::PauseStreamError) -> Self {
        PlayerError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for PlayerError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        PlayerError::DeviceError(err.to_string())
    }
}
