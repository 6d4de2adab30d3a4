pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod player;

pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use player::{PlayOutcome, Player};
