pub mod countdown;
pub mod key_poll;
pub mod progress;
