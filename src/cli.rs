use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use crate::console::key_poll::KeyPoll;
use crate::engine::AudioBackend;
use crate::player::{PlayOutcome, Player};

/// Command-line arguments for termplay
#[derive(Parser, Debug)]
#[command(name = "termplay")]
#[command(about = "Play an audio file in the console. Press ENTER or ESC to stop.")]
#[command(version)]
pub struct Cli {
    /// Audio file to play (WAV, OGG, FLAC, MP3)
    #[arg(allow_hyphen_values = true)]
    pub path: Option<PathBuf>,

    /// Anything after the path is ignored
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

/// Parses `args` and plays the first positional path. Returns `None` when
/// there is nothing to play; help, version and parse errors are printed and
/// also yield `None`.
pub fn run<I, T, B, K, W>(args: I, player: &mut Player<B, K, W>) -> Option<PlayOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    B: AudioBackend,
    K: FnMut() -> Box<dyn KeyPoll>,
    W: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return None;
        }
    };

    let path = cli.path?;
    let outcome = player.play_file(&path);
    debug!(?outcome, path = %path.display(), "done");
    Some(outcome)
}
