use std::io;
use std::process::ExitCode;

use termplay::console::key_poll::{self, InterruptFlag};
use termplay::engine::AudioEngine;
use termplay::{cli, Player, PlayerConfig};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries the player display
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let interrupt = InterruptFlag::default();
    if let Err(e) = interrupt.install() {
        warn!("Failed to install signal handler: {}", e);
    }

    let config = PlayerConfig::default();
    let keys = move || key_poll::detect(&interrupt);
    let mut player = Player::new(AudioEngine::new(&config), keys, io::stdout(), &config);

    cli::run(std::env::args_os(), &mut player);

    ExitCode::SUCCESS
}
