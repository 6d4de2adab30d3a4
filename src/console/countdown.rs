use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::PlayerConfig;
use crate::console::key_poll::{is_exit_key, KeyPoll};
use crate::console::progress::{percent_complete, ProgressBar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Completed,
    /// An exit key ended the wait.
    EarlyExit,
}

impl WaitOutcome {
    pub fn is_early_exit(self) -> bool {
        self == WaitOutcome::EarlyExit
    }
}

/// Blocks for a clip's duration while drawing a progress bar, returning early
/// on Enter, Escape or Ctrl+C.
#[derive(Debug, Clone)]
pub struct Countdown {
    bar: ProgressBar,
    poll_interval: Duration,
}

impl Countdown {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            bar: ProgressBar::new(config.bar_width),
            poll_interval: config.poll_interval,
        }
    }

    pub fn wait<W: Write>(
        &self,
        duration: Duration,
        keys: &mut dyn KeyPoll,
        out: &mut W,
    ) -> io::Result<WaitOutcome> {
        if duration.is_zero() {
            return Ok(WaitOutcome::Completed);
        }

        let started = Instant::now();
        let mut last_percent = None;

        let outcome = loop {
            if keys.key_available() {
                if let Some(key) = keys.read_key() {
                    if is_exit_key(key) {
                        break WaitOutcome::EarlyExit;
                    }
                }
            }

            let elapsed = started.elapsed();
            let percent = percent_complete(elapsed, duration);
            if last_percent != Some(percent) {
                self.bar.draw(out, percent)?;
                last_percent = Some(percent);
            }

            if elapsed >= duration {
                break WaitOutcome::Completed;
            }

            thread::sleep(self.poll_interval.min(duration - elapsed));
        };

        // \r\n ends the line in raw mode as well
        out.write_all(b"\r\n\r\n")?;
        out.flush()?;

        debug!(?outcome, waited_ms = started.elapsed().as_millis() as u64, "countdown finished");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::key_poll::{NoKeys, KEY_ENTER, KEY_ESCAPE};

    /// Delivers each key once its offset from construction has passed.
    struct ScriptedKeys {
        started: Instant,
        script: Vec<(Duration, char)>,
    }

    impl ScriptedKeys {
        fn new(script: Vec<(Duration, char)>) -> Self {
            Self {
                started: Instant::now(),
                script,
            }
        }
    }

    impl KeyPoll for ScriptedKeys {
        fn key_available(&mut self) -> bool {
            self.script
                .first()
                .is_some_and(|(at, _)| self.started.elapsed() >= *at)
        }

        fn read_key(&mut self) -> Option<char> {
            if self.key_available() {
                Some(self.script.remove(0).1)
            } else {
                None
            }
        }
    }

    fn countdown() -> Countdown {
        Countdown::new(&PlayerConfig {
            poll_interval: Duration::from_millis(1),
            ..PlayerConfig::default()
        })
    }

    fn percents(output: &[u8]) -> Vec<u32> {
        let text = String::from_utf8_lossy(output);
        text.split('\r')
            .filter_map(|frame| {
                let start = frame.find("] [")? + 3;
                let end = frame.find("%]")?;
                frame[start..end].parse().ok()
            })
            .collect()
    }

    #[test]
    fn zero_duration_returns_immediately_without_output() {
        let mut out = Vec::new();
        let started = Instant::now();
        let outcome = countdown().wait(Duration::ZERO, &mut NoKeys, &mut out).unwrap();

        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(out.is_empty());
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn waits_for_the_full_duration_without_keys() {
        let mut out = Vec::new();
        let started = Instant::now();
        let outcome = countdown()
            .wait(Duration::from_millis(80), &mut NoKeys, &mut out)
            .unwrap();
        let waited = started.elapsed();

        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(waited >= Duration::from_millis(80));
        assert!(waited < Duration::from_millis(1000), "waited {:?}", waited);
        assert!(out.ends_with(b"[100%]\r\n\r\n"));
    }

    #[test]
    fn percent_never_decreases_and_hits_100_once() {
        let mut out = Vec::new();
        countdown()
            .wait(Duration::from_millis(60), &mut NoKeys, &mut out)
            .unwrap();

        let seen = percents(&out);
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "frames: {:?}", seen);
        assert_eq!(seen.last(), Some(&100));
        assert_eq!(seen.iter().filter(|p| **p == 100).count(), 1);
    }

    #[test]
    fn enter_stops_the_wait_early() {
        let mut out = Vec::new();
        let mut keys = ScriptedKeys::new(vec![(Duration::from_millis(30), KEY_ENTER)]);
        let started = Instant::now();
        let outcome = countdown()
            .wait(Duration::from_secs(5), &mut keys, &mut out)
            .unwrap();
        let waited = started.elapsed();

        assert_eq!(outcome, WaitOutcome::EarlyExit);
        assert!(outcome.is_early_exit());
        assert!(waited >= Duration::from_millis(30));
        assert!(waited < Duration::from_millis(1500), "waited {:?}", waited);
        assert!(!percents(&out).contains(&100));
        assert!(out.ends_with(b"\r\n\r\n"));
    }

    #[test]
    fn escape_stops_the_wait_early() {
        let mut out = Vec::new();
        let mut keys = ScriptedKeys::new(vec![(Duration::from_millis(10), KEY_ESCAPE)]);
        let outcome = countdown()
            .wait(Duration::from_secs(5), &mut keys, &mut out)
            .unwrap();
        assert_eq!(outcome, WaitOutcome::EarlyExit);
    }

    #[test]
    fn other_keys_are_consumed_and_ignored() {
        let mut out = Vec::new();
        let mut keys = ScriptedKeys::new(vec![
            (Duration::from_millis(5), 'q'),
            (Duration::from_millis(10), ' '),
        ]);
        let outcome = countdown()
            .wait(Duration::from_millis(50), &mut keys, &mut out)
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Completed);
        assert!(keys.script.is_empty());
    }
}
