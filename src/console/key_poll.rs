use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tracing::{debug, warn};

pub const KEY_ENTER: char = '\r';
pub const KEY_ESCAPE: char = '\x1b';
/// Ctrl+C. Raw mode delivers it as a key instead of SIGINT; termination
/// signals are reported as this key too.
pub const KEY_INTERRUPT: char = '\x03';

/// Non-blocking keyboard check.
pub trait KeyPoll {
    /// Returns immediately; true when a key is waiting to be read.
    fn key_available(&mut self) -> bool;

    /// Consumes one buffered key, without echo.
    fn read_key(&mut self) -> Option<char>;
}

/// Fallback for hosts without a controllable terminal: never reports a key.
#[derive(Debug, Default)]
pub struct NoKeys;

impl KeyPoll for NoKeys {
    fn key_available(&mut self) -> bool {
        false
    }

    fn read_key(&mut self) -> Option<char> {
        None
    }
}

/// Raw-mode keyboard reader. The terminal's previous mode is restored when
/// this value is dropped, including during unwinding.
pub struct TerminalKeys {
    pending: Option<char>,
    was_raw: bool,
}

impl TerminalKeys {
    pub fn new() -> io::Result<Self> {
        let was_raw = terminal::is_raw_mode_enabled()?;
        if !was_raw {
            terminal::enable_raw_mode()?;
        }
        Ok(Self {
            pending: None,
            was_raw,
        })
    }
}

impl KeyPoll for TerminalKeys {
    fn key_available(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }

        // process all enqueued events, skipping the ones that are not keys
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if let Some(c) = key_char(&key) {
                            self.pending = Some(c);
                            return true;
                        }
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Failed to read terminal event: {}", e);
                        return false;
                    }
                },
                Ok(false) => return false,
                Err(e) => {
                    warn!("Failed to poll terminal: {}", e);
                    return false;
                }
            }
        }
    }

    fn read_key(&mut self) -> Option<char> {
        if self.pending.is_none() {
            self.key_available();
        }
        self.pending.take()
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if !self.was_raw {
            if let Err(e) = terminal::disable_raw_mode() {
                warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}

/// Pending termination request, shared with the signal handler.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// Routes SIGINT, SIGTERM and SIGHUP to this flag so playback ends through
    /// the normal teardown and the terminal mode is restored. A second signal
    /// that arrives before the first was seen exits the process at once.
    /// Only one handler can be installed per process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.raise() {
                std::process::exit(130);
            }
        })
    }

    /// Marks an interrupt; returns whether one was already pending.
    pub fn raise(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    /// Clears and returns the pending interrupt.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Wraps a key reader so a raised [`InterruptFlag`] reads as [`KEY_INTERRUPT`].
pub struct Interruptible<K> {
    inner: K,
    interrupt: InterruptFlag,
    pending: bool,
}

impl<K: KeyPoll> Interruptible<K> {
    pub fn new(inner: K, interrupt: InterruptFlag) -> Self {
        Self {
            inner,
            interrupt,
            pending: false,
        }
    }
}

impl<K: KeyPoll> KeyPoll for Interruptible<K> {
    fn key_available(&mut self) -> bool {
        if !self.pending && self.interrupt.take() {
            self.pending = true;
        }
        self.pending || self.inner.key_available()
    }

    fn read_key(&mut self) -> Option<char> {
        if self.pending || self.interrupt.take() {
            self.pending = false;
            return Some(KEY_INTERRUPT);
        }
        self.inner.read_key()
    }
}

/// Maps a key press to the character a cooked terminal would have produced.
pub fn key_char(key: &KeyEvent) -> Option<char> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Enter => Some(KEY_ENTER),
        KeyCode::Esc => Some(KEY_ESCAPE),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(KEY_INTERRUPT),
        KeyCode::Char(c) => Some(c),
        KeyCode::Tab => Some('\t'),
        KeyCode::Backspace => Some('\x08'),
        _ => None,
    }
}

/// Keys that end the countdown early.
pub fn is_exit_key(key: char) -> bool {
    matches!(key, KEY_ENTER | KEY_ESCAPE | KEY_INTERRUPT)
}

/// Picks the key reader for this process: raw terminal input when stdin is
/// an interactive terminal, otherwise [`NoKeys`]. Either way a raised
/// `interrupt` ends the wait.
pub fn detect(interrupt: &InterruptFlag) -> Box<dyn KeyPoll> {
    if !io::stdin().is_terminal() {
        debug!("stdin is not a terminal, key polling disabled");
        return Box::new(Interruptible::new(NoKeys, interrupt.clone()));
    }

    match TerminalKeys::new() {
        Ok(keys) => Box::new(Interruptible::new(keys, interrupt.clone())),
        Err(e) => {
            warn!("Raw terminal mode unavailable, key polling disabled: {}", e);
            Box::new(Interruptible::new(NoKeys, interrupt.clone()))
        }
    }
}
