use crossterm::event::{KeyCode, KeyModifiers, poll, read};
use std::io;
use std::time::Duration;

/// Providing keyboard input independent of an implementation.
///
/// The memory subsystem uses [`KeyboardInputProvider::poll_input`] for the
/// memory-mapped status register, the GETC/IN traps use the blocking
/// [`KeyboardInputProvider::read_input`].
pub trait KeyboardInputProvider {
    /// Checks if input is available, does not block.
    ///
    /// # Errors
    /// - underlying terminal event source fails
    fn poll_input(&mut self) -> io::Result<bool>;
    /// Blocks until one character is available and returns it.
    ///
    /// # Errors
    /// - underlying terminal event source fails
    /// - [`io::ErrorKind::Interrupted`] if the user requested an abort
    fn read_input(&mut self) -> io::Result<u8>;
    /// True if CTRL-C was triggered.
    fn is_interrupted(&self) -> bool;
}

/// Keyboard input from an interactive terminal in raw mode.
///
/// Raw mode suppresses SIGINT, so CTRL-C arrives as an ordinary key event
/// and is latched into an interrupted flag instead of delivering input.
pub struct TerminalInputProvider {
    pending: Option<u8>,
    is_interrupted: bool,
}
impl TerminalInputProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            is_interrupted: false,
        }
    }

    /// Translates the next key press event to a byte, if it maps to one.
    fn next_key_byte(&mut self) -> io::Result<Option<u8>> {
        let event = read()?;
        if let Some(key) = event.as_key_press_event() {
            if key.code == KeyCode::Enter {
                return Ok(Some(b'\n'));
            }
            if let Some(c) = key.code.as_char() {
                if c == 'c' && key.modifiers == KeyModifiers::CONTROL {
                    self.is_interrupted = true;
                } else if c.is_ascii() {
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "guarded by is_ascii, the scalar value fits into one byte"
                    )]
                    return Ok(Some(c as u8));
                }
            }
        }
        Ok(None)
    }
}
impl Default for TerminalInputProvider {
    fn default() -> Self {
        Self::new()
    }
}
impl KeyboardInputProvider for TerminalInputProvider {
    fn poll_input(&mut self) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }
        if self.is_interrupted {
            return Ok(false);
        }
        if poll(Duration::from_secs(0))?
            && let Some(byte) = self.next_key_byte()?
        {
            self.pending = Some(byte);
            return Ok(true);
        }
        Ok(false)
    }
    fn read_input(&mut self) -> io::Result<u8> {
        loop {
            if let Some(byte) = self.pending.take() {
                return Ok(byte);
            }
            if self.is_interrupted {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if let Some(byte) = self.next_key_byte()? {
                return Ok(byte);
            }
        }
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}
