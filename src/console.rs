// src/console.rs

//! Waiting for a key on the controlling terminal.

use libc::STDIN_FILENO;
use log::{debug, warn};
use std::io::{self, Read};
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSANOW, VMIN, VTIME};

/// Puts stdin into non-canonical, no-echo mode until dropped.
struct RawMode {
    original: Termios,
}

impl RawMode {
    fn enter() -> io::Result<Self> {
        let original = Termios::from_fd(STDIN_FILENO)?;
        let mut raw = original;
        raw.c_lflag &= !(ECHO | ICANON);
        raw.c_cc[VMIN] = 1;
        raw.c_cc[VTIME] = 0;
        tcsetattr(STDIN_FILENO, TCSANOW, &raw)?;
        debug!("Terminal set to raw mode.");
        Ok(RawMode { original })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        match tcsetattr(STDIN_FILENO, TCSANOW, &self.original) {
            Ok(()) => debug!("Restored terminal attributes."),
            Err(e) => warn!("Failed to restore terminal attributes: {}", e),
        }
    }
}

/// Blocks until one byte arrives on stdin and returns it, or `None` on EOF.
///
/// On a terminal the key is taken without waiting for Enter and without
/// echo. Anything else (a pipe, `/dev/null`) is read as is.
pub fn wait_for_keypress() -> io::Result<Option<u8>> {
    // SAFETY: isatty only inspects the descriptor.
    let is_tty = unsafe { libc::isatty(STDIN_FILENO) } == 1;
    let _raw = if is_tty {
        match RawMode::enter() {
            Ok(guard) => Some(guard),
            Err(e) => {
                warn!("Failed to set raw terminal mode: {}. Reading line-buffered.", e);
                None
            }
        }
    } else {
        None
    };

    read_key(io::stdin().lock())
}

/// Reads a single byte, retrying on `EINTR`. `None` means EOF.
fn read_key(mut reader: impl Read) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
