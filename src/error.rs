//! Error types for keypress operations

use std::error::Error;
use std::fmt;
use std::io;
use std::os::unix::io::RawFd;

/// Main error type for terminal capture operations
#[derive(Debug)]
pub enum KeypressError {
	/// The input fd is not an interactive terminal
	NotATerminal { fd: RawFd },

	/// Reading or applying the terminal configuration failed on acquire
	TerminalSetup { fd: RawFd, source: io::Error },

	/// Restoring the captured terminal configuration failed
	TerminalRestore { fd: RawFd, source: io::Error },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// I/O error while polling, reading or emitting keys
	Io(io::Error),
}

impl fmt::Display for KeypressError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			KeypressError::NotATerminal { fd } => {
				write!(f, "File descriptor {} is not a terminal", fd)
			}
			KeypressError::TerminalSetup { fd, source } => {
				write!(f, "Failed to enter cbreak mode on fd {}: {}", fd, source)
			}
			KeypressError::TerminalRestore { fd, source } => {
				write!(f, "Failed to restore terminal settings on fd {}: {}", fd, source)
			}
			KeypressError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			KeypressError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for KeypressError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			KeypressError::TerminalSetup { source, .. } => Some(source),
			KeypressError::TerminalRestore { source, .. } => Some(source),
			KeypressError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for KeypressError {
	fn from(e: io::Error) -> Self {
		KeypressError::Io(e)
	}
}

impl KeypressError {
	/// True if the terminal may have been left in cbreak mode
	pub fn is_terminal_broken(&self) -> bool {
		matches!(self, KeypressError::TerminalRestore { .. })
	}
}

pub type Result<T> = std::result::Result<T, KeypressError>;


// vim: ts=4
