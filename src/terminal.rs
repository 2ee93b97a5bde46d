//! Terminal mode management for cbreak input handling
//!
//! [`TerminalModeGuard`] owns the terminal configuration of one fd for as long
//! as it lives. Acquiring it captures the current settings and switches the
//! terminal to cbreak mode: keys are delivered as typed, without echo, while
//! signal keys (Ctrl-C, Ctrl-\, Ctrl-Z) stay active. The captured settings are
//! put back exactly once, either by [`TerminalModeGuard::release`] or, on
//! unwinding and early returns, by `Drop`.

use std::io;
use std::os::unix::io::RawFd;
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSADRAIN, TCSAFLUSH, VMIN, VTIME};

use crate::error::{KeypressError, Result};
use crate::logging::*;

/// Terminal configuration captured before entering cbreak mode.
///
/// Owned by the guard that created it and consumed by the single restore.
#[derive(Debug)]
pub struct TerminalSnapshot {
	original: Termios,
}

impl TerminalSnapshot {
	fn capture(fd: RawFd) -> io::Result<Self> {
		Ok(TerminalSnapshot { original: Termios::from_fd(fd)? })
	}

	fn restore(self, fd: RawFd) -> io::Result<()> {
		// Let pending output drain before switching back to canonical mode
		tcsetattr(fd, TCSADRAIN, &self.original)
	}
}

/// Derive cbreak settings from `original`.
///
/// Clears ICANON and ECHO, reads return after a single byte. ISIG is kept.
pub fn cbreak_settings(original: &Termios) -> Termios {
	let mut cbreak = *original;
	cbreak.c_lflag &= !(ICANON | ECHO);
	cbreak.c_cc[VMIN] = 1;
	cbreak.c_cc[VTIME] = 0;
	cbreak
}

/// RAII guard for cbreak terminal input mode
#[derive(Debug)]
pub struct TerminalModeGuard {
	fd: RawFd,
	snapshot: Option<TerminalSnapshot>,
}

impl TerminalModeGuard {
	/// Capture the settings of `fd` and switch it to cbreak mode.
	///
	/// Fails with [`KeypressError::NotATerminal`] without touching anything if
	/// `fd` is not a terminal. Callers must not acquire a second guard on the
	/// same terminal while one is alive.
	pub fn acquire(fd: RawFd) -> Result<Self> {
		if unsafe { libc::isatty(fd) } != 1 {
			return Err(KeypressError::NotATerminal { fd });
		}

		let snapshot = TerminalSnapshot::capture(fd)
			.map_err(|source| KeypressError::TerminalSetup { fd, source })?;
		let cbreak = cbreak_settings(&snapshot.original);
		tcsetattr(fd, TCSAFLUSH, &cbreak).map_err(|source| KeypressError::TerminalSetup { fd, source })?;

		debug!("fd {} switched to cbreak mode", fd);
		Ok(TerminalModeGuard { fd, snapshot: Some(snapshot) })
	}

	pub fn fd(&self) -> RawFd {
		self.fd
	}

	/// Restore the captured settings.
	///
	/// The restore is attempted once; a failure is returned and not retried.
	pub fn release(mut self) -> Result<()> {
		let fd = self.fd;
		match self.snapshot.take() {
			Some(snapshot) => {
				snapshot.restore(fd).map_err(|source| KeypressError::TerminalRestore { fd, source })?;
				debug!("fd {} restored", fd);
				Ok(())
			}
			None => Ok(()),
		}
	}
}

impl Drop for TerminalModeGuard {
	fn drop(&mut self) {
		// Only reached with a snapshot when release() was skipped (panic, early return)
		if let Some(snapshot) = self.snapshot.take() {
			match snapshot.restore(self.fd) {
				Ok(()) => debug!("fd {} restored on drop", self.fd),
				Err(e) => error!("Failed to restore terminal settings on fd {}: {}", self.fd, e),
			}
		}
	}
}

/// Run `f` with `fd` in cbreak mode and restore the terminal afterwards.
///
/// A restore failure wins over an error from `f`, since it leaves the user's
/// terminal unusable; the error from `f` is logged in that case.
pub fn with_cbreak<T, F>(fd: RawFd, f: F) -> Result<T>
where
	F: FnOnce() -> Result<T>,
{
	let guard = TerminalModeGuard::acquire(fd)?;
	let outcome = f();
	match (outcome, guard.release()) {
		(Ok(value), Ok(())) => Ok(value),
		(Err(e), Ok(())) => Err(e),
		(Ok(_), Err(restore)) => Err(restore),
		(Err(e), Err(restore)) => {
			error!("Key capture failed before restore error: {}", e);
			Err(restore)
		}
	}
}


// vim: ts=4
