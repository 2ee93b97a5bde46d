//! Cooperative key capture loop
//!
//! [`KeyEventLoop`] polls a [`KeySource`] until the exit key arrives, the input
//! ends, or an interrupt flag is raised. Every other byte is written to the
//! consumer on its own line, in arrival order.

use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::{Config, ExitKey};
use crate::error::Result;
use crate::logging::*;
use crate::reader::{KeySource, NonBlockingReader, PollResult};
use crate::signals::SignalGuard;
use crate::terminal::with_cbreak;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
	ExitKey,
	EndOfInput,
	Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
	Running,
	Terminated(LoopExit),
}

#[derive(Debug)]
pub struct KeyEventLoop {
	exit_key: ExitKey,
	poll_timeout: Duration,
	interrupt: Option<&'static AtomicBool>,
	state: LoopState,
	keys_emitted: u64,
}

impl KeyEventLoop {
	pub fn new(exit_key: ExitKey) -> Self {
		KeyEventLoop {
			exit_key,
			poll_timeout: Duration::ZERO,
			interrupt: None,
			state: LoopState::Running,
			keys_emitted: 0,
		}
	}

	pub fn from_config(config: &Config) -> Self {
		KeyEventLoop::new(config.exit_key).with_poll_timeout(config.poll_timeout())
	}

	/// Wait up to `timeout` per poll instead of spinning.
	pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
		self.poll_timeout = timeout;
		self
	}

	/// Stop with [`LoopExit::Interrupted`] once `flag` is set.
	pub fn with_interrupt(mut self, flag: &'static AtomicBool) -> Self {
		self.interrupt = Some(flag);
		self
	}

	pub fn state(&self) -> LoopState {
		self.state
	}

	pub fn keys_emitted(&self) -> u64 {
		self.keys_emitted
	}

	/// Apply one poll result to the state machine.
	///
	/// Bytes other than the exit key are written to `out` followed by a
	/// newline and flushed. A terminated loop ignores further results.
	pub fn step<W: Write + ?Sized>(&mut self, result: PollResult, out: &mut W) -> io::Result<LoopState> {
		if let LoopState::Terminated(_) = self.state {
			return Ok(self.state);
		}

		match result {
			PollResult::NoData => {}
			PollResult::EndOfInput => self.state = LoopState::Terminated(LoopExit::EndOfInput),
			PollResult::Char(byte) if byte == self.exit_key.byte() => {
				self.state = LoopState::Terminated(LoopExit::ExitKey)
			}
			PollResult::Char(byte) => {
				out.write_all(&[byte, b'\n'])?;
				out.flush()?;
				self.keys_emitted += 1;
			}
		}
		Ok(self.state)
	}

	fn interrupted(&self) -> bool {
		self.interrupt.map_or(false, |flag| flag.load(Ordering::SeqCst))
	}

	/// Poll `source` until the loop terminates.
	pub fn run<S, W>(&mut self, source: &mut S, out: &mut W) -> Result<LoopExit>
	where
		S: KeySource + ?Sized,
		W: Write + ?Sized,
	{
		loop {
			if let LoopState::Terminated(exit) = self.state {
				debug!("Key loop terminated ({:?}) after {} keys", exit, self.keys_emitted);
				return Ok(exit);
			}
			if self.interrupted() {
				self.state = LoopState::Terminated(LoopExit::Interrupted);
				continue;
			}
			let result = source.poll(self.poll_timeout)?;
			self.step(result, out)?;
		}
	}
}

/// Capture keys from `fd` in cbreak mode and echo them to `out`.
///
/// The terminal is restored before returning, whatever the outcome. SIGINT,
/// SIGTERM and SIGQUIT end the loop with [`LoopExit::Interrupted`] instead
/// of killing the process.
pub fn echo_on<W: Write + ?Sized>(fd: RawFd, out: &mut W, config: &Config) -> Result<LoopExit> {
	config.validate()?;

	// Installed before acquire and dropped after release, so a signal can never
	// land while the terminal is in cbreak mode without a handler
	let signals = SignalGuard::install()?;
	let mut event_loop = KeyEventLoop::from_config(config).with_interrupt(signals.flag());
	let mut reader = NonBlockingReader::new(fd);

	with_cbreak(fd, || event_loop.run(&mut reader, out))
}

/// [`echo_on`] stdin and stdout with `config`.
pub fn echo_with(config: &Config) -> Result<LoopExit> {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	echo_on(libc::STDIN_FILENO, &mut out, config)
}

/// Echo keys typed on the terminal, one per line, until ESC is pressed.
pub fn echo() -> Result<LoopExit> {
	echo_with(&Config::default())
}


// vim: ts=4
