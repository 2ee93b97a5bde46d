//! Non-blocking single-byte reads from a terminal or pipe

use std::io;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

/// Outcome of a single [`KeySource::poll`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
	/// Nothing arrived within the timeout
	NoData,
	/// The input stream is closed and will never produce data again
	EndOfInput,
	/// One byte read from the input stream
	Char(u8),
}

/// Source of key bytes for the event loop
pub trait KeySource {
	/// Wait at most `timeout` for input and return at most one byte.
	fn poll(&mut self, timeout: Duration) -> io::Result<PollResult>;
}

/// Polls a file descriptor with `poll(2)` and reads one byte at a time.
///
/// The fd is borrowed, not owned: dropping the reader does not close it.
#[derive(Debug)]
pub struct NonBlockingReader {
	fd: RawFd,
}

enum Readiness {
	Idle,
	Ready,
}

impl NonBlockingReader {
	pub fn new(fd: RawFd) -> Self {
		NonBlockingReader { fd }
	}

	pub fn stdin() -> Self {
		NonBlockingReader::new(libc::STDIN_FILENO)
	}

	pub fn fd(&self) -> RawFd {
		self.fd
	}

	/// Poll with a zero timeout.
	pub fn poll_now(&mut self) -> io::Result<PollResult> {
		self.poll(Duration::ZERO)
	}

	/// Wait for readiness; `None` waits without a limit.
	fn wait(&self, timeout: Option<Duration>) -> io::Result<Readiness> {
		let mut pfd = libc::pollfd { fd: self.fd, events: libc::POLLIN, revents: 0 };
		let millis = match timeout {
			Some(timeout) => poll_millis(timeout),
			None => -1,
		};

		let n = unsafe { libc::poll(&mut pfd, 1, millis) };
		if n < 0 {
			return Err(io::Error::last_os_error());
		}
		if n == 0 {
			return Ok(Readiness::Idle);
		}
		if pfd.revents & libc::POLLNVAL != 0 {
			return Err(io::Error::from_raw_os_error(libc::EBADF));
		}
		// POLLHUP without POLLIN still means read() returns 0, and POLLERR makes
		// read() report the error
		if pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
			Ok(Readiness::Ready)
		} else {
			Ok(Readiness::Idle)
		}
	}

	fn read_byte(&self) -> io::Result<PollResult> {
		let mut byte = 0u8;
		loop {
			let n = unsafe { libc::read(self.fd, &mut byte as *mut u8 as *mut libc::c_void, 1) };
			match n {
				1 => return Ok(PollResult::Char(byte)),
				0 => return Ok(PollResult::EndOfInput),
				_ => {
					let err = io::Error::last_os_error();
					match err.kind() {
						io::ErrorKind::Interrupted => continue,
						// Readiness was stale on an O_NONBLOCK fd
						io::ErrorKind::WouldBlock => return Ok(PollResult::NoData),
						_ => return Err(err),
					}
				}
			}
		}
	}
}

/// `poll(2)` timeout for `timeout`, rounded up to whole milliseconds.
///
/// Rounding down would turn sub-millisecond waits into a busy poll.
fn poll_millis(timeout: Duration) -> libc::c_int {
	let millis = (timeout.as_nanos() + 999_999) / 1_000_000;
	millis.min(libc::c_int::MAX as u128) as libc::c_int
}

impl KeySource for NonBlockingReader {
	fn poll(&mut self, timeout: Duration) -> io::Result<PollResult> {
		// A timeout too large for an Instant means no deadline at all
		let deadline = Instant::now().checked_add(timeout);
		loop {
			// EINTR retries only wait for what is left of the original timeout
			let remaining = deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()));
			match self.wait(remaining) {
				Ok(Readiness::Idle) => return Ok(PollResult::NoData),
				Ok(Readiness::Ready) => return self.read_byte(),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			}
		}
	}
}


// vim: ts=4
