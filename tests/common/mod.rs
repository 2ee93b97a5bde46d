//! Shared fixtures: pseudo-terminal pairs and pipes

#![allow(dead_code)]

use std::os::unix::io::RawFd;
use std::thread;
use std::time::{Duration, Instant};
use termios::{Termios, ICANON};

/// Pseudo-terminal pair; the slave side behaves like an interactive terminal
pub struct Pty {
	pub master: RawFd,
	pub slave: RawFd,
}

impl Pty {
	pub fn open() -> Self {
		let mut master = -1;
		let mut slave = -1;
		let rc = unsafe {
			libc::openpty(
				&mut master,
				&mut slave,
				std::ptr::null_mut(),
				std::ptr::null_mut(),
				std::ptr::null_mut(),
			)
		};
		assert_eq!(rc, 0, "openpty failed: {}", std::io::Error::last_os_error());
		Pty { master, slave }
	}

	/// Type `data` on the terminal
	pub fn type_keys(&self, data: &[u8]) {
		write_all(self.master, data);
	}

	pub fn settings(&self) -> Termios {
		Termios::from_fd(self.slave).expect("tcgetattr on pty slave")
	}

	pub fn in_cbreak(&self) -> bool {
		self.settings().c_lflag & ICANON == 0
	}

	/// Wait until another thread has switched the slave to cbreak mode
	pub fn wait_for_cbreak(&self) {
		let start = Instant::now();
		while !self.in_cbreak() {
			assert!(start.elapsed() < Duration::from_secs(5), "terminal never entered cbreak mode");
			thread::sleep(Duration::from_millis(5));
		}
	}
}

impl Drop for Pty {
	fn drop(&mut self) {
		unsafe {
			libc::close(self.slave);
			libc::close(self.master);
		}
	}
}

pub fn pipe() -> (RawFd, RawFd) {
	let mut fds = [0; 2];
	assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
	(fds[0], fds[1])
}

pub fn write_all(fd: RawFd, data: &[u8]) {
	let n = unsafe { libc::write(fd, data.as_ptr() as *const libc::c_void, data.len()) };
	assert_eq!(n, data.len() as isize);
}

pub fn close(fd: RawFd) {
	unsafe { libc::close(fd) };
}

// vim: ts=4
