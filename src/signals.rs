//! Signal handlers for graceful termination of the key loop
//!
//! Cbreak mode keeps ISIG, so Ctrl-C and Ctrl-\ still raise signals. Their
//! default action kills the process without restoring the terminal. While a
//! [`SignalGuard`] is alive those signals only raise a flag, which the key
//! loop checks between polls before returning through the normal release
//! path. Handlers are installed without `SA_RESTART`, so a blocked `poll(2)`
//! wakes up with `EINTR`.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::logging::*;

/// Signals that end the key loop
pub const HANDLED_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT];

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static LAST_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn on_signal(sig: libc::c_int) {
	// Only async-signal-safe work here
	LAST_SIGNAL.store(sig, Ordering::SeqCst);
	INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Flag raised by the installed handlers
pub fn interrupt_flag() -> &'static AtomicBool {
	&INTERRUPTED
}

/// Number of the last signal caught, if any
pub fn last_signal() -> Option<libc::c_int> {
	match LAST_SIGNAL.load(Ordering::SeqCst) {
		0 => None,
		sig => Some(sig),
	}
}

/// Shell convention for a process ended by `sig` (130 for SIGINT, 143 for SIGTERM)
pub fn exit_code(sig: libc::c_int) -> i32 {
	128 + sig
}

/// Dispositions saved by the first live guard, restored by the last one
struct Registry {
	guards: usize,
	previous: Vec<(libc::c_int, libc::sigaction)>,
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry { guards: 0, previous: Vec::new() });

fn registry() -> MutexGuard<'static, Registry> {
	REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn restore_previous(previous: &mut Vec<(libc::c_int, libc::sigaction)>) {
	for (sig, action) in previous.drain(..).rev() {
		if unsafe { libc::sigaction(sig, &action, std::ptr::null_mut()) } != 0 {
			warn!("Failed to reinstate handler for signal {}: {}", sig, io::Error::last_os_error());
		}
	}
}

/// Scoped replacement of the handlers for [`HANDLED_SIGNALS`].
///
/// Guards may overlap and drop in any order. Handlers are installed by the
/// first live guard and the saved dispositions are reinstated when the last
/// one drops.
pub struct SignalGuard {
	_private: (),
}

impl SignalGuard {
	/// Install the flag-raising handlers unless another guard already did.
	///
	/// The interrupt flag is cleared only by the first guard, so an interrupt
	/// seen by a loop that is already running is not lost.
	pub fn install() -> io::Result<Self> {
		let mut registry = registry();
		if registry.guards == 0 {
			INTERRUPTED.store(false, Ordering::SeqCst);
			LAST_SIGNAL.store(0, Ordering::SeqCst);

			for &sig in HANDLED_SIGNALS.iter() {
				match install_handler(sig) {
					Ok(previous) => registry.previous.push((sig, previous)),
					Err(e) => {
						restore_previous(&mut registry.previous);
						return Err(e);
					}
				}
			}
			debug!("Installed handlers for {} signals", registry.previous.len());
		}
		registry.guards += 1;
		Ok(SignalGuard { _private: () })
	}

	pub fn flag(&self) -> &'static AtomicBool {
		interrupt_flag()
	}

	pub fn interrupted(&self) -> bool {
		INTERRUPTED.load(Ordering::SeqCst)
	}
}

impl Drop for SignalGuard {
	fn drop(&mut self) {
		let mut registry = registry();
		registry.guards -= 1;
		if registry.guards == 0 {
			restore_previous(&mut registry.previous);
			debug!("Reinstated previous signal handlers");
		}
	}
}

fn install_handler(sig: libc::c_int) -> io::Result<libc::sigaction> {
	unsafe {
		let mut action: libc::sigaction = std::mem::zeroed();
		action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
		action.sa_flags = 0;
		libc::sigemptyset(&mut action.sa_mask);

		let mut previous: libc::sigaction = std::mem::zeroed();
		if libc::sigaction(sig, &action, &mut previous) != 0 {
			return Err(io::Error::last_os_error());
		}
		Ok(previous)
	}
}


// vim: ts=4
