//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! // terminal.rs, after switching the fd
//! debug!("fd {} switched to cbreak mode", fd);
//! // terminal.rs, when Drop cannot return the restore error
//! error!("Failed to restore terminal settings on fd {}: {}", fd, e);
//! // config.rs, on an exit key the terminal turns into a signal
//! warn!("Exit key {} is normally turned into a signal by the terminal", exit_key);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// By default only warnings and errors are displayed, so stdout stays reserved
/// for echoed keys. Control the log level with `RUST_LOG`:
///
/// ```bash
/// RUST_LOG=debug keypress
/// RUST_LOG=keypress::reader=trace keypress
/// ```
///
/// Output goes to stderr. Calling this more than once is harmless.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
		)
		.with_writer(std::io::stderr)
		.try_init();
}

// vim: ts=4
