//! # keypress - raw terminal keypress capture
//!
//! Puts a terminal into cbreak mode, polls it for single keystrokes without
//! blocking, and restores the original terminal settings on every exit path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keypress::{echo, LoopExit};
//!
//! fn main() -> Result<(), keypress::KeypressError> {
//!     // Prints every key on its own line until ESC is pressed
//!     let exit = echo()?;
//!     assert_ne!(exit, LoopExit::Interrupted);
//!     Ok(())
//! }
//! ```
//!
//! ## Driving the pieces directly
//!
//! ```rust,ignore
//! use keypress::{KeySource, NonBlockingReader, PollResult, TerminalModeGuard};
//! use std::time::Duration;
//!
//! let guard = TerminalModeGuard::acquire(0)?;
//! let mut reader = NonBlockingReader::stdin();
//! if let PollResult::Char(b) = reader.poll(Duration::from_millis(10))? {
//!     println!("got {:#04x}", b);
//! }
//! guard.release()?;
//! ```

pub mod config;
pub mod error;
pub mod event_loop;
pub mod logging;
pub mod reader;
pub mod signals;
pub mod terminal;

// Re-export commonly used types and functions
pub use config::{Config, ExitKey};
pub use error::{KeypressError, Result};
pub use event_loop::{echo, echo_on, echo_with, KeyEventLoop, LoopExit, LoopState};
pub use reader::{KeySource, NonBlockingReader, PollResult};
pub use terminal::{with_cbreak, TerminalModeGuard, TerminalSnapshot};

// vim: ts=4
